// [tests/mirror/apps/notification/services/sms_composition.test.rs]
/**
 * =================================================================
 * APARATO: SMS COMPOSITION PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Certificar la normalización E.164 y el techo de 160
 *           caracteres con degradación progresiva.
 * =================================================================
 */

use faceguard_domain_models::AlertPriority;
use faceguard_notification::services::channels::sms::{
    compose_sms_message, normalize_phone_number, SMS_CHARACTER_LIMIT,
};

#[test]
fn certify_e164_numbers_pass_through_untouched() {
    assert_eq!(normalize_phone_number("+19995551234"), "+19995551234");
    assert_eq!(normalize_phone_number("+918770243891"), "+918770243891");
    assert_eq!(normalize_phone_number(" +447911123456 "), "+447911123456");
}

#[test]
fn certify_separator_stripping_and_country_heuristics() {
    println!("\n📡 [PROVING_GROUNDS]: Phone normalization audit...");

    // Prefijo 877 -> +91 (heurística del plano de despliegue actual).
    assert_eq!(normalize_phone_number("8770243891"), "+918770243891");
    assert_eq!(normalize_phone_number("877-024-3891"), "+918770243891");

    // Diez dígitos iniciando en 2-9 -> +1.
    assert_eq!(normalize_phone_number("9995551234"), "+19995551234");
    assert_eq!(normalize_phone_number("(999) 555-1234"), "+19995551234");
    assert_eq!(normalize_phone_number("212 555 0100"), "+12125550100");

    // Patrón desconocido degrada a +1.
    assert_eq!(normalize_phone_number("12345"), "+112345");
    println!("   ✅ [SUCCESS]: Separator stripping and country mapping certified.");
}

#[test]
fn certify_sms_body_carries_priority_and_identity() {
    let message = compose_sms_message(AlertPriority::Critical, "person-42", "camera_0", 0.91);

    assert!(message.contains("person-42"));
    assert!(message.contains("camera_0"));
    assert!(message.contains("91%"));
    assert!(message.contains("CRITICAL"));
    assert!(message.chars().count() <= SMS_CHARACTER_LIMIT);
}

#[test]
fn certify_oversized_identities_degrade_within_the_limit() {
    let oversized_person = "p".repeat(220);
    let oversized_camera = "warehouse-perimeter-north-entrance-secondary".repeat(3);

    let message = compose_sms_message(AlertPriority::High, &oversized_person, &oversized_camera, 0.88);
    assert!(
        message.chars().count() <= SMS_CHARACTER_LIMIT,
        "degraded SMS still exceeds the 160-character ceiling"
    );
    // La degradación final conserva al menos el rastro de identidad.
    assert!(message.contains(&oversized_person[..20]));
}
