// [tests/mirror/apps/notification/services/webhook_signature.test.rs]
/**
 * =================================================================
 * APARATO: WEBHOOK SIGNATURE PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Certificar la firma sha256= sobre JSON canónico y la
 *           verificación en tiempo constante.
 * =================================================================
 */

use faceguard_notification::services::channels::webhook::{
    canonical_json, sign_payload, verify_signature,
};

#[test]
fn certify_canonical_json_sorts_keys() {
    println!("\n📡 [PROVING_GROUNDS]: Canonical JSON audit...");
    let scrambled = serde_json::json!({"b": 2, "a": 1});
    assert_eq!(canonical_json(&scrambled), r#"{"a":1,"b":2}"#);
    println!("   ✅ [SUCCESS]: Keys travel sorted regardless of insertion order.");
}

#[test]
fn certify_signature_format_and_determinism() {
    let payload = serde_json::json!({"a": 1, "b": 2});
    let signature = sign_payload("s3cret", &payload);

    assert!(signature.starts_with("sha256="));
    let hex_digest = &signature["sha256=".len()..];
    assert_eq!(hex_digest.len(), 64);
    assert!(hex_digest.chars().all(|c| c.is_ascii_hexdigit()));

    // Determinismo bit-perfecto sobre el mismo sobre.
    assert_eq!(signature, sign_payload("s3cret", &payload));
}

#[test]
fn certify_semantically_equal_payloads_share_signature() {
    // El orden de inserción es irrelevante: la firma opera sobre el
    // sobre canónico de llaves ordenadas.
    let natural_order = serde_json::json!({"a": 1, "b": 2});
    let scrambled_order = serde_json::json!({"b": 2, "a": 1});

    assert_eq!(sign_payload("s3cret", &natural_order), sign_payload("s3cret", &scrambled_order));
}

#[test]
fn certify_verification_round_trip_and_rejections() {
    let payload = serde_json::json!({
        "person_id": "person-42",
        "camera_id": "camera_0",
        "confidence_score": 0.91,
    });

    let valid_signature = sign_payload("s3cret", &payload);
    assert!(verify_signature("s3cret", &payload, &valid_signature));

    // Secreto distinto, payload mutado o firma truncada: rechazados.
    assert!(!verify_signature("wrong-secret", &payload, &valid_signature));

    let tampered_payload = serde_json::json!({
        "person_id": "person-43",
        "camera_id": "camera_0",
        "confidence_score": 0.91,
    });
    assert!(!verify_signature("s3cret", &tampered_payload, &valid_signature));

    assert!(!verify_signature("s3cret", &payload, "sha256=deadbeef"));
    assert!(!verify_signature("s3cret", &payload, ""));
}

#[test]
fn certify_distinct_secrets_produce_distinct_signatures() {
    let payload = serde_json::json!({"event": "alert_triggered"});
    assert_ne!(sign_payload("secret-a", &payload), sign_payload("secret-b", &payload));
}
