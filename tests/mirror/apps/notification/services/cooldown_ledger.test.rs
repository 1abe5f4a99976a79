// [tests/mirror/apps/notification/services/cooldown_ledger.test.rs]
/**
 * =================================================================
 * APARATO: COOLDOWN LEDGER PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * OBJETIVO: Certificar a-lo-sumo-una-alerta por ventana y por
 *           (regla, persona, cámara).
 * =================================================================
 */

use chrono::{Duration, Utc};
use faceguard_notification::services::CooldownLedger;

#[test]
fn certify_second_sighting_inside_window_is_skipped() {
    println!("\n📡 [PROVING_GROUNDS]: Cooldown window audit...");
    let ledger = CooldownLedger::new();
    let t0 = Utc::now();

    // Dos avistamientos emparejados a t0 y t0+60s con ventana de 30min:
    // exactamente una emisión y un salto contado.
    assert!(ledger.acquire_at("rule-R", "person-P", "camera-C", 30, t0));
    assert!(!ledger.acquire_at("rule-R", "person-P", "camera-C", 30, t0 + Duration::seconds(60)));

    assert_eq!(ledger.skipped_count(), 1);
    assert_eq!(ledger.active_count(), 1);
    println!("   ✅ [SUCCESS]: Exactly one alert emitted inside the window.");
}

#[test]
fn certify_window_expiry_reopens_emission() {
    let ledger = CooldownLedger::new();
    let t0 = Utc::now();

    assert!(ledger.acquire_at("rule-R", "person-P", "camera-C", 30, t0));

    // Justo al vencer la ventana la emisión reabre y sella una nueva.
    let after_expiry = t0 + Duration::minutes(30) + Duration::seconds(1);
    assert!(ledger.acquire_at("rule-R", "person-P", "camera-C", 30, after_expiry));
    assert_eq!(ledger.skipped_count(), 0);
}

#[test]
fn certify_key_granularity_by_rule_person_and_camera() {
    let ledger = CooldownLedger::new();
    let t0 = Utc::now();

    assert!(ledger.acquire_at("rule-R", "person-P", "camera-C", 30, t0));

    // Distinta cámara, persona o regla: ventanas independientes.
    assert!(ledger.acquire_at("rule-R", "person-P", "camera-OTHER", 30, t0));
    assert!(ledger.acquire_at("rule-R", "person-OTHER", "camera-C", 30, t0));
    assert!(ledger.acquire_at("rule-OTHER", "person-P", "camera-C", 30, t0));

    assert_eq!(ledger.skipped_count(), 0);
    assert_eq!(ledger.active_count(), 4);
}

#[test]
fn certify_zero_cooldown_never_blocks() {
    let ledger = CooldownLedger::new();
    let t0 = Utc::now();

    for _ in 0..5 {
        assert!(ledger.acquire_at("rule-basic", "person-P", "camera-C", 0, t0));
    }
    assert_eq!(ledger.skipped_count(), 0);
    assert_eq!(ledger.active_count(), 0, "zero-minute windows must not persist");
}

#[test]
fn certify_expired_entries_are_purgeable() {
    let ledger = CooldownLedger::new();
    let t0 = Utc::now();

    ledger.acquire_at("rule-A", "p", "c", 10, t0);
    ledger.acquire_at("rule-B", "p", "c", 60, t0);

    let purged = ledger.purge_expired_at(t0 + Duration::minutes(30));
    assert_eq!(purged, 1);
    assert_eq!(ledger.active_count(), 1);
}
