// [tests/mirror/apps/notification/services/alert_ledger.test.rs]
/**
 * =================================================================
 * APARATO: ALERT LEDGER PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * OBJETIVO: Certificar las transiciones legales del ciclo de vida y
 *           el historial filtrado del espejo caliente.
 * =================================================================
 */

use chrono::{Duration, Utc};
use faceguard_domain_models::{AlertInstance, AlertPriority, AlertStatus};
use faceguard_notification::services::{AlertHistoryFilter, AlertLedger};

fn bench_alert(alert_id: &str, person_id: &str, camera_id: &str) -> AlertInstance {
    AlertInstance {
        id: alert_id.to_string(),
        rule_id: "rule-bench".into(),
        rule_name: "Bench Rule".into(),
        person_id: person_id.to_string(),
        camera_id: camera_id.to_string(),
        sighting_id: "sighting-1".into(),
        priority: AlertPriority::Low,
        status: AlertStatus::Active,
        message: "bench alert".into(),
        trigger_data: serde_json::json!({"confidence_score": 0.9}),
        triggered_at: Utc::now(),
        acknowledged_at: None,
        acknowledged_by: None,
        resolved_at: None,
        resolved_by: None,
        escalated_at: None,
        escalated_from: None,
        notification_count: 0,
    }
}

#[test]
fn certify_acknowledge_then_resolve_path() {
    println!("\n📡 [PROVING_GROUNDS]: Alert lifecycle audit...");
    let ledger = AlertLedger::new();
    ledger.insert(bench_alert("a-1", "person-42", "camera_0"));

    let acknowledged = ledger.acknowledge("a-1", "operator-7", Utc::now()).unwrap();
    assert_eq!(acknowledged.status, AlertStatus::Acknowledged);
    assert_eq!(acknowledged.acknowledged_by.as_deref(), Some("operator-7"));
    assert!(acknowledged.acknowledged_at.is_some());

    // Doble acuse: transición ilegal.
    assert!(ledger.acknowledge("a-1", "operator-8", Utc::now()).is_err());

    let resolved = ledger.resolve("a-1", "operator-7", Utc::now()).unwrap();
    assert_eq!(resolved.status, AlertStatus::Resolved);
    assert_eq!(resolved.resolved_by.as_deref(), Some("operator-7"));

    // Resuelta: ni acuse ni nueva resolución.
    assert!(ledger.resolve("a-1", "operator-9", Utc::now()).is_err());
    assert!(ledger.acknowledge("a-1", "operator-9", Utc::now()).is_err());
    println!("   ✅ [SUCCESS]: active -> acknowledged -> resolved enforced.");
}

#[test]
fn certify_escalation_preserves_original_priority() {
    let ledger = AlertLedger::new();
    ledger.insert(bench_alert("a-esc", "person-42", "camera_0"));

    let escalation_time = Utc::now() + Duration::minutes(15);
    let escalated = ledger.escalate("a-esc", AlertPriority::High, escalation_time).unwrap();

    assert_eq!(escalated.status, AlertStatus::Escalated);
    assert_eq!(escalated.priority, AlertPriority::High);
    assert_eq!(escalated.escalated_from, Some(AlertPriority::Low));
    assert_eq!(escalated.escalated_at, Some(escalation_time));

    // Una instancia escalada no vuelve a escalar.
    assert!(ledger.escalate("a-esc", AlertPriority::Critical, Utc::now()).is_err());
}

#[test]
fn certify_unknown_alert_is_rejected() {
    let ledger = AlertLedger::new();
    assert!(ledger.acknowledge("ghost", "op", Utc::now()).is_err());
    assert!(ledger.resolve("ghost", "op", Utc::now()).is_err());
}

#[test]
fn certify_history_filters_and_recency_order() {
    let ledger = AlertLedger::new();
    ledger.insert(bench_alert("h-1", "person-A", "camera_0"));
    ledger.insert(bench_alert("h-2", "person-B", "camera_1"));
    ledger.insert(bench_alert("h-3", "person-A", "camera_1"));
    ledger.resolve("h-2", "system", Utc::now()).unwrap();

    // Más recientes primero.
    let full_history = ledger.history(&AlertHistoryFilter::default());
    assert_eq!(full_history.len(), 3);
    assert_eq!(full_history[0].id, "h-3");

    let person_filtered = ledger.history(&AlertHistoryFilter {
        person_id: Some("person-A".into()),
        ..Default::default()
    });
    assert_eq!(person_filtered.len(), 2);

    let resolved_filtered = ledger.history(&AlertHistoryFilter {
        status: Some(AlertStatus::Resolved),
        ..Default::default()
    });
    assert_eq!(resolved_filtered.len(), 1);
    assert_eq!(resolved_filtered[0].id, "h-2");

    let limited = ledger.history(&AlertHistoryFilter { limit: 1, ..Default::default() });
    assert_eq!(limited.len(), 1);
}

#[test]
fn certify_notification_counter_accumulates() {
    let ledger = AlertLedger::new();
    ledger.insert(bench_alert("n-1", "person-A", "camera_0"));

    ledger.register_notification("n-1", 2);
    ledger.register_notification("n-1", 1);
    assert_eq!(ledger.get("n-1").unwrap().notification_count, 3);

    let active_alerts = ledger.active_alerts();
    assert_eq!(active_alerts.len(), 1);
}
