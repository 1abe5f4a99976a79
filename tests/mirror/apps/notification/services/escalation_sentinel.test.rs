// [tests/mirror/apps/notification/services/escalation_sentinel.test.rs]
/**
 * =================================================================
 * APARATO: ESCALATION SENTINEL PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Certificar el escalamiento de alertas desatendidas, el
 *           respeto al acuse y la auto-resolución por vencimiento.
 * =================================================================
 */

use std::sync::Arc;

use chrono::{Duration, Utc};
use faceguard_domain_models::{
    AlertInstance, AlertPriority, AlertRule, AlertStatus, TriggerConditions,
};
use faceguard_infra_data_client::CoreDataClient;
use faceguard_notification::config::Settings;
use faceguard_notification::services::{
    AlertLedger, ChannelRegistry, DeliveryEngine, EscalationSentinel, Room, RuleRegistry,
    WebSocketRoomManager,
};

fn bench_settings() -> Settings {
    Settings {
        service_host: "127.0.0.1".into(),
        service_port: 8004,
        log_level: "INFO".into(),
        core_data_service_url: "http://127.0.0.1:9".into(),
        default_smtp_host: "smtp.example.com".into(),
        default_smtp_port: 587,
        default_smtp_use_tls: true,
        default_from_email: "faceguard.alerts@example.com".into(),
        smtp_username: None,
        smtp_password: None,
        twilio_account_sid: None,
        twilio_auth_token: None,
        twilio_from_number: "+15005550001".into(),
        default_retry_attempts: 3,
        default_timeout_seconds: 30,
        escalation_check_interval_seconds: 30,
        evaluation_queue_capacity: 1000,
        webhook_ingest_secret: None,
    }
}

struct SentinelBench {
    ledger: Arc<AlertLedger>,
    rule_registry: Arc<RuleRegistry>,
    room_manager: Arc<WebSocketRoomManager>,
    sentinel: Arc<EscalationSentinel>,
}

fn bench_sentinel() -> SentinelBench {
    let ledger = Arc::new(AlertLedger::new());
    let rule_registry = Arc::new(RuleRegistry::new());
    let channel_registry = Arc::new(ChannelRegistry::new());
    let room_manager = Arc::new(WebSocketRoomManager::new());

    let delivery_engine = DeliveryEngine::new(
        Arc::new(bench_settings()),
        room_manager.clone(),
        Arc::new(CoreDataClient::new("http://127.0.0.1:9").unwrap()),
    );

    let sentinel = EscalationSentinel::new(
        ledger.clone(),
        rule_registry.clone(),
        channel_registry,
        delivery_engine,
        room_manager.clone(),
    );

    SentinelBench { ledger, rule_registry, room_manager, sentinel }
}

fn bench_rule(rule_id: &str, escalation_minutes: Option<u32>, auto_resolve_minutes: Option<u32>) -> AlertRule {
    AlertRule {
        id: rule_id.to_string(),
        rule_name: format!("Rule {rule_id}"),
        description: None,
        priority: AlertPriority::Medium,
        trigger_conditions: TriggerConditions { any_person: true, ..Default::default() },
        cooldown_minutes: 30,
        escalation_minutes,
        auto_resolve_minutes,
        notification_channel_ids: Vec::new(),
        notification_template: None,
        is_active: true,
    }
}

fn bench_alert(alert_id: &str, rule_id: &str, age_minutes: i64) -> AlertInstance {
    AlertInstance {
        id: alert_id.to_string(),
        rule_id: rule_id.to_string(),
        rule_name: format!("Rule {rule_id}"),
        person_id: "person-42".into(),
        camera_id: "camera_0".into(),
        sighting_id: "sighting-1".into(),
        priority: AlertPriority::Medium,
        status: AlertStatus::Active,
        message: "unattended alert".into(),
        trigger_data: serde_json::json!({"confidence_score": 0.9}),
        triggered_at: Utc::now() - Duration::minutes(age_minutes),
        acknowledged_at: None,
        acknowledged_by: None,
        resolved_at: None,
        resolved_by: None,
        escalated_at: None,
        escalated_from: None,
        notification_count: 0,
    }
}

#[tokio::test]
async fn certify_unattended_alert_escalates_after_window() {
    println!("\n📡 [PROVING_GROUNDS]: Escalation sweep audit...");
    let bench = bench_sentinel();

    bench.rule_registry.upsert(bench_rule("rule-esc", Some(5), None));
    bench.ledger.insert(bench_alert("a-unattended", "rule-esc", 10));

    let (escalated_count, auto_resolved_count) = bench.sentinel.sweep_at(Utc::now()).await;
    assert_eq!(escalated_count, 1);
    assert_eq!(auto_resolved_count, 0);

    let escalated_instance = bench.ledger.get("a-unattended").unwrap();
    assert_eq!(escalated_instance.status, AlertStatus::Escalated);
    assert_eq!(escalated_instance.escalated_from, Some(AlertPriority::Medium));
    assert_eq!(escalated_instance.priority, AlertPriority::High);
    assert!(escalated_instance.escalated_at.is_some());

    // La señal de escalamiento queda sellada en el replay de la sala.
    assert!(bench.room_manager.replay_depth(Room::Alerts) >= 1);
    println!("   ✅ [SUCCESS]: Unattended alert escalated with original priority trail.");
}

#[tokio::test]
async fn certify_fresh_and_acknowledged_alerts_are_spared() {
    let bench = bench_sentinel();
    bench.rule_registry.upsert(bench_rule("rule-esc", Some(30), None));

    // Fresca: dentro de la ventana.
    bench.ledger.insert(bench_alert("a-fresh", "rule-esc", 5));

    // Acusada antes del vencimiento: jamás escala.
    bench.ledger.insert(bench_alert("a-handled", "rule-esc", 90));
    bench.ledger.acknowledge("a-handled", "operator-7", Utc::now()).unwrap();

    let (escalated_count, _) = bench.sentinel.sweep_at(Utc::now()).await;
    assert_eq!(escalated_count, 0);

    assert_eq!(bench.ledger.get("a-fresh").unwrap().status, AlertStatus::Active);
    assert_eq!(bench.ledger.get("a-handled").unwrap().status, AlertStatus::Acknowledged);
}

#[tokio::test]
async fn certify_auto_resolution_by_system() {
    let bench = bench_sentinel();
    bench.rule_registry.upsert(bench_rule("rule-auto", None, Some(15)));
    bench.ledger.insert(bench_alert("a-stale", "rule-auto", 20));

    let (escalated_count, auto_resolved_count) = bench.sentinel.sweep_at(Utc::now()).await;
    assert_eq!(escalated_count, 0);
    assert_eq!(auto_resolved_count, 1);

    let resolved_instance = bench.ledger.get("a-stale").unwrap();
    assert_eq!(resolved_instance.status, AlertStatus::Resolved);
    assert_eq!(resolved_instance.resolved_by.as_deref(), Some("system"));
}

#[tokio::test]
async fn certify_rules_without_windows_never_fire_the_sentinel() {
    let bench = bench_sentinel();
    bench.rule_registry.upsert(bench_rule("rule-plain", None, None));
    bench.ledger.insert(bench_alert("a-plain", "rule-plain", 600));

    let (escalated_count, auto_resolved_count) = bench.sentinel.sweep_at(Utc::now()).await;
    assert_eq!((escalated_count, auto_resolved_count), (0, 0));
    assert_eq!(bench.ledger.get("a-plain").unwrap().status, AlertStatus::Active);
}
