// [tests/mirror/apps/notification/services/delivery_retry.test.rs]
/**
 * =================================================================
 * APARATO: DELIVERY POLICY PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Certificar la monotonía del backoff, el techo de intentos,
 *           el disparo del cortacircuitos y el salto por límite de tasa.
 * =================================================================
 */

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use faceguard_domain_models::{ChannelConfig, ChannelType, DeliveryStatus, NotificationChannel};
use faceguard_infra_data_client::CoreDataClient;
use faceguard_notification::config::Settings;
use faceguard_notification::services::channel_guard::BreakerState;
use faceguard_notification::services::channels::DeliveryError;
use faceguard_notification::services::delivery_engine::retry_backoff;
use faceguard_notification::services::{DeliveryEngine, WebSocketRoomManager};

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
        twilio_account_sid: Some("ACtest".into()),
        twilio_auth_token: Some("token".into()),
        twilio_from_number: "+15005550001".into(),
        default_retry_attempts: 3,
        default_timeout_seconds: 30,
        escalation_check_interval_seconds: 30,
        evaluation_queue_capacity: 1000,
        webhook_ingest_secret: None,
    }
}

fn bench_engine() -> Arc<DeliveryEngine> {
    DeliveryEngine::new(
        Arc::new(bench_settings()),
        Arc::new(WebSocketRoomManager::new()),
        Arc::new(CoreDataClient::new("http://127.0.0.1:9").unwrap()),
    )
}

fn bench_channel(channel_id: &str, retry_attempts: u32, rate_limit: u32, timeout_seconds: u64) -> NotificationChannel {
    NotificationChannel {
        id: channel_id.to_string(),
        channel_name: format!("bench-{channel_id}"),
        channel_type: ChannelType::Webhook,
        configuration: ChannelConfig::Webhook {
            url: "https://ops.example.com/hook".into(),
            secret: None,
            headers: Default::default(),
        },
        rate_limit_per_minute: rate_limit,
        retry_attempts,
        timeout_seconds,
        is_active: true,
    }
}

#[test]
fn certify_backoff_schedule_is_capped_exponential() {
    assert_eq!(retry_backoff(1), Duration::from_secs(1));
    assert_eq!(retry_backoff(2), Duration::from_secs(2));
    assert_eq!(retry_backoff(3), Duration::from_secs(4));
    assert_eq!(retry_backoff(6), Duration::from_secs(32));
    assert_eq!(retry_backoff(7), Duration::from_secs(60));
    assert_eq!(retry_backoff(40), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn certify_retry_monotonicity_and_attempt_ceiling() {
    println!("\n📡 [PROVING_GROUNDS]: Retry cadence audit...");
    let delivery_engine = bench_engine();
    let channel = bench_channel("retry-ch", 3, 1000, 30);

    let attempt_instants: Arc<Mutex<Vec<tokio::time::Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let instants_for_factory = attempt_instants.clone();

    let delivery_record = delivery_engine
        .deliver_with_policy(&channel, "alert-retry", move |_attempt_number| {
            let instants = instants_for_factory.clone();
            async move {
                instants.lock().unwrap().push(tokio::time::Instant::now());
                Err::<Option<String>, _>(DeliveryError::Transport("provider down".into()))
            }
        })
        .await;

    assert_eq!(delivery_record.status, DeliveryStatus::Failed);
    assert_eq!(delivery_record.retry_count, 3, "attempt count must never exceed retry_attempts");

    let recorded_instants = attempt_instants.lock().unwrap();
    assert_eq!(recorded_instants.len(), 3);
    // Intento N+1 no antes de min(2^(N-1), 60)s tras el intento N.
    assert!(recorded_instants[1] - recorded_instants[0] >= Duration::from_secs(1));
    assert!(recorded_instants[2] - recorded_instants[1] >= Duration::from_secs(2));

    println!("   ✅ [SUCCESS]: Backoff gaps 1s/2s certified over 3 attempts.");
}

#[tokio::test(start_paused = true)]
async fn certify_breaker_trips_across_deliveries_and_blocks_provider() {
    let delivery_engine = bench_engine();
    let channel = bench_channel("breaker-ch", 3, 1000, 30);
    let provider_invocations = Arc::new(AtomicU32::new(0));

    // Dos entregas fallidas de 3 intentos: el 5.º fallo consecutivo
    // abre el circuito a mitad de la segunda.
    for _ in 0..2 {
        let invocations = provider_invocations.clone();
        let _ = delivery_engine
            .deliver_with_policy(&channel, "alert-breaker", move |_n| {
                let invocations = invocations.clone();
                async move {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    Err::<Option<String>, _>(DeliveryError::Transport("still down".into()))
                }
            })
            .await;
    }

    assert_eq!(delivery_engine.breaker_bank.state_of("breaker-ch"), BreakerState::Open);
    let invocations_after_trip = provider_invocations.load(Ordering::SeqCst);
    assert!(invocations_after_trip >= 5, "breaker must trip on the fifth consecutive failure");

    // Con el circuito abierto NO hay llamadas al proveedor.
    let invocations_probe = provider_invocations.clone();
    let blocked_record = delivery_engine
        .deliver_with_policy(&channel, "alert-breaker", move |_n| {
            let invocations = invocations_probe.clone();
            async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                Ok::<Option<String>, DeliveryError>(None)
            }
        })
        .await;

    assert_eq!(blocked_record.status, DeliveryStatus::Failed);
    assert_eq!(blocked_record.error_message.as_deref(), Some("circuit_open"));
    assert_eq!(provider_invocations.load(Ordering::SeqCst), invocations_after_trip);
}

#[tokio::test(start_paused = true)]
async fn certify_success_after_one_retry_resets_breaker() {
    let delivery_engine = bench_engine();
    let channel = bench_channel("recover-ch", 3, 1000, 30);
    let attempt_counter = Arc::new(AtomicU32::new(0));

    let counter_for_factory = attempt_counter.clone();
    let delivery_record = delivery_engine
        .deliver_with_policy(&channel, "alert-recover", move |_n| {
            let counter = counter_for_factory.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(DeliveryError::Transport("first attempt flake".into()))
                } else {
                    Ok(Some("SM-provider-sid".to_string()))
                }
            }
        })
        .await;

    assert_eq!(delivery_record.status, DeliveryStatus::Sent);
    assert_eq!(delivery_record.retry_count, 1);
    assert_eq!(delivery_record.external_id.as_deref(), Some("SM-provider-sid"));
    assert_eq!(delivery_engine.breaker_bank.state_of("recover-ch"), BreakerState::Closed);
}

#[tokio::test(start_paused = true)]
async fn certify_rate_limited_channel_is_skipped_without_provider_calls() {
    let delivery_engine = bench_engine();
    let channel = bench_channel("limited-ch", 1, 2, 30);
    let provider_invocations = Arc::new(AtomicU32::new(0));

    for expected_status in [DeliveryStatus::Sent, DeliveryStatus::Sent, DeliveryStatus::Failed] {
        let invocations = provider_invocations.clone();
        let record = delivery_engine
            .deliver_with_policy(&channel, "alert-limited", move |_n| {
                let invocations = invocations.clone();
                async move {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    Ok::<Option<String>, DeliveryError>(None)
                }
            })
            .await;
        assert_eq!(record.status, expected_status);
    }

    assert_eq!(provider_invocations.load(Ordering::SeqCst), 2, "skipped delivery must not touch the provider");

    let last_records = delivery_engine.recent_deliveries(Some("alert-limited"), None, 10);
    assert_eq!(last_records.len(), 3);
    assert_eq!(last_records[0].error_message.as_deref(), Some("rate_limit_exceeded"));
}

#[tokio::test(start_paused = true)]
async fn certify_attempt_timeout_is_a_delivery_failure() {
    let delivery_engine = bench_engine();
    let channel = bench_channel("timeout-ch", 1, 1000, 1);

    let delivery_record = delivery_engine
        .deliver_with_policy(&channel, "alert-timeout", |_n| async {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok::<Option<String>, DeliveryError>(None)
        })
        .await;

    assert_eq!(delivery_record.status, DeliveryStatus::Failed);
    assert!(
        delivery_record.error_message.as_deref().unwrap_or("").contains("ATTEMPT_TIMEOUT"),
        "timeout must surface as the final delivery error"
    );
}
