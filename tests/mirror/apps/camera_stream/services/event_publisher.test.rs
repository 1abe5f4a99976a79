// [tests/mirror/apps/camera_stream/services/event_publisher.test.rs]
/**
 * =================================================================
 * APARATO: EVENT PUBLISHER PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Certificar la difusión local degradada (sin Redis) y el
 *           sellado del formato de evento en el bus.
 * =================================================================
 */

use chrono::Utc;
use faceguard_camera_stream::config::Settings;
use faceguard_camera_stream::services::EventPublisher;
use faceguard_domain_models::{FrameMetadata, RecognitionResult};

fn bench_settings() -> Settings {
    Settings {
        service_host: "127.0.0.1".into(),
        service_port: 8003,
        log_level: "INFO".into(),
        camera_sources: vec!["0".into()],
        camera_frame_rate: 2,
        camera_resolution_width: 1280,
        camera_resolution_height: 720,
        camera_reconnect_attempts: 3,
        camera_reconnect_delay_seconds: 5,
        camera_health_check_interval_seconds: 30,
        frame_quality_threshold: 0.5,
        frame_buffer_size: 10,
        max_concurrent_cameras: 4,
        core_data_service_url: "http://127.0.0.1:9".into(),
        face_recognition_service_url: "http://127.0.0.1:9".into(),
        notification_service_url: "http://127.0.0.1:9".into(),
        integration_timeout_seconds: 10,
        integration_retry_attempts: 3,
        // Puerto 1: el enlace Redis colapsa y el bus degrada a local.
        redis_host: "127.0.0.1".into(),
        redis_port: 1,
        redis_db: 0,
        event_channel: "face_recognition_events".into(),
        event_batch_size: 100,
        enable_event_persistence: true,
        enable_multi_camera: true,
        enable_frame_quality_check: true,
        enable_event_publishing: true,
        enable_health_monitoring: true,
        enable_analytics: true,
    }
}

fn bench_metadata() -> FrameMetadata {
    FrameMetadata {
        frame_id: "frame-bus-1".into(),
        camera_id: "camera_0".into(),
        timestamp: Utc::now(),
        frame_number: 7,
        width: 1280,
        height: 720,
        channels: 3,
        file_size: 2_764_800,
        quality_score: Some(0.82),
        quality_grade: None,
    }
}

#[tokio::test]
async fn certify_degraded_publisher_still_broadcasts_locally() {
    println!("\n📡 [PROVING_GROUNDS]: Event bus degradation audit...");

    let event_publisher = EventPublisher::ignite(&bench_settings()).await;
    let mut local_subscriber = event_publisher.subscribe();

    let recognition_result = RecognitionResult {
        success: true,
        persons_detected: Vec::new(),
        processing_time_ms: 38.5,
        confidence_threshold: 0.6,
        frame_id: "frame-bus-1".into(),
        timestamp: Utc::now(),
        error: None,
    };

    let publish_succeeded = event_publisher
        .publish_recognition_event("camera_0", &recognition_result, &bench_metadata())
        .await;
    assert!(publish_succeeded, "local broadcast must succeed without Redis");

    let received_event = local_subscriber.recv().await.expect("event expected on local bus");
    assert_eq!(received_event.event_type, "face_recognition");
    assert_eq!(received_event.service_version, "2.0.0");
    assert_eq!(received_event.camera_id, "camera_0");
    assert_eq!(received_event.frame_id, "frame-bus-1");
    assert_eq!(received_event.frame_metadata.frame_number, 7);
    assert!(received_event.recognition_successful);

    let statistics = event_publisher.performance_statistics();
    assert_eq!(statistics["events_published"], 1);
    assert_eq!(statistics["redis_uplink_active"], false);
    println!("   ✅ [SUCCESS]: In-process bus operational without Redis uplink.");
}

#[tokio::test]
async fn certify_negative_events_are_published_too() {
    // Un intento fallido TAMBIÉN viaja al bus: el pipeline nunca
    // silencia los negativos.
    let event_publisher = EventPublisher::ignite(&bench_settings()).await;
    let mut local_subscriber = event_publisher.subscribe();

    let failed_result =
        RecognitionResult::failure("frame-bus-2".into(), 0.6, 55.0, "engine rejected frame".into());

    let mut negative_metadata = bench_metadata();
    negative_metadata.frame_id = "frame-bus-2".into();

    event_publisher
        .publish_recognition_event("camera_0", &failed_result, &negative_metadata)
        .await;

    let received_event = local_subscriber.recv().await.expect("negative event expected");
    assert!(!received_event.recognition_successful);
    assert!(received_event.persons_detected.is_empty());
}
