// [tests/mirror/apps/camera_stream/services/camera_manager.test.rs]
/**
 * =================================================================
 * APARATO: CAMERA MANAGER LIFECYCLE TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Certificar la máquina de estados de stream sobre una
 *           fuente sintética: start -> pause -> resume -> stop.
 * =================================================================
 */

use std::sync::Arc;
use std::time::Duration;

use faceguard_camera_stream::config::Settings;
use faceguard_camera_stream::services::{
    AsyncSightingCapture, CameraManager, CaptureWorkerPool, EventPublisher,
};
use faceguard_domain_models::{CameraStatus, StreamStatus};
use faceguard_infra_data_client::{CoreDataClient, NotificationClient};

fn bench_settings() -> Settings {
    Settings {
        service_host: "127.0.0.1".into(),
        service_port: 8003,
        log_level: "INFO".into(),
        camera_sources: Vec::new(),
        camera_frame_rate: 30,
        camera_resolution_width: 160,
        camera_resolution_height: 120,
        camera_reconnect_attempts: 2,
        camera_reconnect_delay_seconds: 1,
        camera_health_check_interval_seconds: 30,
        frame_quality_threshold: 0.0,
        frame_buffer_size: 10,
        max_concurrent_cameras: 2,
        core_data_service_url: "http://127.0.0.1:9".into(),
        face_recognition_service_url: String::new(),
        notification_service_url: "http://127.0.0.1:9".into(),
        integration_timeout_seconds: 2,
        integration_retry_attempts: 1,
        redis_host: "127.0.0.1".into(),
        redis_port: 1,
        redis_db: 0,
        event_channel: "face_recognition_events".into(),
        event_batch_size: 100,
        enable_event_persistence: false,
        enable_multi_camera: true,
        enable_frame_quality_check: false,
        enable_event_publishing: false,
        enable_health_monitoring: false,
        enable_analytics: false,
    }
}

async fn bench_manager() -> Arc<CameraManager> {
    let settings = Arc::new(bench_settings());
    let worker_pool = CaptureWorkerPool::new(settings.max_concurrent_cameras);
    let event_publisher = EventPublisher::ignite(&settings).await;
    let sighting_capture = AsyncSightingCapture::ignite(
        Arc::new(CoreDataClient::new(&settings.core_data_service_url).unwrap()),
        Arc::new(NotificationClient::new(&settings.notification_service_url).unwrap()),
    );

    CameraManager::ignite(settings, worker_pool, None, event_publisher, sighting_capture)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn certify_stream_lifecycle_on_synthetic_source() {
    println!("\n📡 [PROVING_GROUNDS]: Stream lifecycle audit...");
    let camera_manager = bench_manager().await;

    let camera_id = camera_manager
        .add_camera("synthetic-bench", "Synthetic Bench", Some("lab".into()))
        .await
        .expect("registration expected");

    // 1. CONEXIÓN FÍSICA.
    camera_manager.connect_camera(&camera_id).await.expect("connect expected");
    let connected_info = camera_manager.camera_info(&camera_id).await.unwrap();
    assert_eq!(connected_info.status, CameraStatus::Connected);

    // 2. IGNICIÓN DEL STREAM: los frames fluyen en orden de captura.
    camera_manager.start_stream(&camera_id).await.expect("stream ignition expected");
    tokio::time::sleep(Duration::from_millis(400)).await;

    let running_info = camera_manager.camera_info(&camera_id).await.unwrap();
    assert!(running_info.frames_processed > 0, "stream produced no frames");
    assert_eq!(running_info.stream_status, StreamStatus::Active);

    // 3. PAUSA: el bucle respira sin capturar.
    assert!(camera_manager.pause_stream(&camera_id).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    let paused_info = camera_manager.camera_info(&camera_id).await.unwrap();
    assert_eq!(paused_info.stream_status, StreamStatus::Paused);

    let frames_at_pause = paused_info.frames_processed;
    tokio::time::sleep(Duration::from_millis(250)).await;
    let still_paused_info = camera_manager.camera_info(&camera_id).await.unwrap();
    assert!(
        still_paused_info.frames_processed <= frames_at_pause + 1,
        "paused stream must not keep producing frames"
    );

    // 4. REANUDACIÓN Y PARADA ORDENADA.
    assert!(camera_manager.resume_stream(&camera_id).await);
    tokio::time::sleep(Duration::from_millis(200)).await;

    camera_manager.stop_stream(&camera_id).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    let stopped_info = camera_manager.camera_info(&camera_id).await.unwrap();
    assert_eq!(stopped_info.stream_status, StreamStatus::Stopped);

    println!("   ✅ [SUCCESS]: start -> pause -> resume -> stop certified.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn certify_single_shot_capture_and_removal() {
    let camera_manager = bench_manager().await;
    let camera_id = camera_manager
        .add_camera("synthetic-oneshot", "One Shot", None)
        .await
        .expect("registration expected");

    let (frame, metadata) =
        camera_manager.capture_single_frame(&camera_id).await.expect("capture expected");
    assert_eq!(frame.width, 160);
    assert_eq!(frame.height, 120);
    assert_eq!(metadata.camera_id, camera_id);
    assert_eq!(metadata.channels, 3);

    assert!(camera_manager.remove_camera(&camera_id).await);
    assert!(camera_manager.camera_info(&camera_id).await.is_none());
    assert!(!camera_manager.remove_camera(&camera_id).await, "double removal must report false");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn certify_health_summary_reflects_registry() {
    let camera_manager = bench_manager().await;

    // Sin cámaras: el agregado degrada.
    let empty_summary = camera_manager.health_summary().await;
    assert_eq!(empty_summary["status"], "degraded");

    let camera_id = camera_manager
        .add_camera("synthetic-health", "Health Probe", None)
        .await
        .expect("registration expected");

    // Registrada pero desconectada: sin enlaces vivos el agregado colapsa.
    let disconnected_summary = camera_manager.health_summary().await;
    assert_eq!(disconnected_summary["status"], "unhealthy");
    assert_eq!(disconnected_summary["total_cameras"], 1);

    camera_manager.connect_camera(&camera_id).await.expect("connect expected");
    let healthy_summary = camera_manager.health_summary().await;
    assert_eq!(healthy_summary["status"], "healthy");
    assert_eq!(healthy_summary["connected_cameras"], 1);
}
