// [apps/camera-stream/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: CAMERA STREAM STATE HUB (V2.2 - COMPOSITION ROOT)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SERVICIOS Y CONTEXTO DE PROCESO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. EXPLICIT CONTEXT: Sin singletons de módulo; todos los servicios
 *    viven en este contenedor y viajan por referencia desde la raíz
 *    de composición (kernel).
 * 2. OPTIONAL UPLINK: El enlace de reconocimiento solo se forja si el
 *    entorno declara la URL del motor.
 * =================================================================
 */

use std::sync::Arc;

use chrono::{DateTime, Utc};
use faceguard_core_vector_index::{RecognitionCacheRegistry, VectorIndex};
use faceguard_infra_data_client::{CoreDataClient, NotificationClient};
use tracing::{debug, info};

use crate::config::Settings;
use crate::services::{
    AsyncSightingCapture, CameraManager, CaptureWorkerPool, EventPublisher, RecognitionUplink,
};

/// Contenedor de estado compartido (Thread-Safe) del servicio de cámaras.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub camera_manager: Arc<CameraManager>,
    pub recognition_uplink: Option<Arc<RecognitionUplink>>,
    pub event_publisher: Arc<EventPublisher>,
    pub sighting_capture: Arc<AsyncSightingCapture>,
    pub cache_registry: Arc<RecognitionCacheRegistry>,
    pub vector_index: Arc<VectorIndex>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Forja el estado maestro inyectando todas las dependencias.
    pub async fn ignite(settings: Settings) -> anyhow::Result<Self> {
        debug!("🧬 [APP_STATE]: Executing ignition sequence for camera-stream...");

        let settings = Arc::new(settings);

        let cache_registry = Arc::new(RecognitionCacheRegistry::new());
        let vector_index = Arc::new(VectorIndex::new());

        let core_data_client = Arc::new(CoreDataClient::new(&settings.core_data_service_url)?);
        let notification_client = Arc::new(NotificationClient::new(&settings.notification_service_url)?);

        let recognition_uplink = if settings.face_recognition_service_url.trim().is_empty() {
            info!("ℹ️  [APP_STATE]: Recognition engine URL absent. Uplink disabled.");
            None
        } else {
            Some(Arc::new(RecognitionUplink::new(
                &settings,
                cache_registry.clone(),
                vector_index.clone(),
            )))
        };

        let event_publisher = EventPublisher::ignite(&settings).await;
        let sighting_capture = AsyncSightingCapture::ignite(core_data_client, notification_client);

        let worker_pool = CaptureWorkerPool::new(settings.max_concurrent_cameras);
        let camera_manager = CameraManager::ignite(
            settings.clone(),
            worker_pool,
            recognition_uplink.clone(),
            event_publisher.clone(),
            sighting_capture.clone(),
        );

        Ok(Self {
            settings,
            camera_manager,
            recognition_uplink,
            event_publisher,
            sighting_capture,
            cache_registry,
            vector_index,
            started_at: Utc::now(),
        })
    }
}
