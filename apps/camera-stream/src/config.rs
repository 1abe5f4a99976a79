// [apps/camera-stream/src/config.rs]
/*!
 * =================================================================
 * APARATO: CAMERA STREAM SETTINGS (V2.3 - ENV SOVEREIGN)
 * CLASIFICACIÓN: CONFIGURATION (ESTRATO L0-APP)
 * RESPONSABILIDAD: HIDRATACIÓN Y VALIDACIÓN DEL ENTORNO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CLAMP DISCIPLINE: Todo valor numérico fuera de rango se recorta
 *    a su frontera declarada y queda registrado en el panóptico.
 * 2. DEGRADE, NEVER DIE: Valores imparseables caen al default con
 *    advertencia; el servicio jamás aborta por una variable sucia.
 * =================================================================
 */

use std::env;
use std::str::FromStr;
use tracing::warn;

pub const SERVICE_NAME: &str = "camera-stream-service";
pub const SERVICE_VERSION: &str = "2.0.0";

/// Configuración completa del servicio de streaming de cámaras.
#[derive(Debug, Clone)]
pub struct Settings {
    // --- Servicio ---
    pub service_host: String,
    pub service_port: u16,
    pub log_level: String,

    // --- Cámaras ---
    pub camera_sources: Vec<String>,
    /// Tasa de extracción de frames (1-30 FPS).
    pub camera_frame_rate: u32,
    pub camera_resolution_width: u32,
    pub camera_resolution_height: u32,
    /// Reintentos de reconexión (1-10).
    pub camera_reconnect_attempts: u32,
    /// Retardo entre reconexiones (1-60 s).
    pub camera_reconnect_delay_seconds: u64,
    pub camera_health_check_interval_seconds: u64,

    // --- Procesamiento de frames ---
    pub frame_quality_threshold: f64,
    pub frame_buffer_size: usize,
    /// Tamaño del pool de trabajadores bloqueantes (1-16).
    pub max_concurrent_cameras: usize,

    // --- Integración de servicios ---
    pub core_data_service_url: String,
    pub face_recognition_service_url: String,
    pub notification_service_url: String,
    pub integration_timeout_seconds: u64,
    pub integration_retry_attempts: u32,

    // --- Sistema de eventos ---
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: u8,
    pub event_channel: String,
    pub event_batch_size: usize,
    pub enable_event_persistence: bool,

    // --- Banderas de características ---
    pub enable_multi_camera: bool,
    pub enable_frame_quality_check: bool,
    pub enable_event_publishing: bool,
    pub enable_health_monitoring: bool,
    pub enable_analytics: bool,
}

impl Settings {
    /// Hidrata la configuración desde el entorno del proceso.
    pub fn from_env() -> Self {
        let camera_sources = env_string("CAMERA_SOURCES", "0")
            .split(',')
            .map(|fragment| fragment.trim().to_string())
            .filter(|fragment| !fragment.is_empty())
            .collect::<Vec<_>>();

        Self {
            service_host: env_string("SERVICE_HOST", "0.0.0.0"),
            service_port: env_clamped("SERVICE_PORT", 8003u16, 1024, 65535),
            log_level: env_string("LOG_LEVEL", "INFO").to_uppercase(),

            camera_sources: if camera_sources.is_empty() { vec!["0".to_string()] } else { camera_sources },
            camera_frame_rate: env_clamped("CAMERA_FRAME_RATE", 2u32, 1, 30),
            camera_resolution_width: env_clamped("CAMERA_RESOLUTION_WIDTH", 1280u32, 320, 1920),
            camera_resolution_height: env_clamped("CAMERA_RESOLUTION_HEIGHT", 720u32, 240, 1080),
            camera_reconnect_attempts: env_clamped("CAMERA_RECONNECT_ATTEMPTS", 3u32, 1, 10),
            camera_reconnect_delay_seconds: env_clamped("CAMERA_RECONNECT_DELAY", 5u64, 1, 60),
            camera_health_check_interval_seconds: env_clamped("CAMERA_HEALTH_CHECK_INTERVAL", 30u64, 5, 300),

            frame_quality_threshold: env_clamped("FRAME_QUALITY_THRESHOLD", 0.5f64, 0.0, 1.0),
            frame_buffer_size: env_clamped("FRAME_BUFFER_SIZE", 10usize, 1, 100),
            max_concurrent_cameras: env_clamped("MAX_CONCURRENT_CAMERAS", 4usize, 1, 16),

            core_data_service_url: env_string("CORE_DATA_SERVICE_URL", "http://localhost:8001"),
            face_recognition_service_url: env_string("FACE_RECOGNITION_SERVICE_URL", "http://localhost:8002"),
            notification_service_url: env_string("NOTIFICATION_SERVICE_URL", "http://localhost:8004"),
            integration_timeout_seconds: env_clamped("INTEGRATION_TIMEOUT", 10u64, 1, 60),
            integration_retry_attempts: env_clamped("INTEGRATION_RETRY_ATTEMPTS", 3u32, 1, 10),

            redis_host: env_string("REDIS_HOST", "localhost"),
            redis_port: env_clamped("REDIS_PORT", 6379u16, 1, 65535),
            redis_db: env_clamped("REDIS_DB", 0u8, 0, 15),
            event_channel: env_string("EVENT_CHANNEL", "face_recognition_events"),
            event_batch_size: env_clamped("EVENT_BATCH_SIZE", 100usize, 1, 1000),
            enable_event_persistence: env_flag("ENABLE_EVENT_PERSISTENCE", true),

            enable_multi_camera: env_flag("ENABLE_MULTI_CAMERA", true),
            enable_frame_quality_check: env_flag("ENABLE_FRAME_QUALITY_CHECK", true),
            enable_event_publishing: env_flag("ENABLE_EVENT_PUBLISHING", true),
            enable_health_monitoring: env_flag("ENABLE_HEALTH_MONITORING", true),
            enable_analytics: env_flag("ENABLE_ANALYTICS", true),
        }
    }

    /// URL de conexión al estrato Redis del bus de eventos.
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.redis_host, self.redis_port, self.redis_db)
    }

    /// Intervalo objetivo entre frames según la tasa configurada.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.camera_frame_rate.max(1) as f64)
    }
}

fn env_string(key: &str, default_value: &str) -> String {
    env::var(key).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default_value.to_string())
}

fn env_flag(key: &str, default_value: bool) -> bool {
    match env::var(key) {
        Ok(raw) => matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default_value,
    }
}

/// Parsea y recorta al rango [minimum, maximum]; degrada al default con rastro.
fn env_clamped<T>(key: &str, default_value: T, minimum: T, maximum: T) -> T
where
    T: FromStr + PartialOrd + Copy + std::fmt::Display,
{
    let parsed = match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("⚠️ [SETTINGS]: {} unparseable ('{}'). Falling back to {}.", key, raw, default_value);
                default_value
            }
        },
        Err(_) => default_value,
    };

    if parsed < minimum {
        warn!("⚠️ [SETTINGS]: {} below floor. Clamped {} -> {}.", key, parsed, minimum);
        minimum
    } else if parsed > maximum {
        warn!("⚠️ [SETTINGS]: {} above ceiling. Clamped {} -> {}.", key, parsed, maximum);
        maximum
    } else {
        parsed
    }
}
