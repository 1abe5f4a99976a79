// [apps/notification/src/config.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION SETTINGS (V2.2 - ENV SOVEREIGN)
 * CLASIFICACIÓN: CONFIGURATION (ESTRATO L0-APP)
 * RESPONSABILIDAD: HIDRATACIÓN DEL ENTORNO DEL SERVICIO DE ALERTAS
 * =================================================================
 */

use std::env;
use std::str::FromStr;
use tracing::warn;

pub const SERVICE_NAME: &str = "notification-service";
pub const SERVICE_VERSION: &str = "2.0.0";

/// Configuración completa del servicio de notificaciones.
#[derive(Debug, Clone)]
pub struct Settings {
    pub service_host: String,
    pub service_port: u16,
    pub log_level: String,

    pub core_data_service_url: String,

    // --- SMTP por defecto para contactos individuales ---
    pub default_smtp_host: String,
    pub default_smtp_port: u16,
    pub default_smtp_use_tls: bool,
    pub default_from_email: String,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,

    // --- Proveedor SMS (compatible Twilio) ---
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from_number: String,

    // --- Salvaguardas de entrega ---
    pub default_retry_attempts: u32,
    pub default_timeout_seconds: u64,

    // --- Evaluación y escalamiento ---
    pub escalation_check_interval_seconds: u64,
    pub evaluation_queue_capacity: usize,

    /// Secreto HMAC del ingest de avistamientos externos.
    pub webhook_ingest_secret: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            service_host: env_string("SERVICE_HOST", "0.0.0.0"),
            service_port: env_clamped("SERVICE_PORT", 8004u16, 1024, 65535),
            log_level: env_string("LOG_LEVEL", "INFO").to_uppercase(),

            core_data_service_url: env_string("CORE_DATA_SERVICE_URL", "http://localhost:8001"),

            default_smtp_host: env_string("DEFAULT_SMTP_HOST", "smtp.gmail.com"),
            default_smtp_port: env_clamped("DEFAULT_SMTP_PORT", 587u16, 1, 65535),
            default_smtp_use_tls: env_flag("DEFAULT_SMTP_USE_TLS", true),
            default_from_email: env_string("DEFAULT_FROM_EMAIL", "faceguard.alerts@example.com"),
            smtp_username: env_optional("SMTP_USERNAME"),
            smtp_password: env_optional("SMTP_PASSWORD"),

            twilio_account_sid: env_optional("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: env_optional("TWILIO_AUTH_TOKEN"),
            twilio_from_number: env_string("TWILIO_FROM_NUMBER", "+15005550001"),

            default_retry_attempts: env_clamped("DEFAULT_RETRY_ATTEMPTS", 3u32, 1, 10),
            default_timeout_seconds: env_clamped("DEFAULT_TIMEOUT_SECONDS", 30u64, 1, 120),

            escalation_check_interval_seconds: env_clamped("ESCALATION_CHECK_INTERVAL", 30u64, 5, 300),
            evaluation_queue_capacity: env_clamped("EVALUATION_QUEUE_CAPACITY", 1000usize, 10, 10000),

            webhook_ingest_secret: env_optional("WEBHOOK_INGEST_SECRET"),
        }
    }
}

fn env_string(key: &str, default_value: &str) -> String {
    env::var(key).ok().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| default_value.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str, default_value: bool) -> bool {
    match env::var(key) {
        Ok(raw) => matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default_value,
    }
}

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
        minimum
    } else if parsed > maximum {
        maximum
    } else {
        parsed
    }
}
