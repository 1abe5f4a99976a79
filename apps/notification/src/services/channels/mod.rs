// [apps/notification/src/services/channels/mod.rs]
/*!
 * =================================================================
 * APARATO: CHANNEL ADAPTERS ROOT (V2.1)
 * CLASIFICACIÓN: DELIVERY ADAPTERS (ESTRATO L4-APP)
 * RESPONSABILIDAD: ADAPTADORES POR PROTOCOLO Y CATÁLOGO DE FALLOS
 * =================================================================
 */

use thiserror::Error;

/// Correo multipart con encabezado cromático por prioridad.
pub mod email;
/// SMS compatible Twilio con normalización de números.
pub mod sms;
/// Webhook JSON firmado HMAC-SHA256.
pub mod webhook;

/// Fallos de entrega por intento; consumidos por el retry y el breaker.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// El intento superó el timeout del canal.
    #[error("[C6_DELIVERY_FAULT]: ATTEMPT_TIMEOUT")]
    Timeout,

    /// Fallo físico de red hacia el proveedor externo.
    #[error("[C6_DELIVERY_FAULT]: TRANSPORT_SEVERED -> {0}")]
    Transport(String),

    /// El proveedor rechazó la entrega con código y diagnóstico.
    #[error("[C6_DELIVERY_FAULT]: PROVIDER_REJECTION -> HTTP_{status}: {detail}")]
    ProviderRejection { status: u16, detail: String },

    /// Fallo del estrato SMTP (autenticación, destinatario, enlace).
    #[error("[C6_DELIVERY_FAULT]: SMTP_FAULT -> {0}")]
    Smtp(String),

    /// Configuración de canal incompleta o malformada.
    #[error("[C6_DELIVERY_FAULT]: CHANNEL_CONFIG_VOID -> {0}")]
    Configuration(String),
}
