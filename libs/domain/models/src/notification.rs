// [libs/domain/models/src/notification.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION DOMAIN MODELS (V4.2 - DELIVERY CONTRACT)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTACTOS, CANALES TIPADOS Y RASTRO DE ENTREGA
 *
 * # Mathematical Proof (Tagged Configuration):
 * ChannelConfig reemplaza el diccionario dinámico del plano de
 * configuración por variantes etiquetadas; el compilador garantiza
 * que cada adaptador reciba exactamente los campos de su protocolo.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use typeshare::typeshare;

/// Medio de contacto de un destinatario individual.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Email,
    Phone,
    Webhook,
}

/// Protocolo de un canal de entrega.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Email,
    Sms,
    Webhook,
    Websocket,
}

/// Estado de una entrega individual.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
    Bounced,
}

/// Destinatario individual con ventanas permitidas y techo por hora.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationContact {
    pub id: String,
    pub contact_type: ContactType,
    pub contact_value: String,
    pub is_verified: bool,
    #[typeshare(serialized_as = "number")]
    pub priority: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_hours: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_days: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[typeshare(serialized_as = "number")]
    pub max_per_hour: Option<u32>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
}

/// Configuración tipada por protocolo de canal.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelConfig {
    Email {
        smtp_host: String,
        #[typeshare(serialized_as = "number")]
        smtp_port: u16,
        /// STARTTLS sobre el puerto de envío estándar.
        use_tls: bool,
        /// TLS directo (wrapper); excluyente con use_tls.
        #[serde(default)]
        use_ssl: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        from_email: String,
        email_address: String,
    },
    Sms {
        provider: String,
        account_sid: String,
        auth_token: String,
        from_number: String,
        phone_number: String,
    },
    Webhook {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret: Option<String>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        headers: HashMap<String, String>,
    },
    Websocket {
        /// Sala de difusión objetivo: alerts, notifications, system o dashboard.
        room: String,
    },
}

impl ChannelConfig {
    pub fn channel_type(&self) -> ChannelType {
        match self {
            Self::Email { .. } => ChannelType::Email,
            Self::Sms { .. } => ChannelType::Sms,
            Self::Webhook { .. } => ChannelType::Webhook,
            Self::Websocket { .. } => ChannelType::Websocket,
        }
    }
}

/// Canal de entrega con sus salvaguardas declaradas.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub channel_name: String,
    pub channel_type: ChannelType,
    pub configuration: ChannelConfig,
    /// Techo de envíos en ventana deslizante de 60 segundos.
    #[typeshare(serialized_as = "number")]
    pub rate_limit_per_minute: u32,
    #[typeshare(serialized_as = "number")]
    pub retry_attempts: u32,
    #[typeshare(serialized_as = "number")]
    pub timeout_seconds: u64,
    pub is_active: bool,
}

/// Registro inmutable del desenlace de una entrega.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: String,
    pub alert_id: String,
    pub channel_id: String,
    pub status: DeliveryStatus,
    #[typeshare(serialized_as = "number")]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Identificador asignado por el proveedor externo (ej: SID de Twilio).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[typeshare(serialized_as = "object")]
    pub metadata: serde_json::Value,
}
