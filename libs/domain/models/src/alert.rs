// [libs/domain/models/src/alert.rs]
/*!
 * =================================================================
 * APARATO: ALERT DOMAIN MODELS (V4.3 - BUSINESS RULES MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: REGLAS DECLARATIVAS, INSTANCIAS Y PERFILES VIP
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CONJUNCTION SEMANTICS: TriggerConditions es un registro tipado;
 *    toda condición presente debe cumplirse (AND), con 'any_person'
 *    como cortocircuito evaluado al final.
 * 2. ID-ONLY LINKS: Regla -> canales y persona -> contactos se
 *    enlazan por identificador, resueltos vía repositorios.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Prioridad declarada de una regla y de sus instancias disparadas.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertPriority {
    /// Color hexadecimal del encabezado de correo asociado a la prioridad.
    pub fn header_color(&self) -> &'static str {
        match self {
            Self::Low => "#28a745",
            Self::Medium => "#ffc107",
            Self::High => "#fd7e14",
            Self::Critical => "#dc3545",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Ciclo de vida de una instancia de alerta.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    Escalated,
}

/// Franja horaria [start_hour, end_hour) en hora UTC de pared.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    #[typeshare(serialized_as = "number")]
    pub start_hour: u8,
    #[typeshare(serialized_as = "number")]
    pub end_hour: u8,
}

/// Condiciones de disparo de una regla; conjunción de las presentes.
#[typeshare]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_persons: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ranges: Option<Vec<TimeRange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[typeshare(serialized_as = "number")]
    pub min_access_level: Option<u32>,
    /// Cortocircuito: la regla dispara ante cualquier persona reconocida.
    #[serde(default)]
    pub any_person: bool,
}

/// Especificación declarativa de emparejamiento de avistamientos.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    pub rule_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: AlertPriority,
    pub trigger_conditions: TriggerConditions,
    /// Ventana de enfriamiento por (regla, persona, cámara). 0 = sin ventana.
    #[typeshare(serialized_as = "number")]
    pub cooldown_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[typeshare(serialized_as = "number")]
    pub escalation_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[typeshare(serialized_as = "number")]
    pub auto_resolve_minutes: Option<u32>,
    /// Enlace por id a los canales de entrega; resuelto vía repositorio.
    pub notification_channel_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_template: Option<String>,
    pub is_active: bool,
}

/// Disparo concreto de una regla: mutada solo mediante transiciones explícitas.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertInstance {
    pub id: String,
    pub rule_id: String,
    pub rule_name: String,
    pub person_id: String,
    pub camera_id: String,
    pub sighting_id: String,
    pub priority: AlertPriority,
    pub status: AlertStatus,
    pub message: String,
    /// Blob forense con los datos del disparo (bbox, confianza, metadatos).
    #[typeshare(serialized_as = "object")]
    pub trigger_data: serde_json::Value,
    pub triggered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_at: Option<DateTime<Utc>>,
    /// Prioridad original cuando la instancia fue escalada.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_from: Option<AlertPriority>,
    #[typeshare(serialized_as = "number")]
    pub notification_count: u32,
}

/// Nivel de vigilancia asignado a una persona de alta prioridad.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    High,
    Critical,
    Wanted,
}

impl PriorityLevel {
    /// Proyección al estrato de prioridades de alerta.
    pub fn as_alert_priority(&self) -> AlertPriority {
        match self {
            Self::High => AlertPriority::High,
            Self::Critical | Self::Wanted => AlertPriority::Critical,
        }
    }
}

/// Cadencia de notificación configurada para una persona vigilada.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationFrequency {
    Immediate,
    Daily,
    Weekly,
}

/// Respuesta del servicio de datos al chequeo de prioridad de una persona.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonPriorityProfile {
    pub is_high_priority: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_level: Option<PriorityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_reason: Option<String>,
    /// Canales de escalamiento en orden de despacho (ej: sms, email, dashboard).
    /// El servicio de datos los reporta como lista o como cadena separada
    /// por comas; ambas formas colapsan a la lista ordenada.
    #[serde(default, deserialize_with = "deserialize_channel_list")]
    pub escalation_channels: Vec<String>,
    #[serde(default = "PersonPriorityProfile::default_frequency")]
    pub notification_frequency: NotificationFrequency,
}

impl PersonPriorityProfile {
    fn default_frequency() -> NotificationFrequency {
        NotificationFrequency::Immediate
    }

    /// Perfil degradado: ante la caída del API de prioridad, la persona
    /// se trata como no-prioritaria y solo se emite la alerta básica.
    pub fn degraded() -> Self {
        Self {
            is_high_priority: false,
            priority_level: None,
            alert_reason: None,
            escalation_channels: vec!["dashboard".to_string()],
            notification_frequency: NotificationFrequency::Immediate,
        }
    }
}

fn deserialize_channel_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ChannelListWire {
        Listed(Vec<String>),
        Joined(String),
    }

    Ok(match ChannelListWire::deserialize(deserializer)? {
        ChannelListWire::Listed(channels) => channels,
        ChannelListWire::Joined(joined) => joined
            .split(',')
            .map(|fragment| fragment.trim().to_string())
            .filter(|fragment| !fragment.is_empty())
            .collect(),
    })
}

/// Entrada de la tabla de enlace persona-prioritaria <-> contacto.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonContactLink {
    pub id: String,
    pub contact_type: crate::notification::ContactType,
    pub contact_value: String,
    /// Retardo de escalamiento; 0 = despacho inmediato.
    #[typeshare(serialized_as = "number")]
    pub escalation_delay_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_override: Option<AlertPriority>,
    /// Plantilla con los campos person_name, camera_location, confidence, timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message_template: Option<String>,
}
