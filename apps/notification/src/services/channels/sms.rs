// [apps/notification/src/services/channels/sms.rs]
/*!
 * =================================================================
 * APARATO: TWILIO SMS ENGINE (V2.5 - REAL DELIVERY)
 * CLASIFICACIÓN: DELIVERY ADAPTER (ESTRATO L4-APP)
 * RESPONSABILIDAD: COMPOSICIÓN ≤160, NORMALIZACIÓN E2E Y POST FORM
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. E.164 HEURISTICS: Sin '+' inicial se limpian separadores; el
 *    prefijo 877 mapea a +91; 10 dígitos iniciando en 2-9 a +1; el
 *    resto degrada a +1. (El prefijo 877 colisiona con toll-free
 *    estadounidense; pendiente de revisión del operador.)
 * 2. PROVIDER CONTRACT: POST form-encoded con Basic auth; HTTP 201
 *    entrega el SID del proveedor; otros estados sellan código y
 *    mensaje de diagnóstico.
 * =================================================================
 */

use std::time::Duration;

use faceguard_domain_models::AlertPriority;
use reqwest::Client;
use tracing::{debug, instrument};

use super::DeliveryError;

/// Techo duro de caracteres del cuerpo SMS.
pub const SMS_CHARACTER_LIMIT: usize = 160;

/// Techo del proveedor para el campo Body.
const PROVIDER_BODY_LIMIT: usize = 1600;

/// Recibo de una entrega SMS aceptada por el proveedor.
#[derive(Debug, Clone)]
pub struct SmsDeliveryReceipt {
    pub provider_sid: String,
    pub provider_status: Option<String>,
}

/// Normaliza un número telefónico al formato E.164.
pub fn normalize_phone_number(raw_phone: &str) -> String {
    let trimmed = raw_phone.trim();
    if trimmed.starts_with('+') {
        return trimmed.to_string();
    }

    let cleaned: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if cleaned.starts_with("877") {
        // TODO(ops): 877 es también prefijo toll-free de EEUU; confirmar
        // con el operador antes de fijar el mapa de países.
        format!("+91{cleaned}")
    } else if cleaned.len() == 10 && cleaned.starts_with(['2', '3', '4', '5', '6', '7', '8', '9']) {
        format!("+1{cleaned}")
    } else {
        format!("+1{cleaned}")
    }
}

/// Compone el cuerpo SMS con prefijo de prioridad, acotado a 160 chars.
pub fn compose_sms_message(
    priority: AlertPriority,
    person_id: &str,
    camera_id: &str,
    confidence: f64,
) -> String {
    let full_message = format!(
        "🚨FaceGuard: {} detected at {} ({:.0}%) - {}",
        person_id,
        camera_id,
        confidence * 100.0,
        priority.as_str().to_uppercase()
    );
    if full_message.chars().count() <= SMS_CHARACTER_LIMIT {
        return full_message;
    }

    let compact_message = format!(
        "🚨FaceGuard: {} detected - {}",
        person_id,
        priority.as_str().to_uppercase()
    );
    if compact_message.chars().count() <= SMS_CHARACTER_LIMIT {
        return compact_message;
    }

    let truncated_person: String = person_id.chars().take(20).collect();
    format!("🚨Alert: {truncated_person} detected")
}

/// Motor SMS compatible Twilio (POST form-encoded + Basic auth).
pub struct TwilioSmsEngine {
    network_session_client: Client,
    api_base_url: String,
}

impl TwilioSmsEngine {
    pub fn new() -> Self {
        Self {
            network_session_client: Client::builder()
                .user_agent("FaceGuard-Notification/2.0")
                .build()
                .expect("FATAL: SMS engine client initialization failed."),
            api_base_url: "https://api.twilio.com/2010-04-01".to_string(),
        }
    }

    /// Backend alternativo (pruebas de integración o proveedor propio).
    pub fn with_api_base(api_base_url: &str) -> Self {
        let mut engine = Self::new();
        engine.api_base_url = api_base_url.trim_end_matches('/').to_string();
        engine
    }

    /// Despacha el SMS; HTTP 201 certifica la aceptación del proveedor.
    #[instrument(skip(self, auth_token, message_body))]
    pub async fn send_sms(
        &self,
        account_sid: &str,
        auth_token: &str,
        from_number: &str,
        to_phone: &str,
        message_body: &str,
        attempt_timeout: Duration,
    ) -> Result<SmsDeliveryReceipt, DeliveryError> {
        if account_sid.is_empty() || auth_token.is_empty() {
            return Err(DeliveryError::Configuration("sms provider credentials missing".to_string()));
        }

        let normalized_destination = normalize_phone_number(to_phone);
        let bounded_body: String = message_body.chars().take(PROVIDER_BODY_LIMIT).collect();

        let target_url = format!("{}/Accounts/{}/Messages.json", self.api_base_url, account_sid);
        let form_payload = [
            ("To", normalized_destination.as_str()),
            ("From", from_number),
            ("Body", bounded_body.as_str()),
        ];

        let network_response = self
            .network_session_client
            .post(&target_url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&form_payload)
            .timeout(attempt_timeout)
            .send()
            .await
            .map_err(|transport_fault| {
                if transport_fault.is_timeout() {
                    DeliveryError::Timeout
                } else {
                    DeliveryError::Transport(transport_fault.to_string())
                }
            })?;

        let status_code = network_response.status();
        let response_body: serde_json::Value = network_response.json().await.unwrap_or_default();

        if status_code.as_u16() == 201 {
            let provider_sid = response_body["sid"].as_str().unwrap_or_default().to_string();
            debug!("📱 [SMS_ENGINE]: SMS accepted. Provider SID: {}.", provider_sid);
            Ok(SmsDeliveryReceipt {
                provider_sid,
                provider_status: response_body["status"].as_str().map(|s| s.to_string()),
            })
        } else {
            Err(DeliveryError::ProviderRejection {
                status: response_body["code"].as_u64().unwrap_or(status_code.as_u16() as u64) as u16,
                detail: response_body["message"]
                    .as_str()
                    .unwrap_or("provider rejection without diagnostic")
                    .to_string(),
            })
        }
    }
}

impl Default for TwilioSmsEngine {
    fn default() -> Self {
        Self::new()
    }
}
