// [apps/notification/src/services/channels/webhook.rs]
/*!
 * =================================================================
 * APARATO: SIGNED WEBHOOK ENGINE (V2.4 - HMAC SEALED)
 * CLASIFICACIÓN: DELIVERY ADAPTER (ESTRATO L4-APP)
 * RESPONSABILIDAD: POST JSON CANÓNICO CON FIRMA HMAC-SHA256
 *
 * # Mathematical Proof (Signature Canonicality):
 * La firma se computa sobre el JSON canónico (llaves ordenadas); dos
 * sobres semánticamente idénticos producen exactamente la misma firma
 * sha256=hex(HMAC_SHA256(secreto, json_canónico)).
 * =================================================================
 */

use std::collections::HashMap;
use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::{debug, instrument};

use super::DeliveryError;

type HmacSha256 = Hmac<Sha256>;

/// Encabezado de firma de la plataforma.
pub const SIGNATURE_HEADER: &str = "X-FaceGuard-Signature";

/// Serialización canónica: el mapa subyacente ordena las llaves,
/// garantizando una representación estable para la firma.
pub fn canonical_json(payload: &serde_json::Value) -> String {
    payload.to_string()
}

/// Computa la firma 'sha256=<hex>' del sobre canónico.
pub fn sign_payload(shared_secret: &str, payload: &serde_json::Value) -> String {
    let canonical_body = canonical_json(payload);
    let mut mac = HmacSha256::new_from_slice(shared_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(canonical_body.as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Verificación en tiempo constante de una firma recibida.
pub fn verify_signature(
    shared_secret: &str,
    payload: &serde_json::Value,
    provided_signature: &str,
) -> bool {
    let expected_signature = sign_payload(shared_secret, payload);

    let expected_bytes = expected_signature.as_bytes();
    let provided_bytes = provided_signature.as_bytes();
    if expected_bytes.len() != provided_bytes.len() {
        return false;
    }

    let mut difference_accumulator: u8 = 0;
    for (expected_byte, provided_byte) in expected_bytes.iter().zip(provided_bytes.iter()) {
        difference_accumulator |= expected_byte ^ provided_byte;
    }
    difference_accumulator == 0
}

/// Motor de entrega webhook con firma opcional por secreto de canal.
pub struct WebhookDeliveryEngine {
    network_session_client: Client,
}

impl WebhookDeliveryEngine {
    pub fn new() -> Self {
        Self {
            network_session_client: Client::builder()
                .user_agent("FaceGuard-Notification/2.0")
                .build()
                .expect("FATAL: Webhook engine client initialization failed."),
        }
    }

    /// POST del sobre JSON; cualquier HTTP >= 400 es fallo de entrega.
    #[instrument(skip(self, shared_secret, envelope, extra_headers))]
    pub async fn post_envelope(
        &self,
        webhook_url: &str,
        shared_secret: Option<&str>,
        extra_headers: &HashMap<String, String>,
        envelope: &serde_json::Value,
        attempt_timeout: Duration,
    ) -> Result<u16, DeliveryError> {
        let canonical_body = canonical_json(envelope);

        let mut request_builder = self
            .network_session_client
            .post(webhook_url)
            .header("Content-Type", "application/json")
            .timeout(attempt_timeout)
            .body(canonical_body);

        if let Some(secret) = shared_secret {
            request_builder = request_builder.header(SIGNATURE_HEADER, sign_payload(secret, envelope));
        }
        for (header_name, header_value) in extra_headers {
            request_builder = request_builder.header(header_name, header_value);
        }

        let network_response = request_builder.send().await.map_err(|transport_fault| {
            if transport_fault.is_timeout() {
                DeliveryError::Timeout
            } else {
                DeliveryError::Transport(transport_fault.to_string())
            }
        })?;

        let status_code = network_response.status();
        if status_code.as_u16() >= 400 {
            let diagnostic_body = network_response.text().await.unwrap_or_default();
            return Err(DeliveryError::ProviderRejection {
                status: status_code.as_u16(),
                detail: diagnostic_body,
            });
        }

        debug!("🪝 [WEBHOOK_ENGINE]: Envelope delivered to {} (HTTP {}).", webhook_url, status_code);
        Ok(status_code.as_u16())
    }
}

impl Default for WebhookDeliveryEngine {
    fn default() -> Self {
        Self::new()
    }
}
