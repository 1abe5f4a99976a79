// [apps/notification/src/handlers/webhook.rs]
/*!
 * =================================================================
 * APARATO: RECOGNITION WEBHOOK INGEST (V2.2 - HMAC GUARDED)
 * CLASIFICACIÓN: API HANDLER (ESTRATO L4-APP)
 * RESPONSABILIDAD: INGESTA EXTERNA DE AVISTAMIENTOS FIRMADOS
 *
 * # Contrato de firma:
 * X-FaceGuard-Signature: sha256=hex(HMAC_SHA256(secreto, json_canónico)).
 * Firma inválida o ausente (con secreto configurado) -> HTTP 401.
 * =================================================================
 */

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use tracing::warn;

use crate::handlers::ApiError;
use crate::services::channels::webhook::{verify_signature, SIGNATURE_HEADER};
use crate::services::SightingAlertRequest;
use crate::state::AppState;

/// POST /webhook/recognition/sighting — ingest externo verificado.
pub async fn handle_sighting_ingest(
    State(application_state): State<AppState>,
    headers: HeaderMap,
    Json(raw_payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // 1. VERIFICACIÓN DE FIRMA (cuando el secreto está configurado).
    if let Some(ingest_secret) = &application_state.settings.webhook_ingest_secret {
        let provided_signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing webhook signature"))?;

        if !verify_signature(ingest_secret, &raw_payload, provided_signature) {
            warn!("🚫 [WEBHOOK_INGEST]: Invalid signature rejected.");
            return Err(ApiError::unauthorized("invalid webhook signature"));
        }
    }

    // 2. CONTRATO DE AVISTAMIENTO.
    let sighting_request: SightingAlertRequest = serde_json::from_value(raw_payload)
        .map_err(|decode_fault| ApiError::validation(format!("sighting payload invalid: {decode_fault}")))?;

    // 3. ENCOLADO NO BLOQUEANTE EN EL PIPELINE.
    let evaluation_result = application_state.alert_evaluator.evaluate(sighting_request);

    Ok(Json(serde_json::json!({
        "status": evaluation_result.status,
        "sighting_id": evaluation_result.sighting_id,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
