// [apps/notification/src/handlers/evaluation.rs]
/*!
 * =================================================================
 * APARATO: ALERT EVALUATION HANDLERS (V2.3 - PIPELINE GATE)
 * CLASIFICACIÓN: API HANDLER (ESTRATO L4-APP)
 * RESPONSABILIDAD: ENTRADA AVISTAMIENTO -> ALERTA (ACUSE ~10MS)
 * =================================================================
 */

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::config::{SERVICE_NAME, SERVICE_VERSION};
use crate::handlers::ApiError;
use crate::services::{EvaluationResult, SightingAlertRequest};
use crate::state::AppState;

/// POST /alert-evaluation/evaluate-sighting — acuse inmediato 'queued'.
/// El bucle de reconocimiento remoto JAMÁS espera por la evaluación.
pub async fn handle_evaluate_sighting(
    State(application_state): State<AppState>,
    Json(sighting_request): Json<SightingAlertRequest>,
) -> Result<Json<EvaluationResult>, ApiError> {
    if sighting_request.person_id.trim().is_empty() {
        return Err(ApiError::validation("person_id must not be empty"));
    }
    if sighting_request.camera_id.trim().is_empty() {
        return Err(ApiError::validation("camera_id must not be empty"));
    }
    if !(0.0..=1.0).contains(&sighting_request.confidence_score) {
        return Err(ApiError::validation("confidence_score must be within [0, 1]"));
    }

    Ok(Json(application_state.alert_evaluator.evaluate(sighting_request)))
}

/// GET /alert-evaluation/statistics
pub async fn handle_evaluation_statistics(
    State(application_state): State<AppState>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "status": "operational",
        "evaluation": application_state.alert_evaluator.statistics_snapshot(),
        "delivery": application_state.delivery_engine.statistics(),
        "performance": {
            "target_response_time_ms": 10,
            "architecture": "background_processing",
            "non_blocking": true,
        },
        "capabilities": {
            "basic_detection_alerts": true,
            "high_priority_alerts": true,
            "person_based_alerts": true,
            "confidence_threshold_alerts": true,
            "camera_based_alerts": true,
            "time_range_alerts": true,
            "any_person_alerts": true,
        },
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
