// [apps/notification/src/handlers/delivery.rs]
/*!
 * =================================================================
 * APARATO: DELIVERY HANDLERS (V2.2 - DIRECT DISPATCH SURFACE)
 * CLASIFICACIÓN: API HANDLER (ESTRATO L4-APP)
 * RESPONSABILIDAD: ENVÍO DIRECTO, LOGS Y ESTADO DE ENTREGAS
 * =================================================================
 */

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use faceguard_domain_models::AlertPriority;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::ApiError;
use crate::services::AlertMessageData;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DirectSendRequest {
    pub subject: String,
    pub message: String,
    pub recipient: String,
    pub channel_ids: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: AlertPriority,
}

fn default_priority() -> AlertPriority {
    AlertPriority::Medium
}

#[derive(Deserialize)]
pub struct DeliveryLogsQuery {
    #[serde(default)]
    pub alert_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// POST /delivery/send — notificación directa por canales explícitos.
pub async fn handle_direct_send(
    State(application_state): State<AppState>,
    Json(request): Json<DirectSendRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if request.channel_ids.is_empty() {
        return Err(ApiError::validation("channel_ids must not be empty"));
    }
    if request.message.trim().is_empty() {
        return Err(ApiError::validation("message must not be empty"));
    }

    let resolved_channels =
        application_state.channel_registry.resolve_active(&request.channel_ids);
    if resolved_channels.is_empty() {
        return Err(ApiError::validation("no active channels resolved from channel_ids"));
    }

    let direct_message = AlertMessageData {
        alert_id: Uuid::new_v4().to_string(),
        rule_name: "Direct Send".to_string(),
        priority: request.priority,
        person_id: request.recipient.clone(),
        camera_id: "-".to_string(),
        confidence: 0.0,
        triggered_at: Utc::now().to_rfc3339(),
        subject: request.subject,
        body_override: Some(request.message),
        face_crop_jpeg: None,
    };

    let delivery_summary =
        application_state.delivery_engine.deliver_alert(&resolved_channels, &direct_message).await;

    Ok((StatusCode::CREATED, Json(delivery_summary)))
}

/// GET /delivery/logs — historial caliente de entregas.
pub async fn handle_delivery_logs(
    State(application_state): State<AppState>,
    Query(query): Query<DeliveryLogsQuery>,
) -> Json<serde_json::Value> {
    let delivery_records = application_state.delivery_engine.recent_deliveries(
        query.alert_id.as_deref(),
        query.channel_id.as_deref(),
        query.limit.unwrap_or(100),
    );

    Json(serde_json::json!({
        "deliveries": delivery_records,
        "total": delivery_records.len(),
        "statistics": application_state.delivery_engine.statistics(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /delivery/{id}/status
pub async fn handle_delivery_status(
    State(application_state): State<AppState>,
    Path(delivery_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let delivery_record = application_state
        .delivery_engine
        .delivery_by_id(&delivery_id)
        .ok_or_else(|| ApiError::not_found(format!("delivery '{delivery_id}' not found")))?;

    Ok(Json(serde_json::json!({
        "delivery": delivery_record,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
