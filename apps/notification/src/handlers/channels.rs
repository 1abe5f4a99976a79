// [apps/notification/src/handlers/channels.rs]
/*!
 * =================================================================
 * APARATO: CHANNEL HANDLERS (V2.3 - DELIVERY PLANE SURFACE)
 * CLASIFICACIÓN: API HANDLER (ESTRATO L4-APP)
 * RESPONSABILIDAD: CRUD DE CANALES Y PRUEBA DE ENTREGA
 * =================================================================
 */

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use faceguard_domain_models::{AlertPriority, ChannelConfig, NotificationChannel};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::ApiError;
use crate::services::AlertMessageData;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateChannelRequest {
    pub channel_name: String,
    pub configuration: ChannelConfig,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_rate_limit() -> u32 {
    60
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_is_active() -> bool {
    true
}

/// GET /channels
pub async fn handle_list_channels(State(application_state): State<AppState>) -> Json<serde_json::Value> {
    let notification_channels = application_state.channel_registry.all();
    Json(serde_json::json!({
        "channels": notification_channels,
        "total": notification_channels.len(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// POST /channels
pub async fn handle_create_channel(
    State(application_state): State<AppState>,
    Json(request): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<NotificationChannel>), ApiError> {
    if request.channel_name.trim().is_empty() {
        return Err(ApiError::validation("channel_name must not be empty"));
    }

    let notification_channel = NotificationChannel {
        id: Uuid::new_v4().to_string(),
        channel_name: request.channel_name,
        channel_type: request.configuration.channel_type(),
        configuration: request.configuration,
        rate_limit_per_minute: request.rate_limit_per_minute,
        retry_attempts: request.retry_attempts,
        timeout_seconds: request.timeout_seconds,
        is_active: request.is_active,
    };

    application_state.channel_registry.upsert(notification_channel.clone());
    Ok((StatusCode::CREATED, Json(notification_channel)))
}

/// GET /channels/{id}
pub async fn handle_get_channel(
    State(application_state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<NotificationChannel>, ApiError> {
    application_state
        .channel_registry
        .get(&channel_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("channel '{channel_id}' not found")))
}

/// PUT /channels/{id}
pub async fn handle_update_channel(
    State(application_state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(request): Json<CreateChannelRequest>,
) -> Result<Json<NotificationChannel>, ApiError> {
    if application_state.channel_registry.get(&channel_id).is_none() {
        return Err(ApiError::not_found(format!("channel '{channel_id}' not found")));
    }

    let updated_channel = NotificationChannel {
        id: channel_id,
        channel_name: request.channel_name,
        channel_type: request.configuration.channel_type(),
        configuration: request.configuration,
        rate_limit_per_minute: request.rate_limit_per_minute,
        retry_attempts: request.retry_attempts,
        timeout_seconds: request.timeout_seconds,
        is_active: request.is_active,
    };

    application_state.channel_registry.upsert(updated_channel.clone());
    Ok(Json(updated_channel))
}

/// DELETE /channels/{id}
pub async fn handle_delete_channel(
    State(application_state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !application_state.channel_registry.remove(&channel_id) {
        return Err(ApiError::not_found(format!("channel '{channel_id}' not found")));
    }

    Ok(Json(serde_json::json!({
        "channel_id": channel_id,
        "status": "deleted",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// POST /channels/{id}/test — entrega de prueba a través de la política completa.
pub async fn handle_test_channel(
    State(application_state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let notification_channel = application_state
        .channel_registry
        .get(&channel_id)
        .ok_or_else(|| ApiError::not_found(format!("channel '{channel_id}' not found")))?;

    let test_message = AlertMessageData {
        alert_id: Uuid::new_v4().to_string(),
        rule_name: "Channel Delivery Test".to_string(),
        priority: AlertPriority::Low,
        person_id: "test-person".to_string(),
        camera_id: "test-camera".to_string(),
        confidence: 0.99,
        triggered_at: Utc::now().to_rfc3339(),
        subject: "FaceGuard channel delivery test".to_string(),
        body_override: Some("This is a FaceGuard channel delivery test.".to_string()),
        face_crop_jpeg: None,
    };

    let delivery_record = application_state
        .delivery_engine
        .deliver_to_channel(&notification_channel, &test_message)
        .await;

    Ok(Json(serde_json::json!({
        "channel_id": channel_id,
        "delivery": delivery_record,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
