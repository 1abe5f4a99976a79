// [apps/camera-stream/src/handlers/cameras.rs]
/*!
 * =================================================================
 * APARATO: CAMERA CONTROL HANDLERS (V2.5 - TACTICAL SURFACE)
 * CLASIFICACIÓN: API HANDLER (ESTRATO L4-APP)
 * RESPONSABILIDAD: CRUD DE CÁMARAS, CONTROL DE STREAMS Y ONE-SHOT
 * =================================================================
 */

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use faceguard_core_vector_index::hash_frame_perceptual;
use serde::Deserialize;
use tracing::info;

use crate::handlers::ApiError;
use crate::services::frame_source::encode_frame_jpeg;
use crate::services::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddCameraRequest {
    pub source: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCameraRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub frame_rate: Option<u32>,
}

#[derive(Deserialize)]
pub struct StreamControlRequest {
    pub action: String,
    #[serde(default)]
    pub camera_ids: Option<Vec<String>>,
}

/// GET /api/cameras/ — tabla completa de cámaras con estado.
pub async fn handle_list_cameras(State(application_state): State<AppState>) -> Json<serde_json::Value> {
    let camera_table = application_state.camera_manager.all_cameras_info().await;
    Json(serde_json::json!({
        "cameras": camera_table,
        "total": camera_table.len(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// POST /api/cameras/ — alta de cámara en caliente.
pub async fn handle_add_camera(
    State(application_state): State<AppState>,
    Json(request): Json<AddCameraRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.source.trim().is_empty() {
        return Err(ApiError::validation("camera source must not be empty"));
    }
    if request.name.trim().is_empty() {
        return Err(ApiError::validation("camera name must not be empty"));
    }

    let camera_id = application_state
        .camera_manager
        .add_camera(&request.source, &request.name, request.location)
        .await
        .map_err(ApiError::validation)?;

    info!("➕ [CAMERA_API]: Camera {} registered via API.", camera_id);

    Ok(Json(serde_json::json!({
        "camera_id": camera_id,
        "status": "registered",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// GET /api/cameras/{id}
pub async fn handle_get_camera(
    State(application_state): State<AppState>,
    Path(camera_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let camera_info = application_state
        .camera_manager
        .camera_info(&camera_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("camera '{camera_id}' not found")))?;

    Ok(Json(serde_json::to_value(camera_info).unwrap_or_default()))
}

/// PUT /api/cameras/{id}
pub async fn handle_update_camera(
    State(application_state): State<AppState>,
    Path(camera_id): Path<String>,
    Json(request): Json<UpdateCameraRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(frame_rate) = request.frame_rate {
        if !(1..=30).contains(&frame_rate) {
            return Err(ApiError::validation("frame_rate must be within 1..=30"));
        }
    }

    let updated = application_state
        .camera_manager
        .update_camera(&camera_id, request.name, request.location, request.enabled, request.frame_rate)
        .await;

    if !updated {
        return Err(ApiError::not_found(format!("camera '{camera_id}' not found")));
    }

    Ok(Json(serde_json::json!({
        "camera_id": camera_id,
        "status": "updated",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// DELETE /api/cameras/{id}
pub async fn handle_delete_camera(
    State(application_state): State<AppState>,
    Path(camera_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !application_state.camera_manager.remove_camera(&camera_id).await {
        return Err(ApiError::not_found(format!("camera '{camera_id}' not found")));
    }

    Ok(Json(serde_json::json!({
        "camera_id": camera_id,
        "status": "removed",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// POST /api/cameras/{id}/connect
pub async fn handle_connect_camera(
    State(application_state): State<AppState>,
    Path(camera_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    application_state
        .camera_manager
        .connect_camera(&camera_id)
        .await
        .map_err(|connect_fault| {
            if connect_fault.contains("not found") {
                ApiError::not_found(connect_fault)
            } else {
                ApiError::infrastructure(connect_fault)
            }
        })?;

    Ok(Json(serde_json::json!({
        "camera_id": camera_id,
        "status": "connected",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// POST /api/cameras/{id}/disconnect
pub async fn handle_disconnect_camera(
    State(application_state): State<AppState>,
    Path(camera_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    application_state
        .camera_manager
        .disconnect_camera(&camera_id)
        .await
        .map_err(ApiError::not_found)?;

    Ok(Json(serde_json::json!({
        "camera_id": camera_id,
        "status": "disconnected",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// POST /api/cameras/streams/control — {action: start|stop|pause|resume}.
pub async fn handle_stream_control(
    State(application_state): State<AppState>,
    Json(request): Json<StreamControlRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target_camera_ids: Vec<String> = match &request.camera_ids {
        Some(explicit_ids) if !explicit_ids.is_empty() => explicit_ids.clone(),
        _ => application_state
            .camera_manager
            .all_cameras_info()
            .await
            .into_iter()
            .map(|info| info.camera_id)
            .collect(),
    };

    let mut affected: Vec<String> = Vec::new();
    let mut rejected: Vec<serde_json::Value> = Vec::new();

    for camera_id in &target_camera_ids {
        let outcome: Result<(), String> = match request.action.as_str() {
            "start" => application_state.camera_manager.start_stream(camera_id).await,
            "stop" => {
                application_state.camera_manager.stop_stream(camera_id).await;
                Ok(())
            }
            "pause" => {
                if application_state.camera_manager.pause_stream(camera_id).await {
                    Ok(())
                } else {
                    Err(format!("stream '{camera_id}' is not running"))
                }
            }
            "resume" => {
                if application_state.camera_manager.resume_stream(camera_id).await {
                    Ok(())
                } else {
                    Err(format!("stream '{camera_id}' is not running"))
                }
            }
            unknown_action => {
                return Err(ApiError::validation(format!(
                    "unknown action '{unknown_action}' (expected start|stop|pause|resume)"
                )));
            }
        };

        match outcome {
            Ok(()) => affected.push(camera_id.clone()),
            Err(rejection_reason) => rejected.push(serde_json::json!({
                "camera_id": camera_id,
                "reason": rejection_reason,
            })),
        }
    }

    Ok(Json(serde_json::json!({
        "action": request.action,
        "affected": affected,
        "rejected": rejected,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// POST /api/cameras/{id}/recognize — reconocimiento one-shot.
pub async fn handle_one_shot_recognition(
    State(application_state): State<AppState>,
    Path(camera_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(recognition_uplink) = &application_state.recognition_uplink else {
        return Err(ApiError::infrastructure("recognition engine is not configured"));
    };

    let (frame, metadata) = application_state
        .camera_manager
        .capture_single_frame(&camera_id)
        .await
        .map_err(|capture_fault| {
            if capture_fault.contains("not found") {
                ApiError::not_found(capture_fault)
            } else {
                ApiError::infrastructure(capture_fault)
            }
        })?;

    let jpeg_bytes = encode_frame_jpeg(&frame, 85)
        .map_err(|encode_fault| ApiError::infrastructure(encode_fault.to_string()))?;
    let perceptual_hash = hash_frame_perceptual(&frame.pixels, frame.width, frame.height);

    let recognition_result = recognition_uplink
        .process_encoded_frame(jpeg_bytes, perceptual_hash, &metadata, DEFAULT_CONFIDENCE_THRESHOLD)
        .await;

    Ok(Json(serde_json::to_value(recognition_result).unwrap_or_default()))
}

/// GET /api/cameras/stats/summary
pub async fn handle_stats_summary(State(application_state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "cameras": application_state.camera_manager.health_summary().await,
        "sighting_capture": application_state.sighting_capture.capture_statistics(),
        "event_publisher": application_state.event_publisher.performance_statistics(),
        "recognition": application_state
            .recognition_uplink
            .as_ref()
            .map(|uplink| uplink.performance_statistics()),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
