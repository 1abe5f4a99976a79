// [apps/camera-stream/src/handlers/health.rs]
/*!
 * =================================================================
 * APARATO: HEALTH SURFACE HANDLERS (V2.3 - PANOPTIC PROBES)
 * CLASIFICACIÓN: API HANDLER (ESTRATO L4-APP)
 * RESPONSABILIDAD: SALUD AGREGADA Y SONDAS DE ORQUESTACIÓN
 *
 * # Contrato de salud:
 * healthy | degraded | unhealthy según cámaras conectadas y tasa de
 * error (> 10% degrada). Las cámaras individuales nunca ocultan su
 * last_error.
 * =================================================================
 */

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::config::{SERVICE_NAME, SERVICE_VERSION};
use crate::handlers::ApiError;
use crate::state::AppState;

/// GET /api/health/ — salud agregada con métricas por componente.
pub async fn handle_aggregate_health(
    State(application_state): State<AppState>,
) -> Json<serde_json::Value> {
    let camera_summary = application_state.camera_manager.health_summary().await;
    let camera_table = application_state.camera_manager.all_cameras_info().await;

    let recognition_component = match &application_state.recognition_uplink {
        Some(uplink) => {
            let engine_visible = uplink.probe_engine_connectivity().await;
            serde_json::json!({
                "status": if engine_visible { "healthy" } else { "unhealthy" },
                "connectivity": engine_visible,
                "performance": uplink.performance_statistics(),
            })
        }
        None => serde_json::json!({ "status": "disabled" }),
    };

    Json(serde_json::json!({
        "status": camera_summary["status"],
        "service": {
            "name": SERVICE_NAME,
            "version": SERVICE_VERSION,
            "started_at": application_state.started_at.to_rfc3339(),
        },
        "components": {
            "camera_manager": camera_summary,
            "recognition_integration": recognition_component,
            "event_publisher": application_state.event_publisher.performance_statistics(),
            "sighting_capture": application_state.sighting_capture.capture_statistics(),
            "recognition_caches": application_state.cache_registry.comprehensive_statistics(),
            "vector_index": {
                "total_vectors": application_state.vector_index.total_vectors(),
                "unique_persons": application_state.vector_index.unique_persons(),
            },
        },
        "cameras": camera_table,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /api/health/live — sonda de vida para el orquestador de despliegue.
pub async fn handle_liveness_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /api/health/ready — sonda de disponibilidad operativa.
pub async fn handle_readiness_probe(
    State(application_state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let camera_count = application_state.camera_manager.all_cameras_info().await.len();

    if camera_count == 0 {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "reason": "no cameras registered",
                "timestamp": Utc::now().to_rfc3339(),
            })),
        ));
    }

    Ok(Json(serde_json::json!({
        "status": "ready",
        "cameras_registered": camera_count,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// GET /api/health/cameras/{id}/health — detalle individual.
pub async fn handle_camera_health(
    State(application_state): State<AppState>,
    Path(camera_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let camera_info = application_state
        .camera_manager
        .camera_info(&camera_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("camera '{camera_id}' not found")))?;

    let stream_running = application_state.camera_manager.is_stream_running(&camera_id).await;

    Ok(Json(serde_json::json!({
        "camera": camera_info,
        "stream_running": stream_running,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
