// INICIO DEL ARCHIVO [apps/camera-stream/src/routes.rs]
/*!
 * =================================================================
 * APARATO: CAMERA STREAM ROUTING MATRIX (V2.2 - GATEWAY)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3-APP)
 * RESPONSABILIDAD: TOPOLOGÍA DE RED DEL SERVICIO DE CÁMARAS
 * =================================================================
 */

use crate::handlers::{cameras, health};
use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_camera_stream_router(application_shared_state: AppState) -> Router {
    // Escudo de Red: CORS para el Dashboard y herramientas de Ops.
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // ESTRATO TÁCTICO: control de cámaras y streams.
    let camera_control_stratum = Router::new()
        .route("/", get(cameras::handle_list_cameras).post(cameras::handle_add_camera))
        .route("/streams/control", post(cameras::handle_stream_control))
        .route("/stats/summary", get(cameras::handle_stats_summary))
        .route(
            "/:camera_id",
            get(cameras::handle_get_camera)
                .put(cameras::handle_update_camera)
                .delete(cameras::handle_delete_camera),
        )
        .route("/:camera_id/connect", post(cameras::handle_connect_camera))
        .route("/:camera_id/disconnect", post(cameras::handle_disconnect_camera))
        .route("/:camera_id/recognize", post(cameras::handle_one_shot_recognition));

    // ESTRATO DE OBSERVABILIDAD: salud y sondas.
    let health_stratum = Router::new()
        .route("/", get(health::handle_aggregate_health))
        .route("/live", get(health::handle_liveness_probe))
        .route("/ready", get(health::handle_readiness_probe))
        .route("/cameras/:camera_id/health", get(health::handle_camera_health));

    Router::new()
        .nest("/api/cameras", camera_control_stratum)
        .nest("/api/health", health_stratum)
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
// FIN DEL ARCHIVO [apps/camera-stream/src/routes.rs]
