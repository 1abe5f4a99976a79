// INICIO DEL ARCHIVO [apps/notification/src/routes.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION ROUTING MATRIX (V2.3 - GATEWAY)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3-APP)
 * RESPONSABILIDAD: TOPOLOGÍA DE RED DEL SERVICIO DE ALERTAS
 * =================================================================
 */

use crate::handlers::{alerts, channels, delivery, evaluation, webhook, ws};
use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_notification_router(application_shared_state: AppState) -> Router {
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // ESTRATO DECLARATIVO: reglas de alerta e historial.
    let alerts_stratum = Router::new()
        .route("/rules", get(alerts::handle_list_rules).post(alerts::handle_create_rule))
        .route(
            "/rules/:rule_id",
            get(alerts::handle_get_rule)
                .put(alerts::handle_update_rule)
                .delete(alerts::handle_delete_rule),
        )
        .route("/history", get(alerts::handle_alert_history))
        .route("/acknowledge/:alert_id", post(alerts::handle_acknowledge_alert));

    // ESTRATO DE ENTREGA: canales, envío directo y logs.
    let channels_stratum = Router::new()
        .route("/", get(channels::handle_list_channels).post(channels::handle_create_channel))
        .route(
            "/:channel_id",
            get(channels::handle_get_channel)
                .put(channels::handle_update_channel)
                .delete(channels::handle_delete_channel),
        )
        .route("/:channel_id/test", post(channels::handle_test_channel));

    let delivery_stratum = Router::new()
        .route("/send", post(delivery::handle_direct_send))
        .route("/logs", get(delivery::handle_delivery_logs))
        .route("/:delivery_id/status", get(delivery::handle_delivery_status));

    // ESTRATO DEL PIPELINE: entrada avistamiento -> alerta.
    let evaluation_stratum = Router::new()
        .route("/evaluate-sighting", post(evaluation::handle_evaluate_sighting))
        .route("/statistics", get(evaluation::handle_evaluation_statistics));

    // ESTRATO EN TIEMPO REAL: salas WebSocket.
    let websocket_stratum = Router::new()
        .route("/alerts", get(ws::establish_alerts_link))
        .route("/notifications", get(ws::establish_notifications_link))
        .route("/system", get(ws::establish_system_link))
        .route("/dashboard", get(ws::establish_dashboard_link))
        .route("/status", get(ws::handle_ws_status))
        .route("/broadcast/:room", post(ws::handle_admin_broadcast));

    Router::new()
        .route("/health", get(|| async {
            axum::Json(serde_json::json!({
                "status": "healthy",
                "service": crate::config::SERVICE_NAME,
                "timestamp": Utc::now().to_rfc3339(),
            }))
        }))
        .nest("/alerts", alerts_stratum)
        .nest("/channels", channels_stratum)
        .nest("/delivery", delivery_stratum)
        .nest("/alert-evaluation", evaluation_stratum)
        .route("/webhook/recognition/sighting", post(webhook::handle_sighting_ingest))
        .nest("/ws", websocket_stratum)
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
// FIN DEL ARCHIVO [apps/notification/src/routes.rs]
