// [apps/notification/src/handlers/ws.rs]
/*!
 * =================================================================
 * APARATO: REAL-TIME ROOM SOCKETS (V2.7 - FULL DUPLEX)
 * CLASIFICACIÓN: API HANDLER (ESTRATO L4-APP)
 * RESPONSABILIDAD: ENLACES WS POR SALA CON REPLAY Y PING-PONG
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TRIPLE STREAM: tarea descendente (replay + difusión + keepalive),
 *    tarea ascendente (ping / acuses) y canal de respuesta interna;
 *    el primer colapso aborta a los demás de forma determinista.
 * 2. REPLAY FIRST: El gestor de salas entrega el historial 'queued'
 *    antes de habilitar la difusión viva.
 * =================================================================
 */

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::handlers::ApiError;
use crate::services::Room;
use crate::state::AppState;

/// Latido keep-alive para proxies de capa 7.
const KEEPALIVE_INTERVAL_SECONDS: u64 = 25;

pub async fn establish_alerts_link(
    websocket_upgrade: WebSocketUpgrade,
    State(application_state): State<AppState>,
) -> impl IntoResponse {
    websocket_upgrade.on_upgrade(move |socket| handle_room_link(socket, application_state, Room::Alerts))
}

pub async fn establish_notifications_link(
    websocket_upgrade: WebSocketUpgrade,
    State(application_state): State<AppState>,
) -> impl IntoResponse {
    websocket_upgrade
        .on_upgrade(move |socket| handle_room_link(socket, application_state, Room::Notifications))
}

pub async fn establish_system_link(
    websocket_upgrade: WebSocketUpgrade,
    State(application_state): State<AppState>,
) -> impl IntoResponse {
    websocket_upgrade.on_upgrade(move |socket| handle_room_link(socket, application_state, Room::System))
}

pub async fn establish_dashboard_link(
    websocket_upgrade: WebSocketUpgrade,
    State(application_state): State<AppState>,
) -> impl IntoResponse {
    websocket_upgrade
        .on_upgrade(move |socket| handle_room_link(socket, application_state, Room::Dashboard))
}

/// Orquestador de la sesión WebSocket de una sala.
async fn handle_room_link(socket: WebSocket, application_state: AppState, room: Room) {
    let client_identifier = Uuid::new_v4().to_string();
    info!("⚡ [WS_LINK]: Session {} joining room '{}'.", client_identifier, room.name());

    // El alta entrega primero el replay, luego la difusión viva.
    let mut room_outbound_receiver =
        application_state.room_manager.register_client(room, &client_identifier);

    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (reply_transmission_sender, mut reply_reception_receiver) =
        mpsc::unbounded_channel::<String>();

    // --- TAREA 1: DOWNSTREAM (replay + difusión + respuestas + keepalive) ---
    let mut downstream_task = tokio::spawn(async move {
        let mut keepalive_timer = interval(Duration::from_secs(KEEPALIVE_INTERVAL_SECONDS));

        loop {
            tokio::select! {
                _ = keepalive_timer.tick() => {
                    if socket_sender.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                },
                room_message = room_outbound_receiver.recv() => {
                    match room_message {
                        Some(serialized_message) => {
                            if socket_sender.send(Message::Text(serialized_message)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                },
                reply_message = reply_reception_receiver.recv() => {
                    match reply_message {
                        Some(serialized_reply) => {
                            if socket_sender.send(Message::Text(serialized_reply)).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                },
            }
        }
    });

    // --- TAREA 2: UPSTREAM (ping, acuses y consultas de estado) ---
    let state_for_upstream = application_state.clone();
    let client_id_upstream = client_identifier.clone();
    let mut upstream_task = tokio::spawn(async move {
        while let Some(network_read_result) = socket_receiver.next().await {
            match network_read_result {
                Ok(Message::Text(raw_client_message)) => {
                    let Ok(client_message) =
                        serde_json::from_str::<serde_json::Value>(&raw_client_message)
                    else {
                        continue;
                    };

                    match client_message["type"].as_str() {
                        Some("ping") => {
                            let pong_envelope = serde_json::json!({
                                "type": "pong",
                                "timestamp": Utc::now().to_rfc3339(),
                            });
                            let _ = reply_transmission_sender.send(pong_envelope.to_string());
                        }
                        Some("acknowledge_alert") => {
                            if let Some(alert_id) = client_message["alert_id"].as_str() {
                                match state_for_upstream
                                    .alert_evaluator
                                    .acknowledge_alert(alert_id, &client_id_upstream)
                                {
                                    Ok(_) => debug!("✅ [WS_LINK]: Alert {} acknowledged via socket.", alert_id),
                                    Err(transition_fault) => {
                                        warn!("⚠️ [WS_LINK]: Socket acknowledge rejected: {}", transition_fault)
                                    }
                                }
                            }
                        }
                        Some("get_status") => {
                            let status_envelope = serde_json::json!({
                                "type": "system_status",
                                "data": state_for_upstream.room_manager.status(),
                                "timestamp": Utc::now().to_rfc3339(),
                            });
                            let _ = reply_transmission_sender.send(status_envelope.to_string());
                        }
                        _ => {}
                    }
                }
                Ok(Message::Close(_)) => break,
                Err(physical_layer_fault) => {
                    debug!("🔌 [WS_LINK]: Network fault on session {}: {}", client_id_upstream, physical_layer_fault);
                    break;
                }
                _ => {}
            }
        }
    });

    // --- COLAPSO CONTROLADO: el primero en terminar aborta al otro ---
    tokio::select! {
        _ = (&mut downstream_task) => upstream_task.abort(),
        _ = (&mut upstream_task) => downstream_task.abort(),
    };

    application_state.room_manager.unregister_client(room, &client_identifier);
    info!("💀 [WS_LINK]: Session {} released from room '{}'.", client_identifier, room.name());
}

/// GET /ws/status — estado del gestor de salas.
pub async fn handle_ws_status(State(application_state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "operational",
        "websocket_manager": application_state.room_manager.status(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// POST /ws/broadcast/{room} — difusión administrativa a una sala.
pub async fn handle_admin_broadcast(
    State(application_state): State<AppState>,
    Path(room_name): Path<String>,
    Json(broadcast_payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target_room = Room::from_name(&room_name).ok_or_else(|| {
        ApiError::not_found(format!(
            "room '{room_name}' does not exist (expected alerts|notifications|system|dashboard)"
        ))
    })?;

    let reached_connections = application_state.room_manager.broadcast_to_room(
        target_room,
        serde_json::json!({
            "type": "admin_broadcast",
            "data": broadcast_payload,
        }),
    );

    Ok(Json(serde_json::json!({
        "status": "success",
        "room": target_room.name(),
        "connections_notified": reached_connections,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
