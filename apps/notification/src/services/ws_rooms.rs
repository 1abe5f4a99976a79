// [apps/notification/src/services/ws_rooms.rs]
/*!
 * =================================================================
 * APARATO: WEBSOCKET ROOM MANAGER (V2.6 - BROADCAST MASTER)
 * CLASIFICACIÓN: REAL-TIME INFRASTRUCTURE (ESTRATO L4-APP)
 * RESPONSABILIDAD: SALAS DE DIFUSIÓN, REPLAY Y PODA DE ENLACES MUERTOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FOUR ROOMS DOCTRINE: alerts, notifications, system y dashboard;
 *    cada sala con su cola de replay acotada a 100 mensajes.
 * 2. REPLAY CONTRACT: Todo suscriptor nuevo recibe el historial
 *    marcado 'queued: true' ANTES de cualquier mensaje vivo.
 * 3. DEAD LINK PRUNING: Un envío fallido expulsa la conexión de la
 *    sala en la misma ráfaga de difusión.
 * =================================================================
 */

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Techo de mensajes retenidos por sala para el replay.
pub const REPLAY_QUEUE_CAPACITY: usize = 100;

/// Salas de difusión en tiempo real de la plataforma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Alerts,
    Notifications,
    System,
    Dashboard,
}

impl Room {
    pub const ALL: [Room; 4] = [Room::Alerts, Room::Notifications, Room::System, Room::Dashboard];

    pub fn from_name(room_name: &str) -> Option<Self> {
        match room_name {
            "alerts" => Some(Self::Alerts),
            "notifications" => Some(Self::Notifications),
            "system" => Some(Self::System),
            "dashboard" => Some(Self::Dashboard),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Alerts => "alerts",
            Self::Notifications => "notifications",
            Self::System => "system",
            Self::Dashboard => "dashboard",
        }
    }
}

struct RoomClient {
    client_id: String,
    outbound_sender: mpsc::UnboundedSender<String>,
}

/// Gestor de salas WebSocket con colas de replay por sala.
pub struct WebSocketRoomManager {
    room_clients: Mutex<HashMap<Room, Vec<RoomClient>>>,
    replay_queues: Mutex<HashMap<Room, VecDeque<serde_json::Value>>>,
}

impl WebSocketRoomManager {
    pub fn new() -> Self {
        let mut room_clients = HashMap::new();
        let mut replay_queues = HashMap::new();
        for room in Room::ALL {
            room_clients.insert(room, Vec::new());
            replay_queues.insert(room, VecDeque::new());
        }

        Self { room_clients: Mutex::new(room_clients), replay_queues: Mutex::new(replay_queues) }
    }

    /// Registra un cliente en la sala y entrega su receptor de mensajes.
    /// El historial (hasta 100 mensajes) viaja marcado 'queued: true'
    /// antes del mensaje de bienvenida y de cualquier difusión viva.
    pub fn register_client(&self, room: Room, client_id: &str) -> mpsc::UnboundedReceiver<String> {
        let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

        // 1. REPLAY: historial previo al alta en la sala.
        let replayed_count = {
            let replay_guard = self.replay_queues.lock().expect("replay lock poisoned");
            let queued_messages = replay_guard.get(&room).cloned().unwrap_or_default();
            let replay_total = queued_messages.len();

            for queued_message in queued_messages {
                let mut replay_envelope = queued_message;
                replay_envelope["queued"] = serde_json::json!(true);
                let _ = outbound_sender.send(replay_envelope.to_string());
            }
            replay_total
        };

        // 2. BIENVENIDA.
        let welcome_envelope = serde_json::json!({
            "type": "connection_established",
            "room": room.name(),
            "client_id": client_id,
            "queued_messages": replayed_count,
            "timestamp": Utc::now().to_rfc3339(),
        });
        let _ = outbound_sender.send(welcome_envelope.to_string());

        // 3. ALTA EN LA SALA.
        let mut clients_guard = self.room_clients.lock().expect("rooms lock poisoned");
        let room_roster = clients_guard.entry(room).or_default();
        room_roster.push(RoomClient { client_id: client_id.to_string(), outbound_sender });

        info!(
            "🔌 [WS_ROOMS]: Client {} joined room '{}' ({} connections, {} replayed).",
            client_id,
            room.name(),
            room_roster.len(),
            replayed_count
        );

        outbound_receiver
    }

    pub fn unregister_client(&self, room: Room, client_id: &str) {
        let mut clients_guard = self.room_clients.lock().expect("rooms lock poisoned");
        if let Some(room_roster) = clients_guard.get_mut(&room) {
            room_roster.retain(|client| client.client_id != client_id);
            debug!(
                "🔌 [WS_ROOMS]: Client {} left room '{}' ({} remaining).",
                client_id,
                room.name(),
                room_roster.len()
            );
        }
    }

    /// Difunde a toda la sala, sella el mensaje en el replay y poda
    /// los enlaces muertos. Devuelve el número de clientes alcanzados.
    pub fn broadcast_to_room(&self, room: Room, mut message: serde_json::Value) -> usize {
        if message.get("timestamp").is_none() {
            message["timestamp"] = serde_json::json!(Utc::now().to_rfc3339());
        }

        // 1. SELLADO EN LA COLA DE REPLAY (capada a 100).
        {
            let mut replay_guard = self.replay_queues.lock().expect("replay lock poisoned");
            let room_queue = replay_guard.entry(room).or_default();
            let mut queued_copy = message.clone();
            queued_copy["queued_at"] = serde_json::json!(Utc::now().to_rfc3339());
            room_queue.push_back(queued_copy);
            while room_queue.len() > REPLAY_QUEUE_CAPACITY {
                room_queue.pop_front();
            }
        }

        // 2. DIFUSIÓN VIVA CON PODA DE ENLACES MUERTOS.
        let serialized_message = message.to_string();
        let mut clients_guard = self.room_clients.lock().expect("rooms lock poisoned");
        let room_roster = clients_guard.entry(room).or_default();

        let roster_before = room_roster.len();
        room_roster.retain(|client| client.outbound_sender.send(serialized_message.clone()).is_ok());
        let pruned_count = roster_before - room_roster.len();

        if pruned_count > 0 {
            warn!("🧹 [WS_ROOMS]: Pruned {} dead links from room '{}'.", pruned_count, room.name());
        }

        room_roster.len()
    }

    pub fn replay_depth(&self, room: Room) -> usize {
        self.replay_queues
            .lock()
            .expect("replay lock poisoned")
            .get(&room)
            .map(|queue| queue.len())
            .unwrap_or(0)
    }

    pub fn connection_count(&self, room: Room) -> usize {
        self.room_clients
            .lock()
            .expect("rooms lock poisoned")
            .get(&room)
            .map(|roster| roster.len())
            .unwrap_or(0)
    }

    /// Estado global para la superficie /ws/status.
    pub fn status(&self) -> serde_json::Value {
        let clients_guard = self.room_clients.lock().expect("rooms lock poisoned");
        let replay_guard = self.replay_queues.lock().expect("replay lock poisoned");

        let connections_by_room: HashMap<&'static str, usize> = Room::ALL
            .iter()
            .map(|room| (room.name(), clients_guard.get(room).map(|r| r.len()).unwrap_or(0)))
            .collect();
        let queued_by_room: HashMap<&'static str, usize> = Room::ALL
            .iter()
            .map(|room| (room.name(), replay_guard.get(room).map(|q| q.len()).unwrap_or(0)))
            .collect();

        serde_json::json!({
            "active_rooms": Room::ALL.iter().map(|r| r.name()).collect::<Vec<_>>(),
            "total_connections": connections_by_room.values().sum::<usize>(),
            "connections_by_room": connections_by_room,
            "queued_messages": queued_by_room,
            "manager_status": "healthy",
        })
    }
}

impl Default for WebSocketRoomManager {
    fn default() -> Self {
        Self::new()
    }
}
