// [apps/notification/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION SERVICES ROOT (V2.0)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L2/L4-APP)
 * RESPONSABILIDAD: EXPOSICIÓN DE LOS MOTORES DE ALERTA Y ENTREGA
 * =================================================================
 */

/// Evaluador de dos niveles con cola de fondo.
pub mod alert_evaluator;
/// Ventana deslizante y cortacircuitos por canal.
pub mod channel_guard;
/// Adaptadores físicos por protocolo (email, SMS, webhook).
pub mod channels;
/// Motor de entrega multicanal con política de resiliencia.
pub mod delivery_engine;
/// Centinela de escalamiento y auto-resolución.
pub mod escalation;
/// Espejos calientes de reglas, canales e instancias.
pub mod registry;
/// Emparejamiento declarativo y ledger de enfriamiento.
pub mod rule_engine;
/// Salas WebSocket con colas de replay.
pub mod ws_rooms;

pub use alert_evaluator::{AlertEvaluator, EvaluationResult, SightingAlertRequest};
pub use delivery_engine::{AlertMessageData, DeliveryEngine};
pub use escalation::EscalationSentinel;
pub use registry::{AlertHistoryFilter, AlertLedger, ChannelRegistry, RuleRegistry};
pub use rule_engine::CooldownLedger;
pub use ws_rooms::{Room, WebSocketRoomManager};
