// [apps/notification/src/services/escalation.rs]
/*!
 * =================================================================
 * APARATO: ESCALATION SENTINEL (V2.6 - UNATTENDED ALERT GUARD)
 * CLASIFICACIÓN: BACKGROUND SERVICE (ESTRATO L4-APP)
 * RESPONSABILIDAD: ESCALAMIENTO Y AUTO-RESOLUCIÓN PERIÓDICOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ESCALATION SWEEP: Instancia activa con triggered_at +
 *    escalation_minutes vencido y sin acuse ni resolución transiciona
 *    a 'escalated' y emite la notificación elevada con el rastro
 *    'escalated_from' de la prioridad original.
 * 2. AUTO-RESOLVE: auto_resolve_minutes vencido resuelve la instancia
 *    con autoría 'system'.
 * 3. INJECTABLE SWEEP: sweep_at(now) permite certificación sin reloj.
 * =================================================================
 */

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use faceguard_domain_models::AlertPriority;
use tracing::{info, warn};

use crate::services::delivery_engine::{AlertMessageData, DeliveryEngine};
use crate::services::registry::{AlertLedger, ChannelRegistry, RuleRegistry};
use crate::services::ws_rooms::{Room, WebSocketRoomManager};

/// Centinela de alertas desatendidas.
pub struct EscalationSentinel {
    ledger: Arc<AlertLedger>,
    rule_registry: Arc<RuleRegistry>,
    channel_registry: Arc<ChannelRegistry>,
    delivery_engine: Arc<DeliveryEngine>,
    room_manager: Arc<WebSocketRoomManager>,
}

impl EscalationSentinel {
    pub fn new(
        ledger: Arc<AlertLedger>,
        rule_registry: Arc<RuleRegistry>,
        channel_registry: Arc<ChannelRegistry>,
        delivery_engine: Arc<DeliveryEngine>,
        room_manager: Arc<WebSocketRoomManager>,
    ) -> Arc<Self> {
        Arc::new(Self { ledger, rule_registry, channel_registry, delivery_engine, room_manager })
    }

    /// Enciende el barrido perpetuo con el intervalo configurado.
    pub fn spawn_sentinel(self: &Arc<Self>, scan_interval_seconds: u64) {
        let sentinel = self.clone();
        tokio::spawn(async move {
            info!("⏱️  [ESCALATION_SENTINEL]: Sweep daemon online (every {}s).", scan_interval_seconds);
            let mut interval_timer =
                tokio::time::interval(Duration::from_secs(scan_interval_seconds.max(1)));
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval_timer.tick().await;
                sentinel.sweep_at(Utc::now()).await;
            }
        });
    }

    /// Un barrido completo sobre las instancias activas del espejo.
    /// Devuelve (escaladas, auto-resueltas).
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> (usize, usize) {
        let mut escalated_count = 0usize;
        let mut auto_resolved_count = 0usize;

        for active_alert in self.ledger.active_alerts() {
            let Some(rule) = self.rule_registry.get(&active_alert.rule_id) else { continue };

            // 1. ESCALAMIENTO: ventana vencida sin acuse ni resolución.
            if let Some(escalation_minutes) = rule.escalation_minutes {
                let escalation_deadline =
                    active_alert.triggered_at + chrono::Duration::minutes(i64::from(escalation_minutes));

                if escalation_deadline <= now {
                    let elevated_priority = elevate_priority(active_alert.priority);

                    match self.ledger.escalate(&active_alert.id, elevated_priority, now) {
                        Ok(escalated_instance) => {
                            escalated_count += 1;
                            warn!(
                                "📈 [ESCALATION_SENTINEL]: Alert {} escalated ({:?} -> {:?}).",
                                escalated_instance.id,
                                escalated_instance.escalated_from,
                                escalated_instance.priority
                            );

                            self.room_manager.broadcast_to_room(
                                Room::Alerts,
                                serde_json::json!({
                                    "type": "alert_escalated",
                                    "alert_id": escalated_instance.id,
                                    "escalated_from": escalated_instance.escalated_from,
                                    "priority": escalated_instance.priority,
                                }),
                            );

                            // Notificación elevada por los canales de la regla.
                            let escalation_channels =
                                self.channel_registry.resolve_active(&rule.notification_channel_ids);
                            if !escalation_channels.is_empty() {
                                let mut escalation_message =
                                    AlertMessageData::from_alert(&escalated_instance);
                                escalation_message.subject = format!(
                                    "📈 ESCALATED: {} (was {})",
                                    escalated_instance.rule_name,
                                    escalated_instance
                                        .escalated_from
                                        .map(|p| p.as_str())
                                        .unwrap_or("unknown")
                                );

                                let delivery_summary = self
                                    .delivery_engine
                                    .deliver_alert(&escalation_channels, &escalation_message)
                                    .await;
                                let delivered_count = delivery_summary["successful_deliveries"]
                                    .as_u64()
                                    .unwrap_or(0)
                                    as u32;
                                self.ledger
                                    .register_notification(&escalated_instance.id, delivered_count);
                            }
                        }
                        Err(transition_fault) => {
                            // Carrera benigna: la instancia mutó entre el scan y la transición.
                            tracing::debug!(
                                "⚠️ [ESCALATION_SENTINEL]: Escalation rejected: {}",
                                transition_fault
                            );
                        }
                    }
                    continue;
                }
            }

            // 2. AUTO-RESOLUCIÓN: ventana de cierre automático vencida.
            if let Some(auto_resolve_minutes) = rule.auto_resolve_minutes {
                let resolution_deadline = active_alert.triggered_at
                    + chrono::Duration::minutes(i64::from(auto_resolve_minutes));

                if resolution_deadline <= now
                    && self.ledger.resolve(&active_alert.id, "system", now).is_ok()
                {
                    auto_resolved_count += 1;
                    info!("🧹 [ESCALATION_SENTINEL]: Alert {} auto-resolved.", active_alert.id);

                    self.room_manager.broadcast_to_room(
                        Room::Alerts,
                        serde_json::json!({
                            "type": "alert_resolved",
                            "alert_id": active_alert.id,
                            "resolved_by": "system",
                        }),
                    );
                }
            }
        }

        (escalated_count, auto_resolved_count)
    }
}

/// Eleva un nivel la prioridad de una alerta desatendida.
fn elevate_priority(original_priority: AlertPriority) -> AlertPriority {
    match original_priority {
        AlertPriority::Low => AlertPriority::Medium,
        AlertPriority::Medium => AlertPriority::High,
        AlertPriority::High | AlertPriority::Critical => AlertPriority::Critical,
    }
}
