// [apps/notification/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION STATE HUB (V2.3 - COMPOSITION ROOT)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REGISTROS, MOTOR Y EVALUADOR
 * =================================================================
 */

use std::sync::Arc;

use chrono::{DateTime, Utc};
use faceguard_infra_data_client::CoreDataClient;
use tracing::debug;

use crate::config::Settings;
use crate::services::{
    AlertEvaluator, AlertLedger, ChannelRegistry, CooldownLedger, DeliveryEngine,
    EscalationSentinel, RuleRegistry, WebSocketRoomManager,
};

/// Contenedor de estado compartido del servicio de notificaciones.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub rule_registry: Arc<RuleRegistry>,
    pub channel_registry: Arc<ChannelRegistry>,
    pub alert_ledger: Arc<AlertLedger>,
    pub cooldown_ledger: Arc<CooldownLedger>,
    pub delivery_engine: Arc<DeliveryEngine>,
    pub alert_evaluator: Arc<AlertEvaluator>,
    pub escalation_sentinel: Arc<EscalationSentinel>,
    pub room_manager: Arc<WebSocketRoomManager>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Forja el estado maestro del servicio de notificaciones.
    pub fn ignite(settings: Settings) -> anyhow::Result<Self> {
        debug!("🧬 [APP_STATE]: Executing ignition sequence for notification service...");

        let settings = Arc::new(settings);

        let rule_registry = Arc::new(RuleRegistry::new());
        let channel_registry = Arc::new(ChannelRegistry::new());
        let alert_ledger = Arc::new(AlertLedger::new());
        let cooldown_ledger = Arc::new(CooldownLedger::new());
        let room_manager = Arc::new(WebSocketRoomManager::new());

        let core_data_client = Arc::new(CoreDataClient::new(&settings.core_data_service_url)?);

        let delivery_engine =
            DeliveryEngine::new(settings.clone(), room_manager.clone(), core_data_client.clone());

        let alert_evaluator = AlertEvaluator::ignite(
            settings.evaluation_queue_capacity,
            rule_registry.clone(),
            channel_registry.clone(),
            alert_ledger.clone(),
            cooldown_ledger.clone(),
            delivery_engine.clone(),
            room_manager.clone(),
            core_data_client,
        );

        let escalation_sentinel = EscalationSentinel::new(
            alert_ledger.clone(),
            rule_registry.clone(),
            channel_registry.clone(),
            delivery_engine.clone(),
            room_manager.clone(),
        );

        Ok(Self {
            settings,
            rule_registry,
            channel_registry,
            alert_ledger,
            cooldown_ledger,
            delivery_engine,
            alert_evaluator,
            escalation_sentinel,
            room_manager,
            started_at: Utc::now(),
        })
    }
}
