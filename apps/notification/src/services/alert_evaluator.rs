// [apps/notification/src/services/alert_evaluator.rs]
/*!
 * =================================================================
 * APARATO: TWO-TIER ALERT EVALUATOR (V3.5 - BUSINESS RULES MASTER)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4-APP)
 * RESPONSABILIDAD: EVALUACIÓN EN SEGUNDO PLANO Y FAN-OUT DE ALERTAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TEN MILLISECOND CONTRACT: evaluate() encola y responde 'queued'
 *    de inmediato; toda la lógica corre en el trabajador de fondo.
 * 2. TWO-TIER DOCTRINE: Regla 1 (básica) -> dashboard para toda
 *    persona reconocida; Regla 2 (alta prioridad) -> fan-out por
 *    contacto con retardos de escalamiento y plantillas propias.
 * 3. GRACEFUL DEGRADATION: Si el API de prioridad colapsa, la persona
 *    se trata como no-prioritaria y solo se emite la alerta básica,
 *    dejando el rastro de degradación.
 * =================================================================
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Timelike, Utc};
use faceguard_domain_models::{
    AlertInstance, AlertPriority, AlertStatus, PersonContactLink, PersonPriorityProfile,
};
use faceguard_infra_data_client::CoreDataClient;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::services::delivery_engine::{AlertMessageData, DeliveryEngine};
use crate::services::registry::{AlertLedger, ChannelRegistry, RuleRegistry};
use crate::services::rule_engine::{rule_matches, CooldownLedger, SightingContext};
use crate::services::ws_rooms::{Room, WebSocketRoomManager};

/// Identificador de la regla de negocio básica.
pub const BASIC_RULE_ID: &str = "basic_detection";
/// Identificador de la regla de negocio de alta prioridad.
pub const HIGH_PRIORITY_RULE_ID: &str = "high_priority_detection";

/// Avistamiento entrante al pipeline de alertas.
#[derive(Debug, Clone, Deserialize)]
pub struct SightingAlertRequest {
    pub person_id: String,
    pub camera_id: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub face_bbox: Vec<f32>,
    pub timestamp: String,
    #[serde(default)]
    pub sighting_id: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Acuse inmediato del pipeline: la evaluación ocurre en segundo plano.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub sighting_id: String,
    pub alerts_triggered: u32,
    pub processing_time_ms: f64,
    pub rules_evaluated: u32,
    pub status: String,
}

/// Contadores del motor de evaluación.
#[derive(Default)]
pub struct EvaluationStatistics {
    pub sightings_processed: AtomicU64,
    pub rules_evaluated: AtomicU64,
    pub alerts_triggered: AtomicU64,
    pub basic_alerts: AtomicU64,
    pub high_priority_alerts: AtomicU64,
    pub degraded_priority_checks: AtomicU64,
    pub evaluation_errors: AtomicU64,
}

/// Evaluador de dos niveles con cola de fondo no bloqueante.
pub struct AlertEvaluator {
    evaluation_sender: mpsc::Sender<(SightingAlertRequest, String)>,
    pub rule_registry: Arc<RuleRegistry>,
    pub channel_registry: Arc<ChannelRegistry>,
    pub ledger: Arc<AlertLedger>,
    pub cooldown_ledger: Arc<CooldownLedger>,
    pub statistics: Arc<EvaluationStatistics>,
    room_manager: Arc<WebSocketRoomManager>,
}

struct EvaluatorCore {
    rule_registry: Arc<RuleRegistry>,
    channel_registry: Arc<ChannelRegistry>,
    ledger: Arc<AlertLedger>,
    cooldown_ledger: Arc<CooldownLedger>,
    delivery_engine: Arc<DeliveryEngine>,
    room_manager: Arc<WebSocketRoomManager>,
    core_data_client: Arc<CoreDataClient>,
    statistics: Arc<EvaluationStatistics>,
}

impl AlertEvaluator {
    /// Forja el evaluador y enciende su trabajador de fondo.
    pub fn ignite(
        queue_capacity: usize,
        rule_registry: Arc<RuleRegistry>,
        channel_registry: Arc<ChannelRegistry>,
        ledger: Arc<AlertLedger>,
        cooldown_ledger: Arc<CooldownLedger>,
        delivery_engine: Arc<DeliveryEngine>,
        room_manager: Arc<WebSocketRoomManager>,
        core_data_client: Arc<CoreDataClient>,
    ) -> Arc<Self> {
        let (evaluation_sender, mut evaluation_receiver) =
            mpsc::channel::<(SightingAlertRequest, String)>(queue_capacity.max(1));

        let statistics = Arc::new(EvaluationStatistics::default());

        let evaluator_core = Arc::new(EvaluatorCore {
            rule_registry: rule_registry.clone(),
            channel_registry: channel_registry.clone(),
            ledger: ledger.clone(),
            cooldown_ledger: cooldown_ledger.clone(),
            delivery_engine,
            room_manager: room_manager.clone(),
            core_data_client,
            statistics: statistics.clone(),
        });

        tokio::spawn(async move {
            info!("⚖️  [ALERT_EVALUATOR]: Background evaluation worker online.");
            while let Some((sighting_request, sighting_id)) = evaluation_receiver.recv().await {
                evaluator_core.process_sighting_evaluation(sighting_request, sighting_id).await;
            }
            info!("🛑 [ALERT_EVALUATOR]: Evaluation worker terminated.");
        });

        Arc::new(Self {
            evaluation_sender,
            rule_registry,
            channel_registry,
            ledger,
            cooldown_ledger,
            statistics,
            room_manager,
        })
    }

    /// Contrato público: acuse 'queued' inmediato, sin esperar la lógica.
    pub fn evaluate(&self, sighting_request: SightingAlertRequest) -> EvaluationResult {
        let acknowledgment_started = Instant::now();
        let sighting_id = sighting_request
            .sighting_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let acknowledgment_status =
            match self.evaluation_sender.try_send((sighting_request, sighting_id.clone())) {
                Ok(()) => "queued",
                Err(enqueue_fault) => {
                    self.statistics.evaluation_errors.fetch_add(1, Ordering::Relaxed);
                    error!("❌ [ALERT_EVALUATOR]: Evaluation queue rejected sighting: {}", enqueue_fault);
                    "error"
                }
            };

        EvaluationResult {
            sighting_id,
            alerts_triggered: 0,
            processing_time_ms: acknowledgment_started.elapsed().as_secs_f64() * 1000.0,
            rules_evaluated: 0,
            status: acknowledgment_status.to_string(),
        }
    }

    /// Transición active -> acknowledged con difusión a la sala de alertas.
    pub fn acknowledge_alert(&self, alert_id: &str, acknowledged_by: &str) -> Result<AlertInstance, String> {
        let acknowledged_instance = self.ledger.acknowledge(alert_id, acknowledged_by, Utc::now())?;

        self.room_manager.broadcast_to_room(
            Room::Alerts,
            serde_json::json!({
                "type": "alert_acknowledged",
                "alert_id": alert_id,
                "acknowledged_by": acknowledged_by,
            }),
        );

        Ok(acknowledged_instance)
    }

    /// Transición active|acknowledged -> resolved con difusión.
    pub fn resolve_alert(&self, alert_id: &str, resolved_by: &str) -> Result<AlertInstance, String> {
        let resolved_instance = self.ledger.resolve(alert_id, resolved_by, Utc::now())?;

        self.room_manager.broadcast_to_room(
            Room::Alerts,
            serde_json::json!({
                "type": "alert_resolved",
                "alert_id": alert_id,
                "resolved_by": resolved_by,
            }),
        );

        Ok(resolved_instance)
    }

    pub fn statistics_snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "sightings_processed": self.statistics.sightings_processed.load(Ordering::Relaxed),
            "rules_evaluated": self.statistics.rules_evaluated.load(Ordering::Relaxed),
            "alerts_triggered": self.statistics.alerts_triggered.load(Ordering::Relaxed),
            "basic_alerts": self.statistics.basic_alerts.load(Ordering::Relaxed),
            "high_priority_alerts": self.statistics.high_priority_alerts.load(Ordering::Relaxed),
            "degraded_priority_checks": self.statistics.degraded_priority_checks.load(Ordering::Relaxed),
            "evaluation_errors": self.statistics.evaluation_errors.load(Ordering::Relaxed),
            "cooldown_skipped": self.cooldown_ledger.skipped_count(),
            "cooldowns_active": self.cooldown_ledger.active_count(),
            "active_rules": self.rule_registry.active().len(),
            "alerts_in_ledger": self.ledger.total_count(),
        })
    }
}

impl EvaluatorCore {
    /// Evaluación completa de un avistamiento: reglas de negocio fijas
    /// más las reglas declarativas del registro.
    #[instrument(skip_all, fields(person = %sighting_request.person_id, sighting = %sighting_id))]
    async fn process_sighting_evaluation(
        &self,
        sighting_request: SightingAlertRequest,
        sighting_id: String,
    ) {
        self.statistics.sightings_processed.fetch_add(1, Ordering::Relaxed);

        // --- REGLA 1: ALERTA BÁSICA (toda persona reconocida) ---
        self.trigger_basic_alert(&sighting_request, &sighting_id).await;

        // --- REGLA 2: ALTA PRIORIDAD (consulta al servicio de datos) ---
        let priority_profile = match self
            .core_data_client
            .check_person_priority(&sighting_request.person_id)
            .await
        {
            Ok(profile) => profile,
            Err(priority_fault) => {
                self.statistics.degraded_priority_checks.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "🩹 [ALERT_EVALUATOR]: Priority API unreachable ({}). Degrading to basic alert only.",
                    priority_fault
                );
                PersonPriorityProfile::degraded()
            }
        };

        if priority_profile.is_high_priority {
            self.trigger_high_priority_alert(&sighting_request, &sighting_id, &priority_profile)
                .await;
        }

        // --- REGLAS DECLARATIVAS DEL REGISTRO ---
        self.evaluate_configured_rules(&sighting_request, &sighting_id).await;
    }

    /// Regla 1: instancia de prioridad baja con difusión al dashboard.
    async fn trigger_basic_alert(&self, sighting_request: &SightingAlertRequest, sighting_id: &str) {
        let alert_instance = self.build_alert_instance(
            BASIC_RULE_ID,
            "Basic Person Detection",
            AlertPriority::Low,
            sighting_request,
            sighting_id,
            format!(
                "Person detected: {} at camera {}",
                sighting_request.person_id, sighting_request.camera_id
            ),
        );

        self.register_and_broadcast(&alert_instance).await;
        self.statistics.basic_alerts.fetch_add(1, Ordering::Relaxed);

        // Entrega de dashboard: difusión en tiempo real a la sala.
        self.room_manager.broadcast_to_room(
            Room::Dashboard,
            serde_json::json!({
                "type": "alert_notification",
                "alert_id": alert_instance.id,
                "priority": alert_instance.priority,
                "data": {
                    "message": alert_instance.message,
                    "person_id": sighting_request.person_id,
                    "camera_id": sighting_request.camera_id,
                    "confidence_score": sighting_request.confidence_score,
                },
            }),
        );

        self.ledger.register_notification(&alert_instance.id, 1);

        info!(
            "📊 [ALERT_EVALUATOR]: BASIC ALERT triggered for {} at {} (dashboard).",
            sighting_request.person_id, sighting_request.camera_id
        );
    }

    /// Regla 2: instancia de alta prioridad con fan-out por contacto.
    async fn trigger_high_priority_alert(
        &self,
        sighting_request: &SightingAlertRequest,
        sighting_id: &str,
        priority_profile: &PersonPriorityProfile,
    ) {
        let alert_priority = priority_profile
            .priority_level
            .map(|level| level.as_alert_priority())
            .unwrap_or(AlertPriority::High);

        let alert_instance = self.build_alert_instance(
            HIGH_PRIORITY_RULE_ID,
            "High Priority Person Detection",
            alert_priority,
            sighting_request,
            sighting_id,
            format!(
                "🚨 HIGH PRIORITY: {} detected at camera {} ({:.1}%). Reason: {}",
                sighting_request.person_id,
                sighting_request.camera_id,
                sighting_request.confidence_score * 100.0,
                priority_profile.alert_reason.as_deref().unwrap_or("high priority person detected")
            ),
        );

        self.register_and_broadcast(&alert_instance).await;
        self.statistics.high_priority_alerts.fetch_add(1, Ordering::Relaxed);

        info!(
            "🚨 [ALERT_EVALUATOR]: HIGH PRIORITY ALERT for {} (level {:?}, channels {:?}).",
            sighting_request.person_id, priority_profile.priority_level, priority_profile.escalation_channels
        );

        // Difusión inmediata al dashboard (siempre parte del fan-out).
        self.room_manager.broadcast_to_room(
            Room::Dashboard,
            serde_json::json!({
                "type": "alert_notification",
                "alert_id": alert_instance.id,
                "priority": alert_instance.priority,
                "data": {
                    "message": alert_instance.message,
                    "alert_reason": priority_profile.alert_reason,
                    "person_id": sighting_request.person_id,
                    "camera_id": sighting_request.camera_id,
                },
            }),
        );
        self.ledger.register_notification(&alert_instance.id, 1);

        // Resolución de contactos vía la tabla de enlace.
        let person_contacts = match self
            .core_data_client
            .fetch_person_contacts(&sighting_request.person_id)
            .await
        {
            Ok(contacts) => contacts,
            Err(contacts_fault) => {
                warn!("⚠️ [ALERT_EVALUATOR]: Contact resolution failed: {}", contacts_fault);
                Vec::new()
            }
        };

        if person_contacts.is_empty() {
            warn!(
                "⚠️ [ALERT_EVALUATOR]: No notification contacts linked to person {}.",
                sighting_request.person_id
            );
            return;
        }

        for contact_link in person_contacts {
            self.dispatch_to_contact(&alert_instance, sighting_request, contact_link).await;
        }
    }

    /// Despacho por contacto: retardo 0 inmediato; positivo agenda una
    /// tarea temporizada de escalamiento.
    async fn dispatch_to_contact(
        &self,
        alert_instance: &AlertInstance,
        sighting_request: &SightingAlertRequest,
        contact_link: PersonContactLink,
    ) {
        let Some(contact_channel) = self
            .delivery_engine
            .synthesize_contact_channel(contact_link.contact_type, &contact_link.contact_value)
        else {
            warn!(
                "⚠️ [ALERT_EVALUATOR]: Contact {} skipped (provider credentials missing).",
                contact_link.contact_value
            );
            return;
        };

        let mut message_data = AlertMessageData::from_alert(alert_instance);
        if let Some(priority_override) = contact_link.priority_override {
            message_data.priority = priority_override;
        }
        if let Some(custom_template) = &contact_link.custom_message_template {
            message_data.body_override = Some(format_contact_template(
                custom_template,
                &sighting_request.person_id,
                &sighting_request.camera_id,
                sighting_request.confidence_score,
                &sighting_request.timestamp,
            ));
        }

        let delivery_engine = self.delivery_engine.clone();
        let ledger = self.ledger.clone();
        let alert_id = alert_instance.id.clone();
        let escalation_delay_minutes = contact_link.escalation_delay_minutes;

        tokio::spawn(async move {
            if escalation_delay_minutes > 0 {
                debug!(
                    "⏰ [ALERT_EVALUATOR]: Contact dispatch for alert {} scheduled in {} min.",
                    alert_id, escalation_delay_minutes
                );
                tokio::time::sleep(std::time::Duration::from_secs(
                    u64::from(escalation_delay_minutes) * 60,
                ))
                .await;
            }

            let delivery_record =
                delivery_engine.deliver_to_channel(&contact_channel, &message_data).await;
            if delivery_record.status == faceguard_domain_models::DeliveryStatus::Sent {
                ledger.register_notification(&alert_id, 1);
            }
        });
    }

    /// Reglas declarativas: emparejamiento + enfriamiento + fan-out.
    async fn evaluate_configured_rules(
        &self,
        sighting_request: &SightingAlertRequest,
        sighting_id: &str,
    ) {
        let sighting_context = SightingContext {
            person_id: sighting_request.person_id.clone(),
            camera_id: sighting_request.camera_id.clone(),
            confidence: sighting_request.confidence_score,
            location_id: sighting_request.metadata["location_id"].as_str().map(|s| s.to_string()),
            department: sighting_request.metadata["department"].as_str().map(|s| s.to_string()),
            access_level: sighting_request.metadata["access_level"].as_u64().map(|v| v as u32),
        };

        let evaluation_hour = parse_sighting_hour(&sighting_request.timestamp);

        for rule in self.rule_registry.active() {
            self.statistics.rules_evaluated.fetch_add(1, Ordering::Relaxed);

            if !rule_matches(&rule.trigger_conditions, &sighting_context, evaluation_hour) {
                continue;
            }

            // Enfriamiento atómico ANTES de la emisión.
            if !self.cooldown_ledger.acquire(
                &rule.id,
                &sighting_request.person_id,
                &sighting_request.camera_id,
                rule.cooldown_minutes,
            ) {
                continue;
            }

            let alert_instance = self.build_alert_instance(
                &rule.id,
                &rule.rule_name,
                rule.priority,
                sighting_request,
                sighting_id,
                format!(
                    "🚨 ALERT TRIGGERED: {} — {} at camera {} ({:.1}%)",
                    rule.rule_name,
                    sighting_request.person_id,
                    sighting_request.camera_id,
                    sighting_request.confidence_score * 100.0
                ),
            );

            self.register_and_broadcast(&alert_instance).await;

            let resolved_channels =
                self.channel_registry.resolve_active(&rule.notification_channel_ids);
            if resolved_channels.is_empty() {
                warn!("⚠️ [ALERT_EVALUATOR]: Rule '{}' has no active channels.", rule.rule_name);
                continue;
            }

            let mut message_data = AlertMessageData::from_alert(&alert_instance);
            message_data.body_override = rule.notification_template.as_ref().map(|template| {
                format_contact_template(
                    template,
                    &sighting_request.person_id,
                    &sighting_request.camera_id,
                    sighting_request.confidence_score,
                    &sighting_request.timestamp,
                )
            });

            let delivery_summary =
                self.delivery_engine.deliver_alert(&resolved_channels, &message_data).await;
            let delivered_count =
                delivery_summary["successful_deliveries"].as_u64().unwrap_or(0) as u32;
            self.ledger.register_notification(&alert_instance.id, delivered_count);
        }
    }

    fn build_alert_instance(
        &self,
        rule_id: &str,
        rule_name: &str,
        priority: AlertPriority,
        sighting_request: &SightingAlertRequest,
        sighting_id: &str,
        message: String,
    ) -> AlertInstance {
        AlertInstance {
            id: Uuid::new_v4().to_string(),
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            person_id: sighting_request.person_id.clone(),
            camera_id: sighting_request.camera_id.clone(),
            sighting_id: sighting_id.to_string(),
            priority,
            status: AlertStatus::Active,
            message,
            trigger_data: serde_json::json!({
                "person_id": sighting_request.person_id,
                "camera_id": sighting_request.camera_id,
                "confidence_score": sighting_request.confidence_score,
                "face_bbox": sighting_request.face_bbox,
                "sighting_id": sighting_id,
                "timestamp": sighting_request.timestamp,
                "metadata": sighting_request.metadata,
            }),
            triggered_at: Utc::now(),
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            resolved_by: None,
            escalated_at: None,
            escalated_from: None,
            notification_count: 0,
        }
    }

    /// Sella la instancia en el espejo, la difunde a la sala de alertas
    /// y la replica al rastro autoritativo en tarea desprendida.
    async fn register_and_broadcast(&self, alert_instance: &AlertInstance) {
        self.ledger.insert(alert_instance.clone());
        self.statistics.alerts_triggered.fetch_add(1, Ordering::Relaxed);

        self.room_manager.broadcast_to_room(
            Room::Alerts,
            serde_json::json!({
                "type": "alert_triggered",
                "alert_id": alert_instance.id,
                "rule_name": alert_instance.rule_name,
                "priority": alert_instance.priority,
                "person_id": alert_instance.person_id,
                "camera_id": alert_instance.camera_id,
                "message": alert_instance.message,
                "triggered_at": alert_instance.triggered_at.to_rfc3339(),
            }),
        );

        let instance_for_persistence = alert_instance.clone();
        let data_client = self.core_data_client.clone();
        tokio::spawn(async move {
            if let Err(persistence_fault) =
                data_client.persist_alert_instance(&instance_for_persistence).await
            {
                debug!("⚠️ [ALERT_EVALUATOR]: Authoritative alert persist rejected: {}", persistence_fault);
            }
        });
    }
}

/// Formatea una plantilla de contacto con los campos del contrato:
/// person_name, camera_location, confidence (porcentaje) y timestamp.
pub fn format_contact_template(
    template: &str,
    person_id: &str,
    camera_id: &str,
    confidence: f64,
    timestamp: &str,
) -> String {
    template
        .replace("{person_name}", person_id)
        .replace("{camera_location}", camera_id)
        .replace("{confidence}", &format!("{:.1}%", confidence * 100.0))
        .replace("{timestamp}", timestamp)
}

/// Hora de pared del avistamiento; degrada a la hora actual UTC.
fn parse_sighting_hour(timestamp: &str) -> u8 {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc).hour() as u8)
        .unwrap_or_else(|_| Utc::now().hour() as u8)
}
