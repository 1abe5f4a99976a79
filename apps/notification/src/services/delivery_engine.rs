// [apps/notification/src/services/delivery_engine.rs]
/*!
 * =================================================================
 * APARATO: MULTI-CHANNEL DELIVERY ENGINE (V3.2 - RESILIENCE MASTER)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4-APP)
 * RESPONSABILIDAD: FAN-OUT POR CANAL CON SALVAGUARDAS COMPLETAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. GUARD PIPELINE: límite de tasa -> cortacircuitos -> reintentos
 *    con backoff min(2^(n−1), 60)s -> timeout por intento. Todos los
 *    reintentos alimentan el cortacircuitos.
 * 2. OUTCOME LEDGER: Todo desenlace (éxito o fallo final) se sella
 *    como DeliveryRecord en el registro caliente y viaja en tarea
 *    desprendida al servicio de datos.
 * 3. POLICY SEAM: deliver_with_policy recibe la fábrica de intentos,
 *    separando la política de resiliencia de los adaptadores físicos.
 *
 * # Mathematical Proof (Retry Monotonicity):
 * El intento N+1 inicia no antes de min(2^(N−1), 60)s tras el N; el
 * total de intentos jamás supera retry_attempts del canal.
 * =================================================================
 */

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use faceguard_domain_models::{
    AlertInstance, AlertPriority, ChannelConfig, ChannelType, DeliveryRecord, DeliveryStatus,
    NotificationChannel,
};
use faceguard_infra_data_client::CoreDataClient;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::services::channel_guard::{CircuitBreakerBank, SlidingWindowRateLimiter};
use crate::services::channels::email::{build_alert_email, AlertEmailContext, SmtpEmailEngine};
use crate::services::channels::sms::{compose_sms_message, TwilioSmsEngine};
use crate::services::channels::webhook::WebhookDeliveryEngine;
use crate::services::channels::DeliveryError;
use crate::services::ws_rooms::{Room, WebSocketRoomManager};

/// Techo de registros retenidos en el log caliente de entregas.
const DELIVERY_LOG_CAPACITY: usize = 1000;

/// Backoff exponencial acotado del reintento N (1-indexado).
pub fn retry_backoff(attempt_number: u32) -> Duration {
    let exponent = attempt_number.saturating_sub(1).min(6);
    Duration::from_secs((1u64 << exponent).min(60))
}

/// Mensaje preparado de una notificación lógica, común a todos los canales.
#[derive(Debug, Clone)]
pub struct AlertMessageData {
    pub alert_id: String,
    pub rule_name: String,
    pub priority: AlertPriority,
    pub person_id: String,
    pub camera_id: String,
    pub confidence: f64,
    pub triggered_at: String,
    pub subject: String,
    /// Cuerpo explícito (plantilla personalizada o envío directo).
    pub body_override: Option<String>,
    pub face_crop_jpeg: Option<Vec<u8>>,
}

impl AlertMessageData {
    pub fn from_alert(alert: &AlertInstance) -> Self {
        Self {
            alert_id: alert.id.clone(),
            rule_name: alert.rule_name.clone(),
            priority: alert.priority,
            person_id: alert.person_id.clone(),
            camera_id: alert.camera_id.clone(),
            confidence: alert.trigger_data["confidence_score"].as_f64().unwrap_or(0.0),
            triggered_at: alert.triggered_at.to_rfc3339(),
            subject: format!(
                "🚨 FaceGuard Alert: {} PRIORITY - {}",
                alert.priority.as_str().to_uppercase(),
                alert.rule_name
            ),
            body_override: None,
            face_crop_jpeg: None,
        }
    }
}

#[derive(Default)]
struct DeliveryCounters {
    total_sent: AtomicU64,
    email_sent: AtomicU64,
    sms_sent: AtomicU64,
    webhook_sent: AtomicU64,
    websocket_sent: AtomicU64,
    failed_deliveries: AtomicU64,
    retry_attempts: AtomicU64,
    rate_limited_skips: AtomicU64,
    breaker_skips: AtomicU64,
}

/// Motor de entrega multicanal con salvaguardas por canal.
pub struct DeliveryEngine {
    settings: Arc<Settings>,
    rate_limiter: SlidingWindowRateLimiter,
    pub breaker_bank: CircuitBreakerBank,
    sms_engine: TwilioSmsEngine,
    webhook_engine: WebhookDeliveryEngine,
    room_manager: Arc<WebSocketRoomManager>,
    core_data_client: Arc<CoreDataClient>,
    delivery_log: Mutex<VecDeque<DeliveryRecord>>,
    counters: DeliveryCounters,
}

impl DeliveryEngine {
    pub fn new(
        settings: Arc<Settings>,
        room_manager: Arc<WebSocketRoomManager>,
        core_data_client: Arc<CoreDataClient>,
    ) -> Arc<Self> {
        Arc::new(Self {
            settings,
            rate_limiter: SlidingWindowRateLimiter::new(),
            breaker_bank: CircuitBreakerBank::new(),
            sms_engine: TwilioSmsEngine::new(),
            webhook_engine: WebhookDeliveryEngine::new(),
            room_manager,
            core_data_client,
            delivery_log: Mutex::new(VecDeque::new()),
            counters: DeliveryCounters::default(),
        })
    }

    /// Orquesta una notificación lógica a través de N canales en
    /// paralelo cooperativo. Devuelve el resumen con cada desenlace.
    #[instrument(skip(self, channels, message), fields(alert = %message.alert_id))]
    pub async fn deliver_alert(
        &self,
        channels: &[NotificationChannel],
        message: &AlertMessageData,
    ) -> serde_json::Value {
        let delivery_futures = channels
            .iter()
            .filter(|channel| channel.is_active)
            .map(|channel| self.deliver_to_channel(channel, message));

        let delivery_records = futures::future::join_all(delivery_futures).await;

        let successful_count = delivery_records
            .iter()
            .filter(|record| record.status == DeliveryStatus::Sent)
            .count();
        let failed_count = delivery_records.len() - successful_count;

        info!(
            "📬 [DELIVERY_ENGINE]: Alert {} fan-out complete: {} sent, {} failed.",
            message.alert_id, successful_count, failed_count
        );

        serde_json::json!({
            "alert_id": message.alert_id,
            "total_channels": delivery_records.len(),
            "successful_deliveries": successful_count,
            "failed_deliveries": failed_count,
            "delivery_details": delivery_records,
            "delivered_at": Utc::now().to_rfc3339(),
        })
    }

    /// Entrega a un canal individual a través de la política completa.
    pub async fn deliver_to_channel(
        &self,
        channel: &NotificationChannel,
        message: &AlertMessageData,
    ) -> DeliveryRecord {
        self.deliver_with_policy(channel, &message.alert_id, |_attempt_number| {
            self.execute_channel_attempt(channel, message)
        })
        .await
    }

    /// Política de resiliencia completa sobre una fábrica de intentos.
    /// La fábrica recibe el número de intento (1-indexado) y produce el
    /// futuro del intento físico; el timeout del canal acota cada uno.
    pub async fn deliver_with_policy<F, Fut>(
        &self,
        channel: &NotificationChannel,
        alert_id: &str,
        attempt_factory: F,
    ) -> DeliveryRecord
    where
        F: Fn(u32) -> Fut,
        Fut: Future<Output = Result<Option<String>, DeliveryError>>,
    {
        // 1. LÍMITE DE TASA: ventana deslizante de 60 segundos.
        if !self.rate_limiter.admit_and_record(&channel.id, channel.rate_limit_per_minute) {
            self.counters.rate_limited_skips.fetch_add(1, Ordering::Relaxed);
            warn!("⏳ [DELIVERY_ENGINE]: Channel {} rate-limited. Skipping.", channel.channel_name);
            return self
                .seal_outcome(channel, alert_id, DeliveryStatus::Failed, 0, Some("rate_limit_exceeded".into()), None)
                .await;
        }

        // 2. CORTACIRCUITOS: circuito abierto rechaza sin tocar al proveedor.
        if !self.breaker_bank.admits(&channel.id) {
            self.counters.breaker_skips.fetch_add(1, Ordering::Relaxed);
            warn!("🛑 [DELIVERY_ENGINE]: Channel {} circuit OPEN. Skipping.", channel.channel_name);
            return self
                .seal_outcome(channel, alert_id, DeliveryStatus::Failed, 0, Some("circuit_open".into()), None)
                .await;
        }

        // 3. REINTENTOS CON TIMEOUT POR INTENTO.
        let max_attempts = channel.retry_attempts.max(1);
        let attempt_timeout = Duration::from_secs(channel.timeout_seconds.max(1));
        let mut last_error_description = String::new();

        for attempt_number in 1..=max_attempts {
            let attempt_outcome =
                match tokio::time::timeout(attempt_timeout, attempt_factory(attempt_number)).await {
                    Ok(inner_outcome) => inner_outcome,
                    Err(_) => Err(DeliveryError::Timeout),
                };

            match attempt_outcome {
                Ok(external_id) => {
                    self.breaker_bank.register_success(&channel.id);
                    self.register_channel_success(channel.channel_type);

                    return self
                        .seal_outcome(
                            channel,
                            alert_id,
                            DeliveryStatus::Sent,
                            attempt_number - 1,
                            None,
                            external_id,
                        )
                        .await;
                }
                Err(delivery_fault) => {
                    self.breaker_bank.register_failure(&channel.id);
                    last_error_description = delivery_fault.to_string();

                    if attempt_number < max_attempts {
                        self.counters.retry_attempts.fetch_add(1, Ordering::Relaxed);
                        let backoff_delay = retry_backoff(attempt_number);
                        debug!(
                            "🔁 [DELIVERY_ENGINE]: Channel {} attempt {}/{} failed ({}). Backoff {:?}.",
                            channel.channel_name, attempt_number, max_attempts, last_error_description, backoff_delay
                        );
                        tokio::time::sleep(backoff_delay).await;
                    }
                }
            }
        }

        // 4. FALLO FINAL: presupuesto de reintentos agotado.
        self.counters.failed_deliveries.fetch_add(1, Ordering::Relaxed);
        error!(
            "❌ [DELIVERY_ENGINE]: Channel {} exhausted {} attempts: {}",
            channel.channel_name, max_attempts, last_error_description
        );

        self.seal_outcome(
            channel,
            alert_id,
            DeliveryStatus::Failed,
            max_attempts,
            Some(last_error_description),
            None,
        )
        .await
    }

    /// Un intento físico sobre el adaptador del protocolo del canal.
    async fn execute_channel_attempt(
        &self,
        channel: &NotificationChannel,
        message: &AlertMessageData,
    ) -> Result<Option<String>, DeliveryError> {
        let attempt_timeout = Duration::from_secs(channel.timeout_seconds.max(1));

        match &channel.configuration {
            ChannelConfig::Email {
                smtp_host,
                smtp_port,
                use_tls,
                use_ssl,
                username,
                password,
                from_email,
                email_address,
            } => {
                let email_context = AlertEmailContext {
                    alert_id: message.alert_id.clone(),
                    priority_label: message.priority.as_str().to_string(),
                    priority_color: message.priority.header_color().to_string(),
                    person_id: message.person_id.clone(),
                    camera_id: message.camera_id.clone(),
                    confidence: message.confidence,
                    triggered_at: message.triggered_at.clone(),
                    rule_name: message.rule_name.clone(),
                    body_override: message.body_override.clone(),
                    face_crop_jpeg: message.face_crop_jpeg.clone(),
                };

                let assembled_email =
                    build_alert_email(from_email, email_address, &message.subject, &email_context)?;

                SmtpEmailEngine::send_email(
                    smtp_host,
                    *smtp_port,
                    *use_tls,
                    *use_ssl,
                    username.as_deref(),
                    password.as_deref(),
                    assembled_email,
                    attempt_timeout,
                )
                .await?;
                Ok(None)
            }

            ChannelConfig::Sms { account_sid, auth_token, from_number, phone_number, .. } => {
                let message_body = message.body_override.clone().unwrap_or_else(|| {
                    compose_sms_message(
                        message.priority,
                        &message.person_id,
                        &message.camera_id,
                        message.confidence,
                    )
                });

                let delivery_receipt = self
                    .sms_engine
                    .send_sms(account_sid, auth_token, from_number, phone_number, &message_body, attempt_timeout)
                    .await?;
                Ok(Some(delivery_receipt.provider_sid))
            }

            ChannelConfig::Webhook { url, secret, headers } => {
                let webhook_envelope = serde_json::json!({
                    "event_type": "alert_triggered",
                    "alert_id": message.alert_id,
                    "timestamp": Utc::now().to_rfc3339(),
                    "alert_data": {
                        "rule_name": message.rule_name,
                        "priority": message.priority,
                        "person_id": message.person_id,
                        "camera_id": message.camera_id,
                        "confidence_score": message.confidence,
                        "triggered_at": message.triggered_at,
                    },
                    "source": "faceguard_notification_service",
                });

                self.webhook_engine
                    .post_envelope(url, secret.as_deref(), headers, &webhook_envelope, attempt_timeout)
                    .await?;
                Ok(None)
            }

            ChannelConfig::Websocket { room } => {
                let target_room = Room::from_name(room).unwrap_or(Room::Dashboard);
                let reached_connections = self.room_manager.broadcast_to_room(
                    target_room,
                    serde_json::json!({
                        "type": "alert_notification",
                        "alert_id": message.alert_id,
                        "timestamp": Utc::now().to_rfc3339(),
                        "priority": message.priority,
                        "data": {
                            "rule_name": message.rule_name,
                            "person_id": message.person_id,
                            "camera_id": message.camera_id,
                            "confidence_score": message.confidence,
                            "message": message.body_override,
                        },
                    }),
                );
                // Cero conexiones es nominal: el replay retiene el mensaje.
                Ok(Some(format!("{reached_connections}_connections")))
            }
        }
    }

    fn register_channel_success(&self, channel_type: ChannelType) {
        self.counters.total_sent.fetch_add(1, Ordering::Relaxed);
        match channel_type {
            ChannelType::Email => self.counters.email_sent.fetch_add(1, Ordering::Relaxed),
            ChannelType::Sms => self.counters.sms_sent.fetch_add(1, Ordering::Relaxed),
            ChannelType::Webhook => self.counters.webhook_sent.fetch_add(1, Ordering::Relaxed),
            ChannelType::Websocket => self.counters.websocket_sent.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Sella el desenlace en el log caliente y lo replica al servicio
    /// de datos en tarea desprendida (fallo tolerado).
    async fn seal_outcome(
        &self,
        channel: &NotificationChannel,
        alert_id: &str,
        status: DeliveryStatus,
        retry_count: u32,
        error_message: Option<String>,
        external_id: Option<String>,
    ) -> DeliveryRecord {
        let sealing_timestamp = Utc::now();
        let delivery_record = DeliveryRecord {
            id: Uuid::new_v4().to_string(),
            alert_id: alert_id.to_string(),
            channel_id: channel.id.clone(),
            status,
            retry_count,
            error_message: error_message.map(|description| description.chars().take(500).collect()),
            external_id,
            created_at: sealing_timestamp,
            sent_at: (status == DeliveryStatus::Sent).then_some(sealing_timestamp),
            delivered_at: None,
            metadata: serde_json::json!({
                "channel_name": channel.channel_name,
                "channel_type": channel.channel_type,
            }),
        };

        {
            let mut log_guard = self.delivery_log.lock().expect("delivery log lock poisoned");
            log_guard.push_back(delivery_record.clone());
            while log_guard.len() > DELIVERY_LOG_CAPACITY {
                log_guard.pop_front();
            }
        }

        let record_for_persistence = delivery_record.clone();
        let data_client = self.core_data_client.clone();
        tokio::spawn(async move {
            if let Err(persistence_fault) = data_client.record_delivery(&record_for_persistence).await {
                debug!("⚠️ [DELIVERY_ENGINE]: Authoritative delivery log rejected: {}", persistence_fault);
            }
        });

        delivery_record
    }

    /// Historial caliente de entregas, más recientes primero.
    pub fn recent_deliveries(
        &self,
        alert_id: Option<&str>,
        channel_id: Option<&str>,
        limit: usize,
    ) -> Vec<DeliveryRecord> {
        let log_guard = self.delivery_log.lock().expect("delivery log lock poisoned");
        let result_limit = if limit == 0 { 100 } else { limit };

        log_guard
            .iter()
            .rev()
            .filter(|record| {
                alert_id.map(|a| record.alert_id == a).unwrap_or(true)
                    && channel_id.map(|c| record.channel_id == c).unwrap_or(true)
            })
            .take(result_limit)
            .cloned()
            .collect()
    }

    pub fn delivery_by_id(&self, delivery_id: &str) -> Option<DeliveryRecord> {
        let log_guard = self.delivery_log.lock().expect("delivery log lock poisoned");
        log_guard.iter().find(|record| record.id == delivery_id).cloned()
    }

    pub fn statistics(&self) -> serde_json::Value {
        serde_json::json!({
            "total_sent": self.counters.total_sent.load(Ordering::Relaxed),
            "email_sent": self.counters.email_sent.load(Ordering::Relaxed),
            "sms_sent": self.counters.sms_sent.load(Ordering::Relaxed),
            "webhook_sent": self.counters.webhook_sent.load(Ordering::Relaxed),
            "websocket_sent": self.counters.websocket_sent.load(Ordering::Relaxed),
            "failed_deliveries": self.counters.failed_deliveries.load(Ordering::Relaxed),
            "retry_attempts": self.counters.retry_attempts.load(Ordering::Relaxed),
            "rate_limited_skips": self.counters.rate_limited_skips.load(Ordering::Relaxed),
            "breaker_skips": self.counters.breaker_skips.load(Ordering::Relaxed),
            "circuit_breaker_open": self.breaker_bank.open_circuit_count(),
            "last_updated": Utc::now().to_rfc3339(),
        })
    }

    /// Canal sintético por contacto individual, forjado con los
    /// valores por defecto del servicio (SMTP / proveedor SMS).
    pub fn synthesize_contact_channel(
        &self,
        contact_type: faceguard_domain_models::ContactType,
        contact_value: &str,
    ) -> Option<NotificationChannel> {
        use faceguard_domain_models::ContactType;

        let (channel_type, configuration) = match contact_type {
            ContactType::Email => (
                ChannelType::Email,
                ChannelConfig::Email {
                    smtp_host: self.settings.default_smtp_host.clone(),
                    smtp_port: self.settings.default_smtp_port,
                    use_tls: self.settings.default_smtp_use_tls,
                    use_ssl: false,
                    username: self.settings.smtp_username.clone(),
                    password: self.settings.smtp_password.clone(),
                    from_email: self.settings.default_from_email.clone(),
                    email_address: contact_value.to_string(),
                },
            ),
            ContactType::Phone => (
                ChannelType::Sms,
                ChannelConfig::Sms {
                    provider: "twilio".to_string(),
                    account_sid: self.settings.twilio_account_sid.clone()?,
                    auth_token: self.settings.twilio_auth_token.clone()?,
                    from_number: self.settings.twilio_from_number.clone(),
                    phone_number: contact_value.to_string(),
                },
            ),
            ContactType::Webhook => (
                ChannelType::Webhook,
                ChannelConfig::Webhook {
                    url: contact_value.to_string(),
                    secret: None,
                    headers: Default::default(),
                },
            ),
        };

        Some(NotificationChannel {
            id: format!("contact:{contact_value}"),
            channel_name: format!("contact-{}", contact_value),
            channel_type,
            configuration,
            rate_limit_per_minute: 60,
            retry_attempts: self.settings.default_retry_attempts,
            timeout_seconds: self.settings.default_timeout_seconds,
            is_active: true,
        })
    }
}
