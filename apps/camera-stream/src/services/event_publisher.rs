// [apps/camera-stream/src/services/event_publisher.rs]
/*!
 * =================================================================
 * APARATO: RECOGNITION EVENT PUBLISHER (V2.7 - DUAL BUS)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4-APP)
 * RESPONSABILIDAD: DIFUSIÓN FIRE-AND-FORGET DE EVENTOS DE RECONOCIMIENTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DUAL TOPOLOGY: Bus broadcast en proceso para suscriptores locales
 *    (dashboard WS, analítica) + PUBLISH Redis para el resto de la flota.
 * 2. ZERO-SUBSCRIBER NOMINAL: Cero suscriptores no es un error; el
 *    conteo se reporta y la señal se descarta en silencio.
 * 3. BATCHED HISTORY: Con persistencia activa, lotes de tamaño B se
 *    sellan en la lista {canal}:history con TTL de 7 días.
 * =================================================================
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use faceguard_domain_models::{FrameMetadata, RecognitionEvent, RecognitionResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, trace, warn};

use crate::config::Settings;

/// Capacidad del canal broadcast; absorbe ráfagas sin error de lagging.
const BROADCAST_CHANNEL_CAPACITY: usize = 4096;

/// TTL del historial de eventos por canal: 7 días.
const EVENT_HISTORY_TTL_SECONDS: i64 = 604_800;

/// Publicador de eventos de reconocimiento con uplink Redis opcional.
pub struct EventPublisher {
    internal_transmission_channel: broadcast::Sender<RecognitionEvent>,
    redis_uplink: Option<ConnectionManager>,
    event_channel: String,
    persistence_enabled: bool,
    batch_capacity: usize,
    pending_batch: Mutex<Vec<RecognitionEvent>>,
    events_published: AtomicU64,
    events_failed: AtomicU64,
    last_error: std::sync::Mutex<Option<String>>,
}

impl EventPublisher {
    /// Forja el publicador negociando el enlace Redis; su ausencia
    /// degrada a difusión puramente local, nunca a un arranque fallido.
    pub async fn ignite(settings: &Settings) -> Arc<Self> {
        let (broadcast_sender, _) = broadcast::channel(BROADCAST_CHANNEL_CAPACITY);

        let redis_uplink = match redis::Client::open(settings.redis_url()) {
            Ok(redis_client) => match ConnectionManager::new(redis_client).await {
                Ok(connection_manager) => {
                    info!("📡 [EVENT_PUBLISHER]: Redis uplink online at {}.", settings.redis_url());
                    Some(connection_manager)
                }
                Err(link_fault) => {
                    warn!(
                        "⚠️ [EVENT_PUBLISHER]: Redis unreachable ({}). Degrading to in-process bus.",
                        link_fault
                    );
                    None
                }
            },
            Err(configuration_fault) => {
                warn!(
                    "⚠️ [EVENT_PUBLISHER]: Redis URL rejected ({}). Degrading to in-process bus.",
                    configuration_fault
                );
                None
            }
        };

        Arc::new(Self {
            internal_transmission_channel: broadcast_sender,
            redis_uplink,
            event_channel: settings.event_channel.clone(),
            persistence_enabled: settings.enable_event_persistence,
            batch_capacity: settings.event_batch_size.max(1),
            pending_batch: Mutex::new(Vec::new()),
            events_published: AtomicU64::new(0),
            events_failed: AtomicU64::new(0),
            last_error: std::sync::Mutex::new(None),
        })
    }

    /// Receptor local para superficies en tiempo real (WS, analítica).
    pub fn subscribe(&self) -> broadcast::Receiver<RecognitionEvent> {
        self.internal_transmission_channel.subscribe()
    }

    /// Publica el evento de un intento de reconocimiento. Fire-and-forget:
    /// el fallo de cualquier estrato se cuenta y jamás asciende al bucle.
    pub async fn publish_recognition_event(
        &self,
        camera_id: &str,
        recognition_result: &RecognitionResult,
        frame_metadata: &FrameMetadata,
    ) -> bool {
        let event = RecognitionEvent::seal(camera_id, recognition_result, frame_metadata);

        // 1. DIFUSIÓN LOCAL (lock-free emission).
        match self.internal_transmission_channel.send(event.clone()) {
            Ok(subscriber_count) => {
                trace!("📢 [EVENT_PUBLISHER]: Signal broadcast to {} local links.", subscriber_count);
            }
            Err(_) => {
                // Sin suscriptores locales: silencio nominal.
                trace!("💤 [EVENT_PUBLISHER]: No local subscribers for event {}.", event.event_id);
            }
        }

        // 2. UPLINK REDIS.
        let mut publish_succeeded = true;
        if let Some(redis_connection) = &self.redis_uplink {
            let event_json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(serialization_fault) => {
                    self.register_failure(format!("event serialization failed: {serialization_fault}"));
                    return false;
                }
            };

            let mut connection = redis_connection.clone();
            match connection
                .publish::<_, _, i64>(self.event_channel.as_str(), event_json)
                .await
            {
                Ok(remote_subscriber_count) => {
                    debug!(
                        "📡 [EVENT_PUBLISHER]: Event {} published (remote subscribers: {}).",
                        event.event_id, remote_subscriber_count
                    );
                }
                Err(publish_fault) => {
                    publish_succeeded = false;
                    self.register_failure(format!("redis publish failed: {publish_fault}"));
                }
            }
        }

        if publish_succeeded {
            self.events_published.fetch_add(1, Ordering::Relaxed);
        }

        // 3. LOTE DE PERSISTENCIA.
        if self.persistence_enabled && self.redis_uplink.is_some() {
            let batch_ready = {
                let mut batch_guard = self.pending_batch.lock().await;
                batch_guard.push(event);
                batch_guard.len() >= self.batch_capacity
            };
            if batch_ready {
                self.flush_event_batch().await;
            }
        }

        publish_succeeded
    }

    /// Sella el lote pendiente en la lista de historial con TTL de 7 días.
    pub async fn flush_event_batch(&self) {
        let Some(redis_connection) = &self.redis_uplink else { return };

        let drained_batch: Vec<String> = {
            let mut batch_guard = self.pending_batch.lock().await;
            if batch_guard.is_empty() {
                return;
            }
            batch_guard
                .drain(..)
                .filter_map(|event| serde_json::to_string(&event).ok())
                .collect()
        };

        if drained_batch.is_empty() {
            return;
        }

        let history_key = format!("{}:history", self.event_channel);
        let mut connection = redis_connection.clone();

        let flush_outcome: redis::RedisResult<()> = async {
            connection.lpush::<_, _, ()>(&history_key, &drained_batch).await?;
            connection.expire::<_, ()>(&history_key, EVENT_HISTORY_TTL_SECONDS).await?;
            Ok(())
        }
        .await;

        match flush_outcome {
            Ok(()) => debug!(
                "🗄️  [EVENT_PUBLISHER]: Flushed {} events to {} (TTL {}s).",
                drained_batch.len(),
                history_key,
                EVENT_HISTORY_TTL_SECONDS
            ),
            Err(flush_fault) => {
                error!("❌ [EVENT_PUBLISHER]: History flush failed: {}", flush_fault);
                self.register_failure(format!("history flush failed: {flush_fault}"));
            }
        }
    }

    /// Drena el lote pendiente durante el apagado ordenado.
    pub async fn shutdown(&self) {
        self.flush_event_batch().await;
        info!("🛑 [EVENT_PUBLISHER]: Publisher shut down. Pending batch flushed.");
    }

    fn register_failure(&self, error_description: String) {
        self.events_failed.fetch_add(1, Ordering::Relaxed);
        error!("❌ [EVENT_PUBLISHER]: {}", error_description);
        if let Ok(mut last_error_guard) = self.last_error.lock() {
            *last_error_guard = Some(error_description);
        }
    }

    pub fn performance_statistics(&self) -> serde_json::Value {
        let published = self.events_published.load(Ordering::Relaxed);
        let failed = self.events_failed.load(Ordering::Relaxed);
        let total = published + failed;

        serde_json::json!({
            "events_published": published,
            "events_failed": failed,
            "success_rate_percent": if total > 0 { published as f64 / total as f64 * 100.0 } else { 100.0 },
            "event_channel": self.event_channel,
            "persistence_enabled": self.persistence_enabled,
            "redis_uplink_active": self.redis_uplink.is_some(),
            "last_error": self.last_error.lock().ok().and_then(|guard| guard.clone()),
        })
    }
}
