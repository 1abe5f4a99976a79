// [apps/camera-stream/src/services/sighting_queue.rs]
/*!
 * =================================================================
 * APARATO: ASYNC SIGHTING CAPTURE (V2.9 - NON-BLOCKING MASTER)
 * CLASIFICACIÓN: BACKGROUND PIPELINE SERVICE (ESTRATO L3-APP)
 * RESPONSABILIDAD: COLA ACOTADA Y PERSISTENCIA DESPRENDIDA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. HOT PATH SHIELD: capture_async retorna de inmediato; cola llena
 *    descarta el avistamiento NUEVO y contabiliza el drop. El bucle
 *    de reconocimiento jamás espera por la persistencia.
 * 2. DETACHED UPLOADS: El consumidor único desprende una tarea por
 *    avistamiento: JPEG-90 -> multipart -> disparo de evaluación.
 * 3. ABSORB & COUNT: Todo fallo aguas abajo se registra y cuenta;
 *    nada asciende al orquestador.
 *
 * # Mathematical Proof (Bounded Queue):
 * La cola jamás supera 1000 elementos: try_send sobre canal lleno
 * falla en O(1) y el contador queue_full_drops crece exactamente en
 * 1 por descarte.
 * =================================================================
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use faceguard_domain_models::{FrameMetadata, RecognitionResult, Sighting, SightingSourceType};
use faceguard_infra_data_client::{CoreDataClient, NotificationClient};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::services::frame_source::{crop_face_region, encode_frame_jpeg, RawFrame};

/// Capacidad dura de la cola de avistamientos.
pub const SIGHTING_QUEUE_CAPACITY: usize = 1000;

/// Calidad JPEG de los recortes faciales subidos.
const CROP_JPEG_QUALITY: u8 = 90;

/// Avistamiento pendiente con su recorte crudo aún sin codificar.
struct PendingSighting {
    sighting: Sighting,
    face_crop: RawFrame,
}

/// Contadores atómicos del pipeline de captura.
#[derive(Default)]
pub struct CaptureStatistics {
    pub total_sightings_captured: AtomicU64,
    pub successful_uploads: AtomicU64,
    pub failed_uploads: AtomicU64,
    pub queue_full_drops: AtomicU64,
    pub alert_evaluations_triggered: AtomicU64,
    pub alert_evaluation_failures: AtomicU64,
    pub queue_depth: AtomicU64,
}

/// Servicio de captura asíncrona de avistamientos, dueño exclusivo de
/// cada Sighting hasta su persistencia.
pub struct AsyncSightingCapture {
    sighting_sender: mpsc::Sender<PendingSighting>,
    pub statistics: Arc<CaptureStatistics>,
}

impl AsyncSightingCapture {
    /// Forja el servicio y enciende el consumidor único de la cola.
    pub fn ignite(
        core_data_client: Arc<CoreDataClient>,
        notification_client: Arc<NotificationClient>,
    ) -> Arc<Self> {
        let (sighting_sender, sighting_receiver) =
            mpsc::channel::<PendingSighting>(SIGHTING_QUEUE_CAPACITY);
        let statistics = Arc::new(CaptureStatistics::default());

        let service = Arc::new(Self { sighting_sender, statistics: statistics.clone() });

        tokio::spawn(Self::consume_sighting_queue(
            sighting_receiver,
            core_data_client,
            notification_client,
            statistics,
        ));

        info!("📸 [SIGHTING_CAPTURE]: Async capture online. Queue capacity: {}.", SIGHTING_QUEUE_CAPACITY);
        service
    }

    /// Encola a lo sumo un avistamiento por persona detectada y RETORNA.
    /// Nunca bloquea ni espera; la cola llena descarta el elemento nuevo.
    pub fn capture_async(
        &self,
        recognition_result: &RecognitionResult,
        camera_id: &str,
        original_frame: &RawFrame,
        frame_metadata: &FrameMetadata,
    ) {
        if !recognition_result.success || recognition_result.persons_detected.is_empty() {
            return;
        }

        for detection in &recognition_result.persons_detected {
            let Some(person_id) = &detection.person_id else { continue };

            let Some(face_crop) = crop_face_region(original_frame, &detection.bbox) else {
                continue;
            };

            let sighting = Sighting {
                sighting_id: Uuid::new_v4().to_string(),
                person_id: person_id.clone(),
                camera_id: camera_id.to_string(),
                confidence: detection.recognition_confidence.unwrap_or(detection.confidence),
                timestamp: Utc::now(),
                face_bbox: detection.bbox.clone(),
                face_crop_jpeg: None,
                quality_score: frame_metadata.quality_score,
                source_type: SightingSourceType::CameraStream,
                frame_metadata: serde_json::to_value(frame_metadata).ok(),
            };

            match self.sighting_sender.try_send(PendingSighting { sighting, face_crop }) {
                Ok(()) => {
                    self.statistics.total_sightings_captured.fetch_add(1, Ordering::Relaxed);
                    self.statistics.queue_depth.fetch_add(1, Ordering::Relaxed);
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.statistics.total_sightings_captured.fetch_add(1, Ordering::Relaxed);
                    self.statistics.queue_full_drops.fetch_add(1, Ordering::Relaxed);
                    warn!("⚠️ [SIGHTING_CAPTURE]: Queue full. Dropping sighting for camera {}.", camera_id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    error!("💀 [SIGHTING_CAPTURE]: Queue channel collapsed. Sighting discarded.");
                }
            }
        }
    }

    /// Consumidor único: desprende una tarea de subida por avistamiento.
    async fn consume_sighting_queue(
        mut sighting_receiver: mpsc::Receiver<PendingSighting>,
        core_data_client: Arc<CoreDataClient>,
        notification_client: Arc<NotificationClient>,
        statistics: Arc<CaptureStatistics>,
    ) {
        info!("🛰️  [SIGHTING_CAPTURE]: Background queue consumer online.");

        while let Some(pending_sighting) = sighting_receiver.recv().await {
            statistics.queue_depth.fetch_sub(1, Ordering::Relaxed);

            let data_client = core_data_client.clone();
            let alert_client = notification_client.clone();
            let task_statistics = statistics.clone();

            tokio::spawn(async move {
                Self::upload_and_evaluate(pending_sighting, data_client, alert_client, task_statistics)
                    .await;
            });
        }

        info!("🛑 [SIGHTING_CAPTURE]: Queue consumer terminated.");
    }

    /// Tarea desprendida: codifica, persiste y dispara la evaluación.
    /// Los tres pasos son independientes; un fallo se cuenta y se absorbe.
    #[instrument(skip_all, fields(person = %pending_sighting.sighting.person_id))]
    async fn upload_and_evaluate(
        pending_sighting: PendingSighting,
        core_data_client: Arc<CoreDataClient>,
        notification_client: Arc<NotificationClient>,
        statistics: Arc<CaptureStatistics>,
    ) {
        let PendingSighting { mut sighting, face_crop } = pending_sighting;

        // (a) Codificación JPEG del recorte en el pool bloqueante.
        let encode_outcome =
            tokio::task::spawn_blocking(move || encode_frame_jpeg(&face_crop, CROP_JPEG_QUALITY))
                .await;

        match encode_outcome {
            Ok(Ok(jpeg_bytes)) => sighting.face_crop_jpeg = Some(jpeg_bytes),
            Ok(Err(encode_fault)) => {
                statistics.failed_uploads.fetch_add(1, Ordering::Relaxed);
                error!("❌ [SIGHTING_CAPTURE]: Crop encoding failed: {}", encode_fault);
                return;
            }
            Err(join_fault) => {
                statistics.failed_uploads.fetch_add(1, Ordering::Relaxed);
                error!("💀 [SIGHTING_CAPTURE]: Encoding task collapsed: {}", join_fault);
                return;
            }
        }

        // (b) Persistencia multipart en el servicio de datos.
        let assigned_sighting_id = match core_data_client.upload_sighting(&sighting).await {
            Ok(assigned_id) => {
                statistics.successful_uploads.fetch_add(1, Ordering::Relaxed);
                debug!("📦 [SIGHTING_CAPTURE]: Sighting persisted for person {}.", sighting.person_id);
                assigned_id
            }
            Err(persistence_fault) => {
                statistics.failed_uploads.fetch_add(1, Ordering::Relaxed);
                error!("❌ [SIGHTING_CAPTURE]: Upload failed: {}", persistence_fault);
                return;
            }
        };

        // (c) Disparo de la evaluación de alertas con el id asignado.
        match notification_client
            .trigger_alert_evaluation(&sighting, assigned_sighting_id.as_deref())
            .await
        {
            Ok(()) => {
                statistics.alert_evaluations_triggered.fetch_add(1, Ordering::Relaxed);
            }
            Err(evaluation_fault) => {
                statistics.alert_evaluation_failures.fetch_add(1, Ordering::Relaxed);
                warn!("⚠️ [SIGHTING_CAPTURE]: Alert evaluation trigger failed: {}", evaluation_fault);
            }
        }
    }

    /// Espera el drenaje de la cola hasta el periodo de gracia.
    pub async fn drain(&self, grace_period: Duration) {
        let drain_deadline = tokio::time::Instant::now() + grace_period;
        while self.statistics.queue_depth.load(Ordering::Relaxed) > 0 {
            if tokio::time::Instant::now() >= drain_deadline {
                warn!(
                    "⚠️ [SIGHTING_CAPTURE]: Drain grace expired with {} sightings in flight.",
                    self.statistics.queue_depth.load(Ordering::Relaxed)
                );
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    pub fn capture_statistics(&self) -> serde_json::Value {
        let total = self.statistics.total_sightings_captured.load(Ordering::Relaxed);
        let successful = self.statistics.successful_uploads.load(Ordering::Relaxed);
        let triggered = self.statistics.alert_evaluations_triggered.load(Ordering::Relaxed);

        serde_json::json!({
            "total_sightings_captured": total,
            "successful_uploads": successful,
            "failed_uploads": self.statistics.failed_uploads.load(Ordering::Relaxed),
            "success_rate_percent": if total > 0 { (successful as f64 / total as f64 * 10000.0).round() / 100.0 } else { 0.0 },
            "queue_full_drops": self.statistics.queue_full_drops.load(Ordering::Relaxed),
            "queue_size": self.statistics.queue_depth.load(Ordering::Relaxed),
            "alert_evaluations_triggered": triggered,
            "alert_evaluation_failures": self.statistics.alert_evaluation_failures.load(Ordering::Relaxed),
            "alert_success_rate_percent": if successful > 0 { (triggered as f64 / successful as f64 * 10000.0).round() / 100.0 } else { 0.0 },
        })
    }
}
