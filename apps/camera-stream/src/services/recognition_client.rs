// [apps/camera-stream/src/services/recognition_client.rs]
/*!
 * =================================================================
 * APARATO: RECOGNITION UPLINK SERVICE (V2.8 - NEURAL BRIDGE)
 * CLASIFICACIÓN: INTEGRATION SERVICE (ESTRATO L3-APP)
 * RESPONSABILIDAD: RECONOCIMIENTO FACIAL VÍA MOTOR EXTERNO Y CACHÉS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. RESULT DISCIPLINE: El fallo de reconocimiento es un VALOR
 *    (success=false); el orquestador publica igualmente el evento
 *    negativo al bus.
 * 2. CACHE FIRST: El hash perceptual del frame y el índice vectorial
 *    local cortocircuitan el viaje HTTP cuando la señal ya fue vista.
 * 3. RETRY CADENCE: Reintentos con retardo (attempt+1)·0.5s hasta
 *    agotar el presupuesto de integración.
 * =================================================================
 */

use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use faceguard_core_vector_index::{
    hash_embedding_quantized, RecognitionCacheRegistry, VectorIndex,
};
use faceguard_domain_models::{FaceDetection, FrameMetadata, RecognitionResult};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, error, instrument, warn};

use crate::config::Settings;

/// Contadores de rendimiento del enlace de reconocimiento.
#[derive(Debug, Default, Clone)]
pub struct UplinkStatistics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub cache_short_circuits: u64,
    pub total_processing_time_ms: f64,
    pub last_success_time: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Puente HTTP hacia el motor de reconocimiento con resolución local.
pub struct RecognitionUplink {
    network_session_client: Client,
    recognition_base_endpoint: String,
    retry_attempts: u32,
    cache_registry: Arc<RecognitionCacheRegistry>,
    vector_index: Arc<VectorIndex>,
    statistics: Mutex<UplinkStatistics>,
}

impl RecognitionUplink {
    pub fn new(
        settings: &Settings,
        cache_registry: Arc<RecognitionCacheRegistry>,
        vector_index: Arc<VectorIndex>,
    ) -> Self {
        let network_client = Client::builder()
            .timeout(Duration::from_secs(settings.integration_timeout_seconds))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .user_agent("FaceGuard-CameraStream/2.0")
            .build()
            .expect("FATAL: Recognition uplink client initialization failed.");

        Self {
            network_session_client: network_client,
            recognition_base_endpoint: settings
                .face_recognition_service_url
                .trim_end_matches('/')
                .to_string(),
            retry_attempts: settings.integration_retry_attempts.max(1),
            cache_registry,
            vector_index,
            statistics: Mutex::new(UplinkStatistics::default()),
        }
    }

    /// Procesa un frame ya codificado, con reintentos y cortocircuito de caché.
    /// Devuelve SIEMPRE un RecognitionResult; el último fallo viaja como valor.
    #[instrument(skip(self, jpeg_bytes, frame_perceptual_hash), fields(frame = %frame_metadata.frame_id))]
    pub async fn process_encoded_frame(
        &self,
        jpeg_bytes: Vec<u8>,
        frame_perceptual_hash: String,
        frame_metadata: &FrameMetadata,
        confidence_threshold: f64,
    ) -> RecognitionResult {
        // 1. CORTOCIRCUITO: frame perceptualmente idéntico ya resuelto.
        if let Some(cached_payload) = self.cache_registry.processed_image.get(&frame_perceptual_hash)
        {
            if let Ok(persons) = serde_json::from_value::<Vec<FaceDetection>>(
                cached_payload["persons_detected"].clone(),
            ) {
                let mut statistics_guard = self.statistics.lock().expect("stats lock poisoned");
                statistics_guard.cache_short_circuits += 1;
                debug!("⚡ [RECOGNITION_UPLINK]: Perceptual cache hit for frame {}.", frame_metadata.frame_id);

                return RecognitionResult {
                    success: true,
                    persons_detected: persons,
                    processing_time_ms: 0.0,
                    confidence_threshold,
                    frame_id: frame_metadata.frame_id.clone(),
                    timestamp: Utc::now(),
                    error: None,
                };
            }
        }

        // 2. VIAJE AL MOTOR CON CADENCIA DE REINTENTO.
        let mut final_result =
            self.submit_to_engine(&jpeg_bytes, frame_metadata, confidence_threshold).await;

        let mut attempt_number: u32 = 0;
        while !final_result.success && attempt_number + 1 < self.retry_attempts {
            attempt_number += 1;
            let retry_delay = Duration::from_millis(500 * u64::from(attempt_number));
            debug!(
                "🔁 [RECOGNITION_UPLINK]: Attempt {} failed for frame {}. Retrying in {:?}.",
                attempt_number, frame_metadata.frame_id, retry_delay
            );
            tokio::time::sleep(retry_delay).await;
            final_result =
                self.submit_to_engine(&jpeg_bytes, frame_metadata, confidence_threshold).await;
        }

        if final_result.success {
            // 3. RESOLUCIÓN LOCAL: embeddings sin identidad contra la galería.
            self.resolve_identities_locally(&mut final_result, confidence_threshold);

            // 4. SELLADO DE CACHÉS.
            self.cache_registry.processed_image.put(
                frame_perceptual_hash,
                serde_json::json!({
                    "persons_detected": final_result.persons_detected,
                    "engine_processing_time_ms": final_result.processing_time_ms,
                }),
            );
        } else {
            error!(
                "❌ [RECOGNITION_UPLINK]: Recognition failed after {} attempts for frame {}.",
                self.retry_attempts, frame_metadata.frame_id
            );
        }

        final_result
    }

    /// Un único viaje HTTP al motor; los fallos colapsan a success=false.
    async fn submit_to_engine(
        &self,
        jpeg_bytes: &[u8],
        frame_metadata: &FrameMetadata,
        confidence_threshold: f64,
    ) -> RecognitionResult {
        let submission_started = Instant::now();
        {
            let mut statistics_guard = self.statistics.lock().expect("stats lock poisoned");
            statistics_guard.total_requests += 1;
        }

        let frame_part = match Part::bytes(jpeg_bytes.to_vec())
            .file_name(format!("frame_{}.jpg", frame_metadata.frame_id))
            .mime_str("image/jpeg")
        {
            Ok(part) => part,
            Err(mime_fault) => {
                return self.register_failure(
                    frame_metadata,
                    confidence_threshold,
                    submission_started,
                    format!("multipart assembly failed: {mime_fault}"),
                );
            }
        };

        let target_url = format!("{}/process/image/", self.recognition_base_endpoint);
        let network_response = self
            .network_session_client
            .post(&target_url)
            .multipart(Form::new().part("file", frame_part))
            .send()
            .await;

        let elapsed_ms = submission_started.elapsed().as_secs_f64() * 1000.0;

        match network_response {
            Ok(response) if response.status().is_success() => {
                let body: serde_json::Value = match response.json().await {
                    Ok(body) => body,
                    Err(decode_fault) => {
                        return self.register_failure(
                            frame_metadata,
                            confidence_threshold,
                            submission_started,
                            format!("engine body undecodable: {decode_fault}"),
                        );
                    }
                };

                let persons_detected: Vec<FaceDetection> =
                    serde_json::from_value(body["recognized_faces"].clone()).unwrap_or_default();

                let mut statistics_guard = self.statistics.lock().expect("stats lock poisoned");
                statistics_guard.successful_requests += 1;
                statistics_guard.total_processing_time_ms += elapsed_ms;
                statistics_guard.last_success_time = Some(Utc::now());

                RecognitionResult {
                    success: true,
                    persons_detected,
                    processing_time_ms: elapsed_ms,
                    confidence_threshold,
                    frame_id: frame_metadata.frame_id.clone(),
                    timestamp: Utc::now(),
                    error: None,
                }
            }
            Ok(response) => {
                let status_code = response.status();
                let diagnostic_body = response.text().await.unwrap_or_default();
                self.register_failure(
                    frame_metadata,
                    confidence_threshold,
                    submission_started,
                    format!("engine rejection HTTP_{status_code}: {diagnostic_body}"),
                )
            }
            Err(transport_fault) => self.register_failure(
                frame_metadata,
                confidence_threshold,
                submission_started,
                format!("engine uplink severed: {transport_fault}"),
            ),
        }
    }

    /// Resuelve identidades pendientes contra el índice vectorial local.
    fn resolve_identities_locally(&self, result: &mut RecognitionResult, confidence_threshold: f64) {
        for detection in &mut result.persons_detected {
            if detection.person_id.is_some() {
                continue;
            }
            let Some(embedding) = &detection.embedding else { continue };

            let embedding_hash = hash_embedding_quantized(embedding);
            if let Some(cached_verdict) = self.cache_registry.recognition_result.get(&embedding_hash)
            {
                detection.person_id =
                    cached_verdict["person_id"].as_str().map(|s| s.to_string());
                detection.recognition_confidence = cached_verdict["max_similarity"].as_f64();
                continue;
            }

            match self.vector_index.search_person(embedding, confidence_threshold as f32) {
                Ok(Some(person_match)) => {
                    self.cache_registry.recognition_result.put(
                        embedding_hash.clone(),
                        serde_json::json!({
                            "person_id": person_match.person_id,
                            "max_similarity": person_match.max_similarity,
                            "mean_similarity": person_match.mean_similarity,
                        }),
                    );
                    self.cache_registry.embedding.put(embedding_hash, embedding.clone());

                    detection.recognition_confidence = Some(person_match.max_similarity as f64);
                    detection.person_id = Some(person_match.person_id);
                }
                Ok(None) => {}
                Err(index_fault) => {
                    warn!("⚠️ [RECOGNITION_UPLINK]: Local gallery lookup failed: {}", index_fault);
                }
            }
        }
    }

    fn register_failure(
        &self,
        frame_metadata: &FrameMetadata,
        confidence_threshold: f64,
        submission_started: Instant,
        error_description: String,
    ) -> RecognitionResult {
        let mut statistics_guard = self.statistics.lock().expect("stats lock poisoned");
        statistics_guard.failed_requests += 1;
        statistics_guard.last_error = Some(error_description.clone());

        RecognitionResult::failure(
            frame_metadata.frame_id.clone(),
            confidence_threshold,
            submission_started.elapsed().as_secs_f64() * 1000.0,
            error_description,
        )
    }

    /// Verifica la visibilidad del motor para la superficie de salud.
    pub async fn probe_engine_connectivity(&self) -> bool {
        let health_url = format!("{}/health", self.recognition_base_endpoint);
        matches!(
            self.network_session_client.get(&health_url).send().await,
            Ok(response) if response.status().is_success()
        )
    }

    pub fn performance_statistics(&self) -> serde_json::Value {
        let statistics_guard = self.statistics.lock().expect("stats lock poisoned");
        let success_rate = if statistics_guard.total_requests > 0 {
            statistics_guard.successful_requests as f64 / statistics_guard.total_requests as f64
                * 100.0
        } else {
            0.0
        };
        let avg_processing_ms = if statistics_guard.successful_requests > 0 {
            statistics_guard.total_processing_time_ms
                / statistics_guard.successful_requests as f64
        } else {
            0.0
        };

        serde_json::json!({
            "total_requests": statistics_guard.total_requests,
            "successful_requests": statistics_guard.successful_requests,
            "failed_requests": statistics_guard.failed_requests,
            "cache_short_circuits": statistics_guard.cache_short_circuits,
            "success_rate_percent": (success_rate * 100.0).round() / 100.0,
            "avg_processing_time_ms": (avg_processing_ms * 100.0).round() / 100.0,
            "last_success_time": statistics_guard.last_success_time.map(|t| t.to_rfc3339()),
            "last_error": statistics_guard.last_error,
            "engine_url": self.recognition_base_endpoint,
        })
    }
}
