// [apps/camera-stream/src/services/camera_manager.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN CAMERA MANAGER (V3.4 - ORCHESTRATION MASTER)
 * CLASIFICACIÓN: APPLICATION ORCHESTRATOR (ESTRATO L4-APP)
 * RESPONSABILIDAD: BUCLES DE STREAM, RECONEXIÓN Y VIGILANCIA DE SALUD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ONE TASK PER CAMERA: Cada cámara activa posee una tarea
 *    cooperativa exclusiva; la captura bloqueante se delega al pool
 *    acotado para no detener jamás el reactor.
 * 2. RECONNECT DOCTRINE: Fallo de captura con presupuesto restante
 *    duerme reconnect_delay y reintenta; presupuesto agotado termina
 *    el bucle y deja el rastro en last_error.
 * 3. HEALTH SENTINEL: Daemon periódico que resucita cámaras en error
 *    y degrada a error los streams sin frames por más de 30s.
 *
 * # Mathematical Proof (Frame Pacing):
 * sleep(max(0, frame_interval − processing_time)) garantiza que la
 * cadencia efectiva nunca supere la tasa objetivo y que un frame
 * lento no acumule deuda de tiempo en el bucle.
 * =================================================================
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use faceguard_core_vector_index::hash_frame_perceptual;
use faceguard_domain_models::{
    CameraConfiguration, CameraInfo, CameraStatus, FrameMetadata, StreamStatus,
};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::services::event_publisher::EventPublisher;
use crate::services::frame_source::{
    assess_frame_quality, detect_source_kind, encode_frame_jpeg, CaptureError, FfmpegFrameSource,
    FrameGrabber, RawFrame, SyntheticFrameSource,
};
use crate::services::recognition_client::RecognitionUplink;
use crate::services::sighting_queue::AsyncSightingCapture;

/// Umbral de confianza por defecto entregado al motor de reconocimiento.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Calidad JPEG de los frames enviados al motor.
const RECOGNITION_JPEG_QUALITY: u8 = 85;

/// Antigüedad máxima del último frame antes de degradar a error.
const STALE_FRAME_TIMEOUT_SECONDS: i64 = 30;

// --- ESTRATO DE POOL DE TRABAJADORES BLOQUEANTES ---

/// Pool acotado para operaciones bloqueantes (captura, encode, calidad).
/// Tamaño = max_concurrent_cameras; el reactor cooperativo nunca se detiene.
pub struct CaptureWorkerPool {
    execution_permits: Arc<Semaphore>,
}

impl CaptureWorkerPool {
    pub fn new(max_concurrent_workers: usize) -> Arc<Self> {
        Arc::new(Self { execution_permits: Arc::new(Semaphore::new(max_concurrent_workers.max(1))) })
    }

    /// Ejecuta la tarea bloqueante bajo permiso del pool.
    ///
    /// # Errors:
    /// `Capture` si la tarea colapsa (pánico) dentro del hilo bloqueante.
    pub async fn run<F, R>(&self, blocking_task: F) -> Result<R, CaptureError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let execution_permit = self
            .execution_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| CaptureError::Capture("worker pool closed".to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _held_permit = execution_permit;
            blocking_task()
        })
        .await
        .map_err(|join_fault| CaptureError::Capture(format!("worker task collapsed: {join_fault}")))
    }
}

// --- ESTRATO DE CONEXIÓN INDIVIDUAL ---

struct CameraRuntime {
    grabber: Option<Box<dyn FrameGrabber>>,
    status: CameraStatus,
    stream_status: StreamStatus,
    last_frame_time: Option<DateTime<Utc>>,
    frames_processed: u64,
    errors_count: u64,
    last_error: Option<String>,
    reconnect_attempts: u32,
    created_at: DateTime<Utc>,
}

/// Conexión exclusiva a una cámara: handle físico + telemetría de runtime.
pub struct CameraConnection {
    configuration: std::sync::RwLock<CameraConfiguration>,
    runtime: Mutex<CameraRuntime>,
}

impl CameraConnection {
    pub fn new(configuration: CameraConfiguration) -> Arc<Self> {
        Arc::new(Self {
            configuration: std::sync::RwLock::new(configuration),
            runtime: Mutex::new(CameraRuntime {
                grabber: None,
                status: CameraStatus::Disconnected,
                stream_status: StreamStatus::Stopped,
                last_frame_time: None,
                frames_processed: 0,
                errors_count: 0,
                last_error: None,
                reconnect_attempts: 0,
                created_at: Utc::now(),
            }),
        })
    }

    pub fn configuration_snapshot(&self) -> CameraConfiguration {
        self.configuration.read().expect("configuration lock poisoned").clone()
    }

    fn build_grabber(configuration: &CameraConfiguration) -> Box<dyn FrameGrabber> {
        if configuration.source.starts_with("synthetic") {
            Box::new(SyntheticFrameSource::new(
                configuration.resolution_width,
                configuration.resolution_height,
            ))
        } else {
            Box::new(FfmpegFrameSource::new(
                &configuration.source,
                configuration.resolution_width,
                configuration.resolution_height,
                configuration.frame_rate,
            ))
        }
    }

    /// Establece el enlace físico. Bloqueante: ejecutar en el pool.
    pub fn connect(&self) -> Result<(), CaptureError> {
        let configuration = self.configuration_snapshot();
        let mut runtime_guard = self.runtime.lock().expect("runtime lock poisoned");
        runtime_guard.status = CameraStatus::Connecting;

        let mut grabber = Self::build_grabber(&configuration);
        match grabber.open() {
            Ok(()) => {
                runtime_guard.grabber = Some(grabber);
                runtime_guard.status = CameraStatus::Connected;
                runtime_guard.reconnect_attempts = 0;
                runtime_guard.last_error = None;
                info!("🎥 [CAMERA_MANAGER]: Camera {} connected.", configuration.camera_id);
                Ok(())
            }
            Err(connect_fault) => {
                runtime_guard.status = CameraStatus::Error;
                runtime_guard.errors_count += 1;
                runtime_guard.last_error = Some(connect_fault.to_string());
                error!(
                    "❌ [CAMERA_MANAGER]: Camera {} connection failed: {}",
                    configuration.camera_id, connect_fault
                );
                Err(connect_fault)
            }
        }
    }

    /// Libera el handle físico. Bloqueante: ejecutar en el pool.
    pub fn disconnect(&self) {
        let mut runtime_guard = self.runtime.lock().expect("runtime lock poisoned");
        if let Some(mut grabber) = runtime_guard.grabber.take() {
            grabber.release();
        }
        runtime_guard.status = CameraStatus::Disconnected;
    }

    /// Captura un frame con metadatos. Bloqueante: ejecutar en el pool.
    pub fn capture_frame(&self) -> Result<(RawFrame, FrameMetadata), CaptureError> {
        let camera_id = self.configuration_snapshot().camera_id;
        let mut runtime_guard = self.runtime.lock().expect("runtime lock poisoned");

        let grabber = runtime_guard.grabber.as_mut().ok_or_else(|| {
            CaptureError::Capture("capture handle is closed".to_string())
        })?;

        match grabber.grab() {
            Ok(frame) => {
                let capture_timestamp = Utc::now();
                let metadata = FrameMetadata {
                    frame_id: Uuid::new_v4().to_string(),
                    camera_id,
                    timestamp: capture_timestamp,
                    frame_number: runtime_guard.frames_processed,
                    width: frame.width,
                    height: frame.height,
                    channels: RawFrame::CHANNELS,
                    file_size: frame.byte_size(),
                    quality_score: None,
                    quality_grade: None,
                };

                runtime_guard.frames_processed += 1;
                runtime_guard.last_frame_time = Some(capture_timestamp);
                runtime_guard.status = CameraStatus::Connected;

                Ok((frame, metadata))
            }
            Err(capture_fault) => {
                runtime_guard.status = CameraStatus::Error;
                runtime_guard.errors_count += 1;
                runtime_guard.last_error = Some(capture_fault.to_string());
                Err(capture_fault)
            }
        }
    }

    pub fn mark_error(&self, error_description: &str) {
        let mut runtime_guard = self.runtime.lock().expect("runtime lock poisoned");
        runtime_guard.status = CameraStatus::Error;
        runtime_guard.errors_count += 1;
        runtime_guard.last_error = Some(error_description.to_string());
    }

    pub fn set_stream_status(&self, stream_status: StreamStatus) {
        let mut runtime_guard = self.runtime.lock().expect("runtime lock poisoned");
        runtime_guard.stream_status = stream_status;
    }

    pub fn register_reconnect_attempt(&self) -> u32 {
        let mut runtime_guard = self.runtime.lock().expect("runtime lock poisoned");
        runtime_guard.reconnect_attempts += 1;
        runtime_guard.reconnect_attempts
    }

    pub fn current_status(&self) -> CameraStatus {
        self.runtime.lock().expect("runtime lock poisoned").status
    }

    pub fn current_reconnect_attempts(&self) -> u32 {
        self.runtime.lock().expect("runtime lock poisoned").reconnect_attempts
    }

    pub fn last_frame_time(&self) -> Option<DateTime<Utc>> {
        self.runtime.lock().expect("runtime lock poisoned").last_frame_time
    }

    pub fn snapshot_info(&self) -> CameraInfo {
        let configuration = self.configuration_snapshot();
        let runtime_guard = self.runtime.lock().expect("runtime lock poisoned");

        CameraInfo {
            camera_id: configuration.camera_id.clone(),
            configuration: configuration.clone(),
            status: runtime_guard.status,
            stream_status: runtime_guard.stream_status,
            last_frame_time: runtime_guard.last_frame_time,
            frames_processed: runtime_guard.frames_processed,
            errors_count: runtime_guard.errors_count,
            last_error: runtime_guard.last_error.clone(),
            reconnect_attempts: runtime_guard.reconnect_attempts,
            uptime_seconds: (Utc::now() - runtime_guard.created_at).num_seconds(),
            created_at: runtime_guard.created_at,
            updated_at: Utc::now(),
        }
    }
}

// --- ESTRATO DE ORQUESTACIÓN GLOBAL ---

/// Banderas cooperativas de control del bucle de stream.
struct StreamControlFlag {
    running: AtomicBool,
    paused: AtomicBool,
}

/// Orquestador soberano de cámaras: registro, bucles y vigilancia.
pub struct CameraManager {
    settings: Arc<Settings>,
    cameras: RwLock<HashMap<String, Arc<CameraConnection>>>,
    stream_flags: RwLock<HashMap<String, Arc<StreamControlFlag>>>,
    worker_pool: Arc<CaptureWorkerPool>,
    recognition_uplink: Option<Arc<RecognitionUplink>>,
    event_publisher: Arc<EventPublisher>,
    sighting_capture: Arc<AsyncSightingCapture>,
    total_frames_processed: AtomicU64,
    total_errors: AtomicU64,
    start_time: DateTime<Utc>,
    health_monitor_handle: Mutex<Option<JoinHandle<()>>>,
}

impl CameraManager {
    pub fn ignite(
        settings: Arc<Settings>,
        worker_pool: Arc<CaptureWorkerPool>,
        recognition_uplink: Option<Arc<RecognitionUplink>>,
        event_publisher: Arc<EventPublisher>,
        sighting_capture: Arc<AsyncSightingCapture>,
    ) -> Arc<Self> {
        Arc::new(Self {
            settings,
            cameras: RwLock::new(HashMap::new()),
            stream_flags: RwLock::new(HashMap::new()),
            worker_pool,
            recognition_uplink,
            event_publisher,
            sighting_capture,
            total_frames_processed: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            start_time: Utc::now(),
            health_monitor_handle: Mutex::new(None),
        })
    }

    /// Registra las cámaras del entorno y enciende el centinela de salud.
    pub async fn initialize(self: &Arc<Self>) {
        info!("🛰️  [CAMERA_MANAGER]: Initializing with {} configured sources.", self.settings.camera_sources.len());

        let registered_sources: Vec<String> = if self.settings.enable_multi_camera {
            self.settings.camera_sources.clone()
        } else {
            self.settings.camera_sources.iter().take(1).cloned().collect()
        };

        for (source_index, source) in registered_sources.iter().enumerate() {
            let camera_id = format!("camera_{source_index}");
            if let Err(registration_fault) = self
                .add_camera_with_id(camera_id.clone(), source, &format!("Camera {}", source_index + 1), None)
                .await
            {
                warn!("⚠️ [CAMERA_MANAGER]: Source '{}' rejected: {}", source, registration_fault);
            }
        }

        if self.settings.enable_health_monitoring {
            let monitor_handle = self.clone().spawn_health_monitor();
            *self.health_monitor_handle.lock().expect("monitor lock poisoned") = Some(monitor_handle);
        }

        info!("✅ [CAMERA_MANAGER]: Initialized with {} cameras.", self.cameras.read().await.len());
    }

    /// Alta de cámara serializada con los bucles a través del registro.
    pub async fn add_camera(
        &self,
        source: &str,
        name: &str,
        location: Option<String>,
    ) -> Result<String, String> {
        let camera_id = format!("camera_{}", self.cameras.read().await.len());
        self.add_camera_with_id(camera_id, source, name, location).await
    }

    async fn add_camera_with_id(
        &self,
        camera_id: String,
        source: &str,
        name: &str,
        location: Option<String>,
    ) -> Result<String, String> {
        if source.trim().is_empty() {
            return Err("camera source must not be empty".to_string());
        }

        let mut cameras_guard = self.cameras.write().await;
        if cameras_guard.contains_key(&camera_id) {
            return Err(format!("camera '{camera_id}' already registered"));
        }

        let configuration = CameraConfiguration {
            camera_id: camera_id.clone(),
            source: source.trim().to_string(),
            source_kind: detect_source_kind(source),
            name: name.to_string(),
            location,
            resolution_width: self.settings.camera_resolution_width,
            resolution_height: self.settings.camera_resolution_height,
            frame_rate: self.settings.camera_frame_rate,
            enabled: true,
            auto_reconnect: true,
            reconnect_attempts: self.settings.camera_reconnect_attempts,
            reconnect_delay_seconds: self.settings.camera_reconnect_delay_seconds,
        };

        cameras_guard.insert(camera_id.clone(), CameraConnection::new(configuration));
        self.stream_flags.write().await.insert(
            camera_id.clone(),
            Arc::new(StreamControlFlag { running: AtomicBool::new(false), paused: AtomicBool::new(false) }),
        );

        info!("➕ [CAMERA_MANAGER]: Registered camera {} ({}).", camera_id, source);
        Ok(camera_id)
    }

    /// Baja de cámara: detiene el bucle, libera el handle y purga el registro.
    pub async fn remove_camera(&self, camera_id: &str) -> bool {
        self.stop_stream(camera_id).await;

        let removed_camera = self.cameras.write().await.remove(camera_id);
        self.stream_flags.write().await.remove(camera_id);

        match removed_camera {
            Some(camera) => {
                let _ = self.worker_pool.run(move || camera.disconnect()).await;
                info!("➖ [CAMERA_MANAGER]: Camera {} removed.", camera_id);
                true
            }
            None => false,
        }
    }

    pub async fn connect_camera(&self, camera_id: &str) -> Result<(), String> {
        let camera = self.camera_by_id(camera_id).await.ok_or_else(|| format!("camera '{camera_id}' not found"))?;
        self.worker_pool
            .run(move || camera.connect())
            .await
            .map_err(|pool_fault| pool_fault.to_string())?
            .map_err(|connect_fault| connect_fault.to_string())
    }

    pub async fn disconnect_camera(&self, camera_id: &str) -> Result<(), String> {
        self.stop_stream(camera_id).await;
        let camera = self.camera_by_id(camera_id).await.ok_or_else(|| format!("camera '{camera_id}' not found"))?;
        let _ = self.worker_pool.run(move || camera.disconnect()).await;
        Ok(())
    }

    /// Enciende el bucle de procesamiento de una cámara.
    pub async fn start_stream(self: &Arc<Self>, camera_id: &str) -> Result<(), String> {
        let camera = self.camera_by_id(camera_id).await.ok_or_else(|| format!("camera '{camera_id}' not found"))?;
        let control_flag = self.flag_by_id(camera_id).await.ok_or_else(|| format!("camera '{camera_id}' not found"))?;

        if control_flag.running.load(Ordering::SeqCst) {
            warn!("⚠️ [CAMERA_MANAGER]: Stream for {} already running.", camera_id);
            control_flag.paused.store(false, Ordering::SeqCst);
            return Ok(());
        }

        if camera.current_status() != CameraStatus::Connected {
            self.connect_camera(camera_id).await?;
        }

        control_flag.running.store(true, Ordering::SeqCst);
        control_flag.paused.store(false, Ordering::SeqCst);
        camera.set_stream_status(StreamStatus::Active);

        let orchestrator = self.clone();
        let camera_for_loop = camera.clone();
        let flag_for_loop = control_flag.clone();
        tokio::spawn(async move {
            orchestrator.stream_processing_loop(camera_for_loop, flag_for_loop).await;
        });

        info!("▶️  [CAMERA_MANAGER]: Stream started for {}.", camera_id);
        Ok(())
    }

    pub async fn stop_stream(&self, camera_id: &str) {
        if let Some(control_flag) = self.flag_by_id(camera_id).await {
            control_flag.running.store(false, Ordering::SeqCst);
            control_flag.paused.store(false, Ordering::SeqCst);
        }
        if let Some(camera) = self.camera_by_id(camera_id).await {
            camera.set_stream_status(StreamStatus::Stopped);
        }
    }

    pub async fn pause_stream(&self, camera_id: &str) -> bool {
        match self.flag_by_id(camera_id).await {
            Some(control_flag) if control_flag.running.load(Ordering::SeqCst) => {
                control_flag.paused.store(true, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }

    pub async fn resume_stream(&self, camera_id: &str) -> bool {
        match self.flag_by_id(camera_id).await {
            Some(control_flag) if control_flag.running.load(Ordering::SeqCst) => {
                control_flag.paused.store(false, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }

    pub async fn start_all_streams(self: &Arc<Self>) {
        let enabled_camera_ids: Vec<String> = {
            let cameras_guard = self.cameras.read().await;
            cameras_guard
                .iter()
                .filter(|(_, camera)| camera.configuration_snapshot().enabled)
                .map(|(camera_id, _)| camera_id.clone())
                .collect()
        };

        for camera_id in enabled_camera_ids {
            if let Err(start_fault) = self.start_stream(&camera_id).await {
                warn!("⚠️ [CAMERA_MANAGER]: Stream ignition failed for {}: {}", camera_id, start_fault);
            }
        }
    }

    pub async fn stop_all_streams(&self) {
        let camera_ids: Vec<String> = self.cameras.read().await.keys().cloned().collect();
        for camera_id in camera_ids {
            self.stop_stream(&camera_id).await;
        }
    }

    /// Bucle principal de una cámara: captura -> calidad -> reconocimiento
    /// -> encolado no bloqueante -> evento -> cadencia.
    #[instrument(skip_all, fields(camera = %camera.configuration_snapshot().camera_id))]
    async fn stream_processing_loop(
        self: Arc<Self>,
        camera: Arc<CameraConnection>,
        control_flag: Arc<StreamControlFlag>,
    ) {
        let camera_id = camera.configuration_snapshot().camera_id;
        info!("🔄 [STREAM_LOOP]: Processing loop ignited for {}.", camera_id);

        let mut terminated_by_failure = false;

        while control_flag.running.load(Ordering::SeqCst) {
            if control_flag.paused.load(Ordering::SeqCst) {
                camera.set_stream_status(StreamStatus::Paused);
                tokio::time::sleep(Duration::from_millis(200)).await;
                continue;
            }
            camera.set_stream_status(StreamStatus::Active);

            let loop_started = Instant::now();
            let configuration = camera.configuration_snapshot();
            let frame_interval = Duration::from_secs_f64(1.0 / configuration.frame_rate.max(1) as f64);

            // (a) CAPTURA BLOQUEANTE DELEGADA AL POOL.
            let camera_for_capture = camera.clone();
            let capture_outcome = match self.worker_pool.run(move || camera_for_capture.capture_frame()).await {
                Ok(inner_result) => inner_result,
                Err(pool_fault) => Err(pool_fault),
            };

            let (mut frame, mut metadata) = match capture_outcome {
                Ok(captured_pair) => captured_pair,
                Err(capture_fault) => {
                    self.total_errors.fetch_add(1, Ordering::Relaxed);

                    // (b) POLÍTICA DE RECONEXIÓN.
                    if configuration.auto_reconnect
                        && camera.current_reconnect_attempts() < configuration.reconnect_attempts
                    {
                        let attempt_number = camera.register_reconnect_attempt();
                        warn!(
                            "🔌 [STREAM_LOOP]: Capture fault on {} ({}). Reconnect attempt {}/{}.",
                            camera_id, capture_fault, attempt_number, configuration.reconnect_attempts
                        );
                        tokio::time::sleep(Duration::from_secs(configuration.reconnect_delay_seconds)).await;
                        let camera_for_reconnect = camera.clone();
                        let _ = self.worker_pool.run(move || camera_for_reconnect.connect()).await;
                        continue;
                    }

                    error!("💀 [STREAM_LOOP]: Camera {} exhausted reconnect budget. Terminating loop.", camera_id);
                    terminated_by_failure = true;
                    break;
                }
            };

            // (c) COMPUERTA DE CALIDAD.
            if self.settings.enable_frame_quality_check {
                let quality_outcome = self
                    .worker_pool
                    .run(move || {
                        let (quality_score, quality_grade) = assess_frame_quality(&frame);
                        (frame, quality_score, quality_grade)
                    })
                    .await;

                match quality_outcome {
                    Ok((frame_returned, quality_score, quality_grade)) => {
                        frame = frame_returned;
                        metadata.quality_score = Some(quality_score);
                        metadata.quality_grade = Some(quality_grade);

                        // (d) Frame por debajo del umbral: descarte silencioso.
                        if quality_score < self.settings.frame_quality_threshold {
                            trace!("🗑️  [STREAM_LOOP]: Frame below quality gate ({:.3}).", quality_score);
                            Self::pace_loop(loop_started, frame_interval).await;
                            continue;
                        }
                    }
                    Err(quality_fault) => {
                        warn!("⚠️ [STREAM_LOOP]: Quality assessment collapsed: {}", quality_fault);
                        Self::pace_loop(loop_started, frame_interval).await;
                        continue;
                    }
                }
            }

            // (e) RECONOCIMIENTO: el fallo viaja como valor y se tolera.
            if let Some(recognition_uplink) = &self.recognition_uplink {
                let encode_outcome = self
                    .worker_pool
                    .run(move || {
                        let jpeg_result = encode_frame_jpeg(&frame, RECOGNITION_JPEG_QUALITY);
                        let perceptual_hash =
                            hash_frame_perceptual(&frame.pixels, frame.width, frame.height);
                        (frame, jpeg_result, perceptual_hash)
                    })
                    .await;

                if let Ok((frame_returned, Ok(jpeg_bytes), perceptual_hash)) = encode_outcome {
                    frame = frame_returned;

                    let recognition_result = recognition_uplink
                        .process_encoded_frame(
                            jpeg_bytes,
                            perceptual_hash,
                            &metadata,
                            DEFAULT_CONFIDENCE_THRESHOLD,
                        )
                        .await;

                    // (f) ENCOLADO NO BLOQUEANTE + EVENTO AL BUS.
                    if recognition_result.success && !recognition_result.persons_detected.is_empty() {
                        self.sighting_capture.capture_async(
                            &recognition_result,
                            &camera_id,
                            &frame,
                            &metadata,
                        );
                    }

                    if self.settings.enable_event_publishing {
                        self.event_publisher
                            .publish_recognition_event(&camera_id, &recognition_result, &metadata)
                            .await;
                    }
                } else {
                    self.total_errors.fetch_add(1, Ordering::Relaxed);
                    debug!("⚠️ [STREAM_LOOP]: Frame encode failed for {}; frame skipped.", camera_id);
                }
            }

            self.total_frames_processed.fetch_add(1, Ordering::Relaxed);

            // (g) CADENCIA: nunca dormir tiempo negativo.
            Self::pace_loop(loop_started, frame_interval).await;
        }

        control_flag.running.store(false, Ordering::SeqCst);
        camera.set_stream_status(if terminated_by_failure { StreamStatus::Error } else { StreamStatus::Stopped });
        info!("🛑 [STREAM_LOOP]: Processing loop ended for {}.", camera_id);
    }

    async fn pace_loop(loop_started: Instant, frame_interval: Duration) {
        let elapsed = loop_started.elapsed();
        if frame_interval > elapsed {
            tokio::time::sleep(frame_interval - elapsed).await;
        }
    }

    /// Centinela de salud: resucita cámaras en error con presupuesto y
    /// degrada a error los streams con frames añejos (> 30s).
    fn spawn_health_monitor(self: Arc<Self>) -> JoinHandle<()> {
        let scan_interval = Duration::from_secs(self.settings.camera_health_check_interval_seconds);

        tokio::spawn(async move {
            info!("💓 [HEALTH_SENTINEL]: Camera health monitor online (every {:?}).", scan_interval);
            let mut interval_timer = tokio::time::interval(scan_interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval_timer.tick().await;

                let camera_snapshot: Vec<(String, Arc<CameraConnection>)> = {
                    let cameras_guard = self.cameras.read().await;
                    cameras_guard.iter().map(|(id, cam)| (id.clone(), cam.clone())).collect()
                };

                for (camera_id, camera) in camera_snapshot {
                    let configuration = camera.configuration_snapshot();

                    // 1. RESURRECCIÓN: error con presupuesto de reconexión.
                    if camera.current_status() == CameraStatus::Error
                        && configuration.auto_reconnect
                        && camera.current_reconnect_attempts() < configuration.reconnect_attempts
                    {
                        info!("💓 [HEALTH_SENTINEL]: Resurrecting camera {}.", camera_id);
                        camera.register_reconnect_attempt();
                        let camera_for_reconnect = camera.clone();
                        let _ = self.worker_pool.run(move || camera_for_reconnect.connect()).await;
                    }

                    // 2. FRAMES AÑEJOS: sin señal por más de 30 segundos.
                    if let Some(last_frame_time) = camera.last_frame_time() {
                        let staleness = Utc::now() - last_frame_time;
                        if staleness.num_seconds() > STALE_FRAME_TIMEOUT_SECONDS
                            && camera.current_status() == CameraStatus::Connected
                        {
                            warn!("⏳ [HEALTH_SENTINEL]: Camera {} stale ({}s without frames).", camera_id, staleness.num_seconds());
                            camera.mark_error("Frame timeout");
                        }
                    }
                }
            }
        })
    }

    /// Captura puntual para el endpoint de reconocimiento one-shot.
    pub async fn capture_single_frame(
        &self,
        camera_id: &str,
    ) -> Result<(RawFrame, FrameMetadata), String> {
        let camera = self.camera_by_id(camera_id).await.ok_or_else(|| format!("camera '{camera_id}' not found"))?;

        if camera.current_status() != CameraStatus::Connected {
            let camera_for_connect = camera.clone();
            self.worker_pool
                .run(move || camera_for_connect.connect())
                .await
                .map_err(|pool_fault| pool_fault.to_string())?
                .map_err(|connect_fault| connect_fault.to_string())?;
        }

        self.worker_pool
            .run(move || camera.capture_frame())
            .await
            .map_err(|pool_fault| pool_fault.to_string())?
            .map_err(|capture_fault| capture_fault.to_string())
    }

    pub async fn update_camera(
        &self,
        camera_id: &str,
        name: Option<String>,
        location: Option<String>,
        enabled: Option<bool>,
        frame_rate: Option<u32>,
    ) -> bool {
        let Some(camera) = self.camera_by_id(camera_id).await else { return false };
        let mut configuration_guard = camera.configuration.write().expect("configuration lock poisoned");

        if let Some(new_name) = name {
            configuration_guard.name = new_name;
        }
        if let Some(new_location) = location {
            configuration_guard.location = Some(new_location);
        }
        if let Some(new_enabled) = enabled {
            configuration_guard.enabled = new_enabled;
        }
        if let Some(new_frame_rate) = frame_rate {
            configuration_guard.frame_rate = new_frame_rate.clamp(1, 30);
        }
        true
    }

    pub async fn camera_info(&self, camera_id: &str) -> Option<CameraInfo> {
        Some(self.camera_by_id(camera_id).await?.snapshot_info())
    }

    pub async fn all_cameras_info(&self) -> Vec<CameraInfo> {
        let cameras_guard = self.cameras.read().await;
        let mut camera_table: Vec<CameraInfo> =
            cameras_guard.values().map(|camera| camera.snapshot_info()).collect();
        camera_table.sort_by(|a, b| a.camera_id.cmp(&b.camera_id));
        camera_table
    }

    pub async fn is_stream_running(&self, camera_id: &str) -> bool {
        self.flag_by_id(camera_id)
            .await
            .map(|flag| flag.running.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Resumen de salud agregada: healthy | degraded | unhealthy.
    /// Tasa de error > 10% degrada; cero cámaras conectadas colapsa.
    pub async fn health_summary(&self) -> serde_json::Value {
        let camera_table = self.all_cameras_info().await;
        let total_cameras = camera_table.len();
        let connected_cameras = camera_table
            .iter()
            .filter(|info| info.status == CameraStatus::Connected)
            .count();
        let active_streams = camera_table
            .iter()
            .filter(|info| info.stream_status == StreamStatus::Active)
            .count();

        let frames_processed = self.total_frames_processed.load(Ordering::Relaxed);
        let total_errors = self.total_errors.load(Ordering::Relaxed);
        let error_rate = total_errors as f64 / (frames_processed + total_errors).max(1) as f64;

        let aggregate_status = if total_cameras == 0 {
            "degraded"
        } else if connected_cameras == 0 {
            "unhealthy"
        } else if error_rate > 0.10 {
            "degraded"
        } else {
            "healthy"
        };

        serde_json::json!({
            "status": aggregate_status,
            "total_cameras": total_cameras,
            "connected_cameras": connected_cameras,
            "active_streams": active_streams,
            "total_frames_processed": frames_processed,
            "total_errors": total_errors,
            "error_rate": (error_rate * 1000.0).round() / 1000.0,
            "uptime_seconds": (Utc::now() - self.start_time).num_seconds(),
        })
    }

    /// Apagado ordenado: bucles, centinela, drenaje y liberación física.
    pub async fn shutdown(&self) {
        info!("🛑 [CAMERA_MANAGER]: Shutdown sequence initiated.");

        self.stop_all_streams().await;

        if let Some(monitor_handle) = self.health_monitor_handle.lock().expect("monitor lock poisoned").take() {
            monitor_handle.abort();
        }

        self.sighting_capture.drain(Duration::from_secs(5)).await;
        self.event_publisher.shutdown().await;

        let cameras: Vec<Arc<CameraConnection>> = self.cameras.read().await.values().cloned().collect();
        for camera in cameras {
            let _ = self.worker_pool.run(move || camera.disconnect()).await;
        }

        info!("✅ [CAMERA_MANAGER]: Shutdown complete.");
    }

    async fn camera_by_id(&self, camera_id: &str) -> Option<Arc<CameraConnection>> {
        self.cameras.read().await.get(camera_id).cloned()
    }

    async fn flag_by_id(&self, camera_id: &str) -> Option<Arc<StreamControlFlag>> {
        self.stream_flags.read().await.get(camera_id).cloned()
    }
}
