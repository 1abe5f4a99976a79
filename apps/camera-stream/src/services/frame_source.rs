// [apps/camera-stream/src/services/frame_source.rs]
/*!
 * =================================================================
 * APARATO: FRAME SOURCE ENGINE (V2.6 - FFMPEG UPLINK)
 * CLASIFICACIÓN: MEDIA INFRASTRUCTURE (ESTRATO L1-APP)
 * RESPONSABILIDAD: APERTURA DE FUENTES, EXTRACCIÓN RGB Y CALIDAD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. UNIFIED BACKEND: Un único proceso ffmpeg sirve los cuatro tipos
 *    de fuente (dispositivo V4L2, RTSP/RTMP, HTTP, archivo) entregando
 *    rawvideo RGB24 por stdout.
 * 2. BLOCKING DISCIPLINE: grab() es deliberadamente bloqueante; el
 *    orquestador lo delega al pool de trabajadores acotado.
 * 3. QUALITY GATE: Puntuación compuesta nitidez/brillo/contraste con
 *    pesos 0.40/0.30/0.30 y varianza Laplaciana normalizada.
 * =================================================================
 */

use faceguard_domain_models::{CameraSourceKind, FrameQualityGrade};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Extensiones de archivo reconocidas como fuente de vídeo local.
const VIDEO_FILE_EXTENSIONS: [&str; 4] = [".mp4", ".avi", ".mov", ".mkv"];

/// Factor de normalización de la varianza Laplaciana.
const LAPLACIAN_VARIANCE_CEILING: f64 = 1000.0;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// Fallo al abrir la fuente; terminal salvo política de reconexión.
    #[error("[C1_CONNECT_FAULT]: SOURCE_OPEN_REJECTED -> {0}")]
    Connect(String),

    /// Fallo transitorio de extracción; dispara la política de reconexión.
    #[error("[C1_CAPTURE_FAULT]: FRAME_EXTRACTION_FAILED -> {0}")]
    Capture(String),
}

/// Frame crudo RGB24 propiedad del bucle de stream hasta su descarte.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RawFrame {
    pub const CHANNELS: u32 = 3;

    pub fn byte_size(&self) -> u64 {
        self.pixels.len() as u64
    }
}

/// Clasifica el URI fuente siguiendo el contrato de detección:
/// dígitos -> dispositivo; rtsp/rtmp -> streaming; http(s) -> cámara IP;
/// esquema file, ruta absoluta o extensión de vídeo -> archivo.
pub fn detect_source_kind(source: &str) -> CameraSourceKind {
    let trimmed = source.trim();

    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return CameraSourceKind::Device;
    }
    if trimmed.starts_with("rtsp://") || trimmed.starts_with("rtmp://") {
        return CameraSourceKind::Rtsp;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return CameraSourceKind::Ip;
    }
    let lowercase = trimmed.to_ascii_lowercase();
    if trimmed.starts_with("file://")
        || trimmed.starts_with('/')
        || VIDEO_FILE_EXTENSIONS.iter().any(|ext| lowercase.ends_with(ext))
    {
        return CameraSourceKind::File;
    }

    // Fuente ambigua: degradamos a dispositivo local.
    CameraSourceKind::Device
}

/// Contrato de captura bloqueante; la propiedad del handle es exclusiva
/// de la conexión de cámara que lo abrió.
pub trait FrameGrabber: Send {
    fn open(&mut self) -> Result<(), CaptureError>;
    fn grab(&mut self) -> Result<RawFrame, CaptureError>;
    fn release(&mut self);
    fn is_open(&self) -> bool;
}

/// Backend de producción: proceso ffmpeg lateral decodificando a RGB24.
pub struct FfmpegFrameSource {
    source: String,
    source_kind: CameraSourceKind,
    target_width: u32,
    target_height: u32,
    target_frame_rate: u32,
    ffmpeg_child: Option<ffmpeg_sidecar::child::FfmpegChild>,
    frame_iterator: Option<ffmpeg_sidecar::iter::FfmpegIterator>,
}

impl FfmpegFrameSource {
    pub fn new(source: &str, width: u32, height: u32, frame_rate: u32) -> Self {
        Self {
            source: source.to_string(),
            source_kind: detect_source_kind(source),
            target_width: width,
            target_height: height,
            target_frame_rate: frame_rate,
            ffmpeg_child: None,
            frame_iterator: None,
        }
    }

    fn build_command(&self) -> FfmpegCommand {
        let mut command = FfmpegCommand::new();
        command.args(["-hide_banner"]);

        let framerate_argument = self.target_frame_rate.to_string();
        let video_size_argument = format!("{}x{}", self.target_width, self.target_height);

        match self.source_kind {
            CameraSourceKind::Device => {
                // Dispositivo local V4L2: aplicamos formato en la entrada.
                command.args([
                    "-f",
                    "v4l2",
                    "-framerate",
                    framerate_argument.as_str(),
                    "-video_size",
                    video_size_argument.as_str(),
                ]);
                command.input(format!("/dev/video{}", self.source.trim()));
            }
            CameraSourceKind::Rtsp => {
                command.args([
                    "-rtsp_transport",
                    "tcp",
                    "-timeout",
                    "5000000",
                    "-allowed_media_types",
                    "video",
                ]);
                command.input(&self.source);
            }
            CameraSourceKind::Ip => {
                command.input(&self.source);
            }
            CameraSourceKind::File => {
                let physical_path = self.source.strip_prefix("file://").unwrap_or(&self.source);
                command.input(physical_path);
            }
        }

        let scale_filter_argument = format!("scale={}:{}", self.target_width, self.target_height);
        command.args(["-vf", scale_filter_argument.as_str(), "-r", framerate_argument.as_str()]);
        command.format("rawvideo").pix_fmt("rgb24").pipe_stdout();

        command
    }
}

impl FrameGrabber for FfmpegFrameSource {
    /// Lanza el proceso lateral y certifica el enlace con un frame de prueba.
    fn open(&mut self) -> Result<(), CaptureError> {
        self.release();

        let mut ffmpeg_child = self
            .build_command()
            .spawn()
            .map_err(|spawn_fault| CaptureError::Connect(spawn_fault.to_string()))?;

        let frame_iterator = ffmpeg_child
            .iter()
            .map_err(|iterator_fault| CaptureError::Connect(iterator_fault.to_string()))?;

        self.ffmpeg_child = Some(ffmpeg_child);
        self.frame_iterator = Some(frame_iterator);

        // Frame de prueba: confirma que la fuente entrega señal real.
        let probe_frame = self.grab().map_err(|grab_fault| {
            self.release();
            CaptureError::Connect(format!("test frame failed: {grab_fault}"))
        })?;
        debug!(
            "🎥 [FRAME_SOURCE]: Link certified for '{}' ({}x{}).",
            self.source, probe_frame.width, probe_frame.height
        );

        Ok(())
    }

    /// Bloquea hasta el siguiente OutputFrame del proceso lateral.
    fn grab(&mut self) -> Result<RawFrame, CaptureError> {
        let frame_iterator = self
            .frame_iterator
            .as_mut()
            .ok_or_else(|| CaptureError::Capture("capture handle is closed".to_string()))?;

        for ffmpeg_event in frame_iterator.by_ref() {
            match ffmpeg_event {
                FfmpegEvent::OutputFrame(video_frame) => {
                    return Ok(RawFrame {
                        pixels: video_frame.data,
                        width: video_frame.width,
                        height: video_frame.height,
                    });
                }
                FfmpegEvent::Error(stream_fault) => {
                    warn!("⚠️ [FRAME_SOURCE]: ffmpeg fault on '{}': {}", self.source, stream_fault);
                }
                FfmpegEvent::Log(_, log_line) => {
                    trace!(target: "ffmpeg", "{}", log_line);
                }
                _ => {}
            }
        }

        Err(CaptureError::Capture("source yielded no frame (stream ended)".to_string()))
    }

    fn release(&mut self) {
        self.frame_iterator = None;
        if let Some(mut ffmpeg_child) = self.ffmpeg_child.take() {
            let _ = ffmpeg_child.kill();
            let _ = ffmpeg_child.wait();
        }
    }

    fn is_open(&self) -> bool {
        self.frame_iterator.is_some()
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Fuente sintética determinista para bancos de prueba y demos sin hardware.
/// Entrega un patrón de gradiente con numeración embebida en el primer píxel.
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    frames_served: u64,
    is_open: bool,
    /// Presupuesto de frames antes de simular el corte de señal; None = infinito.
    pub frame_budget: Option<u64>,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, frames_served: 0, is_open: false, frame_budget: None }
    }
}

impl FrameGrabber for SyntheticFrameSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        self.is_open = true;
        Ok(())
    }

    fn grab(&mut self) -> Result<RawFrame, CaptureError> {
        if !self.is_open {
            return Err(CaptureError::Capture("capture handle is closed".to_string()));
        }
        if let Some(budget) = self.frame_budget {
            if self.frames_served >= budget {
                return Err(CaptureError::Capture("synthetic signal exhausted".to_string()));
            }
        }

        let mut pixels = Vec::with_capacity((self.width * self.height * RawFrame::CHANNELS) as usize);
        for row in 0..self.height {
            for column in 0..self.width {
                pixels.push((column % 256) as u8);
                pixels.push((row % 256) as u8);
                pixels.push(((column + row + self.frames_served as u32) % 256) as u8);
            }
        }

        self.frames_served += 1;
        Ok(RawFrame { pixels, width: self.width, height: self.height })
    }

    fn release(&mut self) {
        self.is_open = false;
    }

    fn is_open(&self) -> bool {
        self.is_open
    }
}

// --- ESTRATO DE CALIDAD DE FRAME ---

/// Puntuación compuesta [0,1] y calificación del frame.
///
/// # Mathematical Proof (Weighted Quality):
/// score = 0.40·min(var(∇²L)/1000, 1) + 0.30·(1 − |mean(L)/255 − 0.5|·2)
///       + 0.30·min(std(L)/255·2, 1), con L la luminancia del frame.
pub fn assess_frame_quality(frame: &RawFrame) -> (f64, FrameQualityGrade) {
    let luminance = frame_luminance(frame);
    let pixel_count = luminance.len();
    if pixel_count == 0 {
        return (0.0, FrameQualityGrade::Unusable);
    }

    // 1. NITIDEZ: varianza de la respuesta Laplaciana 4-conectada.
    let sharpness_normalized =
        (laplacian_variance(&luminance, frame.width, frame.height) / LAPLACIAN_VARIANCE_CEILING).min(1.0);

    // 2. BRILLO: penalización por distancia al punto medio 0.5.
    let mean_luminance =
        luminance.iter().map(|&l| l as f64).sum::<f64>() / pixel_count as f64 / 255.0;
    let brightness_score = 1.0 - (mean_luminance - 0.5).abs() * 2.0;

    // 3. CONTRASTE: desviación estándar normalizada.
    let luminance_variance = luminance
        .iter()
        .map(|&l| {
            let delta = l as f64 / 255.0 - mean_luminance;
            delta * delta
        })
        .sum::<f64>()
        / pixel_count as f64;
    let contrast_score = (luminance_variance.sqrt() * 2.0).min(1.0);

    let quality_score =
        sharpness_normalized * 0.40 + brightness_score * 0.30 + contrast_score * 0.30;

    (quality_score, FrameQualityGrade::from_score(quality_score))
}

fn frame_luminance(frame: &RawFrame) -> Vec<u8> {
    frame
        .pixels
        .chunks_exact(3)
        .map(|rgb| {
            (0.299 * rgb[0] as f64 + 0.587 * rgb[1] as f64 + 0.114 * rgb[2] as f64).round() as u8
        })
        .collect()
}

/// Varianza de la convolución Laplaciana [0,1,0; 1,-4,1; 0,1,0].
fn laplacian_variance(luminance: &[u8], width: u32, height: u32) -> f64 {
    let (w, h) = (width as usize, height as usize);
    if w < 3 || h < 3 || luminance.len() < w * h {
        return 0.0;
    }

    let mut responses: Vec<f64> = Vec::with_capacity((w - 2) * (h - 2));
    for row in 1..h - 1 {
        for column in 1..w - 1 {
            let center = luminance[row * w + column] as f64;
            let response = luminance[(row - 1) * w + column] as f64
                + luminance[(row + 1) * w + column] as f64
                + luminance[row * w + column - 1] as f64
                + luminance[row * w + column + 1] as f64
                - 4.0 * center;
            responses.push(response);
        }
    }

    let mean_response = responses.iter().sum::<f64>() / responses.len() as f64;
    responses.iter().map(|r| (r - mean_response).powi(2)).sum::<f64>() / responses.len() as f64
}

// --- ESTRATO DE CODIFICACIÓN Y RECORTE ---

/// Codifica el frame RGB24 como JPEG con la calidad indicada.
pub fn encode_frame_jpeg(frame: &RawFrame, jpeg_quality: u8) -> Result<Vec<u8>, CaptureError> {
    let mut encoded_buffer = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut encoded_buffer, jpeg_quality)
        .encode(&frame.pixels, frame.width, frame.height, image::ExtendedColorType::Rgb8)
        .map_err(|encode_fault| CaptureError::Capture(format!("jpeg encode failed: {encode_fault}")))?;
    Ok(encoded_buffer)
}

/// Recorta la región facial con recorte a los límites del frame.
/// Descarta recortes menores a 50x50 píxeles.
pub fn crop_face_region(frame: &RawFrame, face_bbox: &[f32]) -> Option<RawFrame> {
    if face_bbox.len() != 4 {
        return None;
    }

    let (frame_width, frame_height) = (frame.width as i64, frame.height as i64);
    let x1 = (face_bbox[0] as i64).clamp(0, frame_width - 1);
    let y1 = (face_bbox[1] as i64).clamp(0, frame_height - 1);
    let x2 = (face_bbox[2] as i64).clamp(x1 + 1, frame_width);
    let y2 = (face_bbox[3] as i64).clamp(y1 + 1, frame_height);

    let crop_width = (x2 - x1) as u32;
    let crop_height = (y2 - y1) as u32;
    if crop_width < 50 || crop_height < 50 {
        return None;
    }

    let mut crop_pixels = Vec::with_capacity((crop_width * crop_height * RawFrame::CHANNELS) as usize);
    for row in y1..y2 {
        let row_start = ((row * frame_width + x1) * RawFrame::CHANNELS as i64) as usize;
        let row_end = ((row * frame_width + x2) * RawFrame::CHANNELS as i64) as usize;
        crop_pixels.extend_from_slice(&frame.pixels[row_start..row_end]);
    }

    Some(RawFrame { pixels: crop_pixels, width: crop_width, height: crop_height })
}
