// [libs/domain/models/src/camera.rs]
/*!
 * =================================================================
 * APARATO: CAMERA DOMAIN MODELS (V4.1 - STREAM MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE CÁMARA, ESTADO DE STREAM Y FRAMES
 *
 * # Mathematical Proof (State Machine Integrity):
 * El par (CameraStatus, StreamStatus) separa la salud del enlace
 * físico del ciclo de vida del bucle de procesamiento, permitiendo
 * que el monitor de salud reconecte sin detener el stream lógico.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Clasificación del origen físico de una cámara, derivada del URI fuente.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CameraSourceKind {
    /// Índice de dispositivo local (USB / V4L2).
    Device,
    /// Protocolo de streaming RTSP o RTMP.
    Rtsp,
    /// Cámara de red sobre HTTP(S).
    Ip,
    /// Archivo de vídeo local.
    File,
}

/// Salud del enlace físico con la cámara.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
    Inactive,
}

/// Ciclo de vida del bucle de procesamiento de frames.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    Active,
    Paused,
    Stopped,
    Error,
}

/// Calificación cualitativa de un frame según su puntuación compuesta.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FrameQualityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
    Unusable,
}

impl FrameQualityGrade {
    /// Deriva la calificación desde la puntuación compuesta [0,1].
    /// Umbrales: 0.8 / 0.6 / 0.4 / 0.2.
    pub fn from_score(quality_score: f64) -> Self {
        if quality_score >= 0.8 {
            Self::Excellent
        } else if quality_score >= 0.6 {
            Self::Good
        } else if quality_score >= 0.4 {
            Self::Fair
        } else if quality_score >= 0.2 {
            Self::Poor
        } else {
            Self::Unusable
        }
    }
}

/// Configuración inmutable de una cámara registrada en el orquestador.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfiguration {
    pub camera_id: String,
    /// URI fuente: índice numérico, rtsp://, http(s):// o ruta de archivo.
    pub source: String,
    pub source_kind: CameraSourceKind,
    pub name: String,
    pub location: Option<String>,
    #[typeshare(serialized_as = "number")]
    pub resolution_width: u32,
    #[typeshare(serialized_as = "number")]
    pub resolution_height: u32,
    /// Tasa objetivo de extracción de frames (1-30 FPS).
    #[typeshare(serialized_as = "number")]
    pub frame_rate: u32,
    pub enabled: bool,
    pub auto_reconnect: bool,
    #[typeshare(serialized_as = "number")]
    pub reconnect_attempts: u32,
    #[typeshare(serialized_as = "number")]
    pub reconnect_delay_seconds: u64,
}

/// Instantánea completa de una cámara para la superficie HTTP.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraInfo {
    pub camera_id: String,
    pub configuration: CameraConfiguration,
    pub status: CameraStatus,
    pub stream_status: StreamStatus,
    pub last_frame_time: Option<DateTime<Utc>>,
    #[typeshare(serialized_as = "number")]
    pub frames_processed: u64,
    #[typeshare(serialized_as = "number")]
    pub errors_count: u64,
    /// Siempre poblado tras un fallo; la API nunca oculta el último error.
    pub last_error: Option<String>,
    #[typeshare(serialized_as = "number")]
    pub reconnect_attempts: u32,
    #[typeshare(serialized_as = "number")]
    pub uptime_seconds: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadatos de un frame capturado; viajan con el frame hasta su descarte.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMetadata {
    pub frame_id: String,
    pub camera_id: String,
    pub timestamp: DateTime<Utc>,
    /// Número monótono de frame dentro del stream de su cámara.
    #[typeshare(serialized_as = "number")]
    pub frame_number: u64,
    #[typeshare(serialized_as = "number")]
    pub width: u32,
    #[typeshare(serialized_as = "number")]
    pub height: u32,
    #[typeshare(serialized_as = "number")]
    pub channels: u32,
    #[typeshare(serialized_as = "number")]
    pub file_size: u64,
    pub quality_score: Option<f64>,
    pub quality_grade: Option<FrameQualityGrade>,
}
