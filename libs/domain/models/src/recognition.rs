// [libs/domain/models/src/recognition.rs]
/*!
 * =================================================================
 * APARATO: RECOGNITION DOMAIN MODELS (V4.2 - NEURAL CONTRACT)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE DETECCIÓN, EMBEDDINGS Y EVENTOS
 *
 * # Mathematical Proof (Signal Integrity):
 * El RecognitionEvent sella cada intento de reconocimiento con marca
 * RFC 3339 y versión de servicio, garantizando que el rastro forense
 * publicado en el bus sea reproducible en la línea de tiempo.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

use crate::camera::FrameMetadata;

/// Dimensión fija de los vectores faciales producidos por el motor.
pub const EMBEDDING_DIMENSION: usize = 512;

/// Versión de servicio sellada en cada evento de reconocimiento.
pub const SERVICE_VERSION: &str = "2.0.0";

/// Una cara detectada en un frame, con su posible identidad resuelta.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDetection {
    /// Caja delimitadora (x1, y1, x2, y2) en coordenadas del frame.
    pub bbox: Vec<f32>,
    /// Confianza del detector en que la región contiene una cara.
    pub confidence: f64,
    /// Vector facial de 512 dimensiones, cuando el motor lo reporta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Confianza del reconocimiento contra la galería (por frame).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recognition_confidence: Option<f64>,
    /// Identidad asignada cuando supera el umbral de reconocimiento.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// Embedding persistido de una persona en la galería del índice.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonEmbedding {
    pub embedding_id: String,
    pub person_id: String,
    /// Invariante: exactamente 512 dimensiones y norma L2 finita.
    pub vector: Vec<f32>,
    pub quality_score: f64,
    /// Confianza de entrenamiento; distinta de la confianza por frame.
    pub confidence_score: f64,
    pub model_name: String,
    pub model_version: String,
}

/// Resultado de un intento de reconocimiento sobre un frame.
/// Los fallos son VALORES (success=false), nunca excepciones.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub success: bool,
    pub persons_detected: Vec<FaceDetection>,
    pub processing_time_ms: f64,
    pub confidence_threshold: f64,
    pub frame_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecognitionResult {
    /// Construye el resultado de fallo terminal conservando el contexto del frame.
    pub fn failure(
        frame_id: String,
        confidence_threshold: f64,
        processing_time_ms: f64,
        error_description: String,
    ) -> Self {
        Self {
            success: false,
            persons_detected: Vec::new(),
            processing_time_ms,
            confidence_threshold,
            frame_id,
            timestamp: Utc::now(),
            error: Some(error_description),
        }
    }
}

/// Submapa de metadatos de frame sellado dentro del evento publicado.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionFrameMetadata {
    #[typeshare(serialized_as = "number")]
    pub width: u32,
    #[typeshare(serialized_as = "number")]
    pub height: u32,
    pub quality_score: Option<f64>,
    #[typeshare(serialized_as = "number")]
    pub frame_number: u64,
    #[typeshare(serialized_as = "number")]
    pub file_size: u64,
}

/// Mensaje pub/sub que resume un intento de reconocimiento sobre un frame.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionEvent {
    pub event_id: String,
    pub event_type: String,
    pub service_version: String,
    pub timestamp: DateTime<Utc>,
    pub camera_id: String,
    pub frame_id: String,
    pub persons_detected: Vec<FaceDetection>,
    pub processing_time_ms: f64,
    pub confidence_threshold: f64,
    pub frame_metadata: RecognitionFrameMetadata,
    pub recognition_successful: bool,
}

impl RecognitionEvent {
    /// Sella un nuevo evento a partir del resultado y los metadatos del frame.
    pub fn seal(
        camera_id: &str,
        recognition_result: &RecognitionResult,
        frame_metadata: &FrameMetadata,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: "face_recognition".to_string(),
            service_version: SERVICE_VERSION.to_string(),
            timestamp: Utc::now(),
            camera_id: camera_id.to_string(),
            frame_id: frame_metadata.frame_id.clone(),
            persons_detected: recognition_result.persons_detected.clone(),
            processing_time_ms: recognition_result.processing_time_ms,
            confidence_threshold: recognition_result.confidence_threshold,
            frame_metadata: RecognitionFrameMetadata {
                width: frame_metadata.width,
                height: frame_metadata.height,
                quality_score: frame_metadata.quality_score,
                frame_number: frame_metadata.frame_number,
                file_size: frame_metadata.file_size,
            },
            recognition_successful: recognition_result.success,
        }
    }
}
