// [libs/domain/models/src/sighting.rs]
/*!
 * =================================================================
 * APARATO: SIGHTING DOMAIN MODEL (V4.0 - FORENSIC TRAIL)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: RASTRO PERSISTIDO DE AVISTAMIENTOS DE PERSONAS
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Origen del frame que produjo el avistamiento.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SightingSourceType {
    CameraStream,
    ImageUpload,
    VideoUpload,
}

/// Registro de que una persona concreta fue vista en una cámara.
///
/// Propiedad exclusiva de la cola de avistamientos hasta su
/// persistencia; después se referencia solo por identificador.
/// Invariante: (person_id, camera_id, timestamp, confidence) válidos.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sighting {
    pub sighting_id: String,
    pub person_id: String,
    pub camera_id: String,
    /// Confianza de reconocimiento POR FRAME (no la de entrenamiento).
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    /// Caja facial (x1, y1, x2, y2) en coordenadas del frame original.
    pub face_bbox: Vec<f32>,
    /// Recorte facial JPEG; viaja en multipart, nunca en el JSON.
    #[serde(skip)]
    #[typeshare(skip)]
    pub face_crop_jpeg: Option<Vec<u8>>,
    pub quality_score: Option<f64>,
    pub source_type: SightingSourceType,
    /// Metadatos del frame enlazado, como blob JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[typeshare(serialized_as = "object")]
    pub frame_metadata: Option<serde_json::Value>,
}
