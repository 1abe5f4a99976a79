// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODELS ROOT (V4.0 - PIPELINE MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: AUTORIDAD ÚNICA DE CONTRATOS DEL PIPELINE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CONTRACT SOVEREIGNTY: Define la gramática inmutable que viaja
 *    entre el servicio de cámaras, el evaluador de alertas y el
 *    motor de entrega multicanal.
 * 2. TYPESHARE ALIGNMENT: Sincroniza las estructuras para la
 *    generación automática de interfaces TypeScript del Dashboard.
 * 3. NOMINAL PURITY: Enlaces entre entidades exclusivamente por
 *    identificador; sin grafos de referencias cíclicas.
 * =================================================================
 */

/// Reglas de alerta, instancias y perfiles de prioridad.
pub mod alert;
/// Configuración y telemetría de cámaras, metadatos de frames.
pub mod camera;
/// Contactos, canales de entrega y registros de despacho.
pub mod notification;
/// Detecciones faciales, embeddings y eventos de reconocimiento.
pub mod recognition;
/// Avistamientos persistidos de personas.
pub mod sighting;


pub use alert::{
    AlertInstance, AlertPriority, AlertRule, AlertStatus, NotificationFrequency,
    PersonContactLink, PersonPriorityProfile, PriorityLevel, TimeRange, TriggerConditions,
};
pub use camera::{
    CameraConfiguration, CameraInfo, CameraSourceKind, CameraStatus, FrameMetadata,
    FrameQualityGrade, StreamStatus,
};
pub use notification::{
    ChannelConfig, ChannelType, ContactType, DeliveryRecord, DeliveryStatus,
    NotificationChannel, NotificationContact,
};
pub use recognition::{
    FaceDetection, PersonEmbedding, RecognitionEvent, RecognitionFrameMetadata,
    RecognitionResult, EMBEDDING_DIMENSION,
};
pub use sighting::{Sighting, SightingSourceType};
