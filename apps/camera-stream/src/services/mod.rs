// [apps/camera-stream/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: CAMERA STREAM SERVICES ROOT (V2.0)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L3/L4-APP)
 * RESPONSABILIDAD: EXPOSICIÓN DE LOS MOTORES DEL PIPELINE
 * =================================================================
 */

/// Orquestación de cámaras, bucles de stream y centinela de salud.
pub mod camera_manager;
/// Difusión de eventos de reconocimiento (broadcast + Redis).
pub mod event_publisher;
/// Apertura de fuentes, extracción RGB y compuerta de calidad.
pub mod frame_source;
/// Puente HTTP al motor de reconocimiento con cachés frontales.
pub mod recognition_client;
/// Cola acotada y persistencia desprendida de avistamientos.
pub mod sighting_queue;

pub use camera_manager::{CameraManager, CaptureWorkerPool, DEFAULT_CONFIDENCE_THRESHOLD};
pub use event_publisher::EventPublisher;
pub use recognition_client::RecognitionUplink;
pub use sighting_queue::AsyncSightingCapture;
