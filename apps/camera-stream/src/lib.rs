// [apps/camera-stream/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CAMERA STREAM LIBRARY ROOT (V2.0)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3-APP)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS DEL SERVICIO
 * =================================================================
 */

/// Hidratación y validación del entorno del proceso.
pub mod config;
/// Adaptadores de entrada HTTP y sobre de error canónico.
pub mod handlers;
/// Núcleo de mando: ignición de servicios y transporte.
pub mod kernel;
/// Topología de rutas del servicio.
pub mod routes;
/// Motores del pipeline: captura, reconocimiento, eventos, cola.
pub mod services;
/// Contenedor de estado compartido del proceso.
pub mod state;

pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::kernel::CameraStreamKernel;
    pub use crate::state::AppState;
}
