// [apps/notification/src/lib.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION LIBRARY ROOT (V2.0)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3-APP)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS DEL SERVICIO
 * =================================================================
 */

/// Hidratación y validación del entorno del proceso.
pub mod config;
/// Adaptadores de entrada HTTP/WS y sobre de error canónico.
pub mod handlers;
/// Núcleo de mando: ignición de daemons y transporte.
pub mod kernel;
/// Topología de rutas del servicio.
pub mod routes;
/// Motores de evaluación, entrega y tiempo real.
pub mod services;
/// Contenedor de estado compartido del proceso.
pub mod state;

pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::kernel::NotificationKernel;
    pub use crate::state::AppState;
}
