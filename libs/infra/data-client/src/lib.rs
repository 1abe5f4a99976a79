// [libs/infra/data-client/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DATA CLIENT LIBRARY ROOT (V6.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN DE LOS ENLACES HTTP DEL PIPELINE
 * =================================================================
 */

pub mod client;
pub mod errors;

pub use client::{CoreDataClient, NotificationClient};
pub use errors::DataClientError;
