// [libs/infra/data-client/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATA CLIENT ERROR CATALOG (V6.0 - SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataClientError {
    /// Fallo físico de red o timeout del enlace.
    #[error("[L3_DATA_NET_FAULT]: UPLINK_SEVERED -> {0}")]
    Transport(#[from] reqwest::Error),

    /// El servicio remoto rechazó la petición con un estado no exitoso.
    #[error("[L3_DATA_FAULT]: REMOTE_REJECTION -> HTTP_{status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// Cuerpo remoto indescifrable contra el contrato del dominio.
    #[error("[L3_DATA_FAULT]: CONTRACT_VIOLATION -> {0}")]
    Decode(String),

    /// Variables de entorno vacías o URL base malformada.
    #[error("[L3_DATA_CONFIG_FAULT]: ENDPOINT_VOID -> {0}")]
    Configuration(String),
}
