// [libs/core/vector-index/src/errors.rs]
/*!
 * =================================================================
 * APARATO: VECTOR INDEX ERROR CATALOG (V5.0 - SOBERANO)
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DEL ÍNDICE
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    /// El vector no tiene las 512 dimensiones del contrato.
    #[error("[L1_INDEX_FAULT]: DIMENSION_MISMATCH -> expected {expected}, received {received}")]
    DimensionMismatch { expected: usize, received: usize },

    /// El vector contiene NaN/Inf o su norma L2 es nula.
    #[error("[L1_INDEX_FAULT]: NON_FINITE_NORM -> embedding rejected for person {person_id}")]
    NonFiniteNorm { person_id: String },

    /// Cerrojo interno envenenado por pánico en otro hilo.
    #[error("[L1_INDEX_FAULT]: LOCK_POISONED -> {0}")]
    LockPoisoned(String),
}
