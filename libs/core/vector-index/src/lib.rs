// [libs/core/vector-index/src/lib.rs]
/*!
 * =================================================================
 * APARATO: VECTOR INDEX LIBRARY ROOT (V5.0 - GALLERY MASTER)
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: BÚSQUEDA DE SIMILITUD Y CACHÉS DE RECONOCIMIENTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. EXHAUSTIVE MATCH: searchPerson evalúa TODOS los embeddings de
 *    cada persona, nunca un único representante.
 * 2. CACHE TRIAD: Tres cachés LRU+TTL frontales (imagen procesada,
 *    embedding cuantizado, resultado de reconocimiento).
 * =================================================================
 */

pub mod cache;
pub mod errors;
pub mod index;

pub use cache::{CacheStatistics, RecognitionCacheRegistry, TtlLruCache};
pub use cache::{hash_embedding_quantized, hash_frame_perceptual};
pub use errors::IndexError;
pub use index::{PersonMatch, SimilarityMatch, VectorIndex};
