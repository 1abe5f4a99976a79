// [libs/core/vector-index/src/index.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN VECTOR INDEX (V5.2 - EXHAUSTIVE MATCH)
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: BÚSQUEDA EXHAUSTIVA DE SIMILITUD COSENO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NORMALIZED STORAGE: Los vectores se normalizan L2 en la ingesta;
 *    la similitud coseno colapsa a un producto punto O(d).
 * 2. TIE-BREAK DETERMINISM: Empates de máxima similitud se resuelven
 *    por media de similitud de la persona y, en última instancia,
 *    por orden lexicográfico del identificador.
 *
 * # Mathematical Proof (Recognition Determinism):
 * Para un contenido de índice estable, search_person es una función
 * pura del vector consultado: el argmax sobre (max_sim, mean_sim,
 * person_id) es total y sin estados ocultos.
 * =================================================================
 */

use std::collections::HashMap;
use std::sync::RwLock;

use faceguard_domain_models::{PersonEmbedding, EMBEDDING_DIMENSION};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::IndexError;

/// Resultado individual de search_similar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMatch {
    pub person_id: String,
    pub embedding_id: String,
    pub similarity: f32,
}

/// Veredicto de search_person: la mejor persona de la galería.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonMatch {
    pub person_id: String,
    pub max_similarity: f32,
    pub mean_similarity: f32,
    pub embeddings_evaluated: usize,
}

/// Vector normalizado residente junto a su rastro de origen.
struct StoredVector {
    embedding_id: String,
    unit_vector: Vec<f32>,
}

#[derive(Default)]
struct IndexStrata {
    /// Galería agrupada por persona: se evalúan TODOS sus vectores.
    persons: HashMap<String, Vec<StoredVector>>,
    total_vectors: usize,
}

/// Índice en memoria de embeddings faciales, propietario de sus vectores.
pub struct VectorIndex {
    strata: RwLock<IndexStrata>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self { strata: RwLock::new(IndexStrata::default()) }
    }

    /// Ingesta un embedding validando dimensión y norma finita.
    ///
    /// # Errors:
    /// - `DimensionMismatch` si el vector no tiene 512 componentes.
    /// - `NonFiniteNorm` ante NaN/Inf o norma nula.
    pub fn add_embedding(&self, embedding: PersonEmbedding) -> Result<(), IndexError> {
        if embedding.vector.len() != EMBEDDING_DIMENSION {
            return Err(IndexError::DimensionMismatch {
                expected: EMBEDDING_DIMENSION,
                received: embedding.vector.len(),
            });
        }

        let unit_vector = normalize_l2(&embedding.vector).ok_or(IndexError::NonFiniteNorm {
            person_id: embedding.person_id.clone(),
        })?;

        let mut strata_guard = self
            .strata
            .write()
            .map_err(|poison_fault| IndexError::LockPoisoned(poison_fault.to_string()))?;

        strata_guard
            .persons
            .entry(embedding.person_id.clone())
            .or_default()
            .push(StoredVector { embedding_id: embedding.embedding_id, unit_vector });
        strata_guard.total_vectors += 1;

        Ok(())
    }

    /// Purga todos los vectores de una persona. Devuelve cuántos cayeron.
    pub fn remove_person(&self, person_id: &str) -> Result<usize, IndexError> {
        let mut strata_guard = self
            .strata
            .write()
            .map_err(|poison_fault| IndexError::LockPoisoned(poison_fault.to_string()))?;

        let removed_count = strata_guard.persons.remove(person_id).map(|v| v.len()).unwrap_or(0);
        strata_guard.total_vectors -= removed_count;

        if removed_count > 0 {
            debug!("🧹 [VECTOR_INDEX]: Purged {} vectors for person {}.", removed_count, person_id);
        }

        Ok(removed_count)
    }

    /// Pares (persona, similitud) sobre el umbral, descendentes, top_k.
    pub fn search_similar(
        &self,
        query_vector: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<SimilarityMatch>, IndexError> {
        let unit_query = self.validated_unit_query(query_vector)?;

        let strata_guard = self
            .strata
            .read()
            .map_err(|poison_fault| IndexError::LockPoisoned(poison_fault.to_string()))?;

        let mut matches: Vec<SimilarityMatch> = Vec::new();
        for (person_id, stored_vectors) in &strata_guard.persons {
            for stored in stored_vectors {
                let similarity = dot_product(&unit_query, &stored.unit_vector);
                if similarity >= threshold {
                    matches.push(SimilarityMatch {
                        person_id: person_id.clone(),
                        embedding_id: stored.embedding_id.clone(),
                        similarity,
                    });
                }
            }
        }

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.person_id.cmp(&b.person_id))
        });
        matches.truncate(top_k);

        Ok(matches)
    }

    /// Mejor persona por máxima similitud sobre TODOS sus embeddings.
    /// Empates por máxima -> gana la mayor similitud media.
    pub fn search_person(
        &self,
        query_vector: &[f32],
        threshold: f32,
    ) -> Result<Option<PersonMatch>, IndexError> {
        let unit_query = self.validated_unit_query(query_vector)?;

        let strata_guard = self
            .strata
            .read()
            .map_err(|poison_fault| IndexError::LockPoisoned(poison_fault.to_string()))?;

        let mut best_candidate: Option<PersonMatch> = None;

        for (person_id, stored_vectors) in &strata_guard.persons {
            if stored_vectors.is_empty() {
                continue;
            }

            let mut max_similarity = f32::MIN;
            let mut similarity_sum = 0.0f32;

            for stored in stored_vectors {
                let similarity = dot_product(&unit_query, &stored.unit_vector);
                similarity_sum += similarity;
                if similarity > max_similarity {
                    max_similarity = similarity;
                }
            }

            if max_similarity < threshold {
                continue;
            }

            let candidate = PersonMatch {
                person_id: person_id.clone(),
                max_similarity,
                mean_similarity: similarity_sum / stored_vectors.len() as f32,
                embeddings_evaluated: stored_vectors.len(),
            };

            best_candidate = match best_candidate {
                None => Some(candidate),
                Some(current_best) => {
                    if candidate_outranks(&candidate, &current_best) {
                        Some(candidate)
                    } else {
                        Some(current_best)
                    }
                }
            };
        }

        Ok(best_candidate)
    }

    pub fn total_vectors(&self) -> usize {
        self.strata.read().map(|s| s.total_vectors).unwrap_or(0)
    }

    pub fn unique_persons(&self) -> usize {
        self.strata.read().map(|s| s.persons.len()).unwrap_or(0)
    }

    fn validated_unit_query(&self, query_vector: &[f32]) -> Result<Vec<f32>, IndexError> {
        if query_vector.len() != EMBEDDING_DIMENSION {
            return Err(IndexError::DimensionMismatch {
                expected: EMBEDDING_DIMENSION,
                received: query_vector.len(),
            });
        }

        normalize_l2(query_vector)
            .ok_or(IndexError::NonFiniteNorm { person_id: "query".to_string() })
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Orden total del veredicto: (max_sim, mean_sim, id lexicográfico).
fn candidate_outranks(challenger: &PersonMatch, incumbent: &PersonMatch) -> bool {
    if challenger.max_similarity != incumbent.max_similarity {
        return challenger.max_similarity > incumbent.max_similarity;
    }
    if challenger.mean_similarity != incumbent.mean_similarity {
        return challenger.mean_similarity > incumbent.mean_similarity;
    }
    challenger.person_id < incumbent.person_id
}

/// Normaliza a norma L2 unitaria; None ante NaN/Inf o norma nula.
fn normalize_l2(vector: &[f32]) -> Option<Vec<f32>> {
    let squared_norm: f32 = vector.iter().map(|c| c * c).sum();
    if !squared_norm.is_finite() || squared_norm <= 0.0 {
        return None;
    }
    let norm = squared_norm.sqrt();
    Some(vector.iter().map(|c| c / norm).collect())
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
