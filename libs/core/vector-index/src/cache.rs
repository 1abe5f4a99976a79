// [libs/core/vector-index/src/cache.rs]
/*!
 * =================================================================
 * APARATO: RECOGNITION CACHE TRIAD (V5.3 - LRU+TTL MASTER)
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: CACHÉS FRONTALES DEL PIPELINE DE RECONOCIMIENTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TRIAD TOPOLOGY: imagen procesada (100 / 30min), embedding
 *    cuantizado (1000 / 2h), resultado de reconocimiento (500 / 1h).
 * 2. EVICTION CONTRACT: put sobre caché llena expulsa la entrada
 *    menos recientemente usada; la expiración TTL se evalúa en get.
 * 3. TELEMETRY: cada caché contabiliza hits, misses y tiempos de
 *    respuesta para el endpoint de salud.
 * =================================================================
 */

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::trace;

/// Techo de muestras de latencia retenidas por caché.
const RESPONSE_SAMPLE_CAPACITY: usize = 1024;

/// Estadísticas de rendimiento de una caché individual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub total_hits: u64,
    pub total_misses: u64,
    pub entries: usize,
    pub hit_ratio: f64,
    pub avg_response_time_ms: f64,
}

struct CacheSlot<V> {
    value: V,
    stored_at: Instant,
    time_to_live: Duration,
}

struct CacheStrata<V> {
    slots: LruCache<String, CacheSlot<V>>,
    hits: u64,
    misses: u64,
    response_samples_ms: Vec<f64>,
}

/// Caché LRU con expiración TTL y cerrojo interno.
pub struct TtlLruCache<V> {
    strata: Mutex<CacheStrata<V>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlLruCache<V> {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let bounded_capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity >= 1");
        Self {
            strata: Mutex::new(CacheStrata {
                slots: LruCache::new(bounded_capacity),
                hits: 0,
                misses: 0,
                response_samples_ms: Vec::new(),
            }),
            default_ttl,
        }
    }

    /// Recupera y promueve la entrada; expira perezosamente por TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let lookup_started = Instant::now();
        let mut strata_guard = self.strata.lock().expect("cache lock poisoned");
        let strata = &mut *strata_guard;

        let expired = match strata.slots.get(key) {
            Some(slot) => slot.stored_at.elapsed() > slot.time_to_live,
            None => {
                strata.misses += 1;
                return None;
            }
        };

        if expired {
            strata.slots.pop(key);
            strata.misses += 1;
            trace!("💤 [CACHE]: Entry expired by TTL: {}", key);
            return None;
        }

        strata.hits += 1;
        let elapsed_ms = lookup_started.elapsed().as_secs_f64() * 1000.0;
        if strata.response_samples_ms.len() < RESPONSE_SAMPLE_CAPACITY {
            strata.response_samples_ms.push(elapsed_ms);
        }

        strata.slots.get(key).map(|slot| slot.value.clone())
    }

    pub fn put(&self, key: String, value: V) {
        self.put_with_ttl(key, value, self.default_ttl);
    }

    /// Inserta con TTL explícito; sobre caché llena expulsa la LRU.
    pub fn put_with_ttl(&self, key: String, value: V, time_to_live: Duration) {
        let mut strata_guard = self.strata.lock().expect("cache lock poisoned");
        strata_guard
            .slots
            .put(key, CacheSlot { value, stored_at: Instant::now(), time_to_live });
    }

    pub fn len(&self) -> usize {
        self.strata.lock().map(|s| s.slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut strata_guard = self.strata.lock().expect("cache lock poisoned");
        strata_guard.slots.clear();
        strata_guard.hits = 0;
        strata_guard.misses = 0;
        strata_guard.response_samples_ms.clear();
    }

    pub fn statistics(&self) -> CacheStatistics {
        let strata_guard = self.strata.lock().expect("cache lock poisoned");
        let total_requests = strata_guard.hits + strata_guard.misses;
        let avg_response = if strata_guard.response_samples_ms.is_empty() {
            0.0
        } else {
            strata_guard.response_samples_ms.iter().sum::<f64>()
                / strata_guard.response_samples_ms.len() as f64
        };

        CacheStatistics {
            total_hits: strata_guard.hits,
            total_misses: strata_guard.misses,
            entries: strata_guard.slots.len(),
            hit_ratio: if total_requests > 0 {
                strata_guard.hits as f64 / total_requests as f64
            } else {
                0.0
            },
            avg_response_time_ms: avg_response,
        }
    }
}

/// Tríada de cachés frontales del motor de reconocimiento.
pub struct RecognitionCacheRegistry {
    /// Resultados completos por hash perceptual del frame (100 / 30 min).
    pub processed_image: TtlLruCache<serde_json::Value>,
    /// Embeddings por hash cuantizado (1000 / 2 h).
    pub embedding: TtlLruCache<Vec<f32>>,
    /// Veredictos de reconocimiento por hash de embedding (500 / 1 h).
    pub recognition_result: TtlLruCache<serde_json::Value>,
}

impl RecognitionCacheRegistry {
    pub fn new() -> Self {
        Self {
            processed_image: TtlLruCache::new(100, Duration::from_secs(1800)),
            embedding: TtlLruCache::new(1000, Duration::from_secs(7200)),
            recognition_result: TtlLruCache::new(500, Duration::from_secs(3600)),
        }
    }

    /// Estadísticas agregadas de la tríada para la superficie de salud.
    pub fn comprehensive_statistics(&self) -> serde_json::Value {
        let image_stats = self.processed_image.statistics();
        let embedding_stats = self.embedding.statistics();
        let result_stats = self.recognition_result.statistics();

        let total_hits = image_stats.total_hits + embedding_stats.total_hits + result_stats.total_hits;
        let total_misses =
            image_stats.total_misses + embedding_stats.total_misses + result_stats.total_misses;
        let total_requests = total_hits + total_misses;

        serde_json::json!({
            "overall": {
                "total_hits": total_hits,
                "total_misses": total_misses,
                "hit_ratio": if total_requests > 0 { total_hits as f64 / total_requests as f64 } else { 0.0 },
            },
            "image_cache": image_stats,
            "embedding_cache": embedding_stats,
            "recognition_cache": result_stats,
        })
    }
}

impl Default for RecognitionCacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash perceptual de un frame RGB: reescala a 64x64 y sella SHA-256.
/// Frames visualmente idénticos colapsan a la misma llave de caché.
pub fn hash_frame_perceptual(rgb_pixels: &[u8], width: u32, height: u32) -> String {
    let digest_input: Vec<u8> = match image::RgbImage::from_raw(width, height, rgb_pixels.to_vec()) {
        Some(frame_image) => {
            let normalized_thumbnail = image::imageops::resize(
                &frame_image,
                64,
                64,
                image::imageops::FilterType::Triangle,
            );
            normalized_thumbnail.into_raw()
        }
        // Dimensiones inconsistentes: degradamos al hash de bytes crudos.
        None => rgb_pixels.to_vec(),
    };

    let mut hasher = Sha256::new();
    hasher.update(&digest_input);
    hex::encode(hasher.finalize())[..32].to_string()
}

/// Hash de un embedding cuantizado a 4 decimales para llaves estables.
pub fn hash_embedding_quantized(embedding: &[f32]) -> String {
    let mut hasher = Sha256::new();
    for component in embedding {
        let quantized = (component * 10_000.0).round() / 10_000.0;
        hasher.update(quantized.to_le_bytes());
    }
    hex::encode(hasher.finalize())[..32].to_string()
}
