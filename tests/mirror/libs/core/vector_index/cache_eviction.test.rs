// [tests/mirror/libs/core/vector_index/cache_eviction.test.rs]
/**
 * =================================================================
 * APARATO: CACHE TRIAD PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * OBJETIVO: Certificar expulsión LRU, expiración TTL y telemetría.
 * =================================================================
 */

use std::time::Duration;

use faceguard_core_vector_index::{
    hash_embedding_quantized, hash_frame_perceptual, RecognitionCacheRegistry, TtlLruCache,
};

#[test]
fn certify_lru_eviction_on_full_put() {
    println!("\n📡 [PROVING_GROUNDS]: LRU eviction audit...");
    let cache: TtlLruCache<u32> = TtlLruCache::new(3, Duration::from_secs(3600));

    cache.put("a".into(), 1);
    cache.put("b".into(), 2);
    cache.put("c".into(), 3);

    // Promovemos 'a': la menos recientemente usada pasa a ser 'b'.
    assert_eq!(cache.get("a"), Some(1));

    cache.put("d".into(), 4);
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get("b"), None, "LRU entry must be evicted");
    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get("d"), Some(4));
    println!("   ✅ [SUCCESS]: Put-on-full drops the least recently used entry.");
}

#[test]
fn certify_ttl_expiry_is_lazy_on_get() {
    let cache: TtlLruCache<String> = TtlLruCache::new(10, Duration::from_secs(3600));

    cache.put_with_ttl("ephemeral".into(), "gone".into(), Duration::from_millis(0));
    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(cache.get("ephemeral"), None, "expired entry must not be served");

    cache.put("durable".into(), "kept".into());
    assert_eq!(cache.get("durable"), Some("kept".into()));
}

#[test]
fn certify_statistics_track_hits_and_misses() {
    let cache: TtlLruCache<u32> = TtlLruCache::new(10, Duration::from_secs(3600));
    cache.put("k".into(), 7);

    let _ = cache.get("k");
    let _ = cache.get("k");
    let _ = cache.get("absent");

    let statistics = cache.statistics();
    assert_eq!(statistics.total_hits, 2);
    assert_eq!(statistics.total_misses, 1);
    assert!((statistics.hit_ratio - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(statistics.entries, 1);
}

#[test]
fn certify_registry_capacities_and_aggregate_stats() {
    let registry = RecognitionCacheRegistry::new();

    // La tríada arranca vacía y reporta el agregado coherente.
    registry.processed_image.put("frame".into(), serde_json::json!({"persons": []}));
    registry.embedding.put("emb".into(), vec![0.5f32; 512]);
    let _ = registry.processed_image.get("frame");
    let _ = registry.recognition_result.get("missing");

    let aggregate = registry.comprehensive_statistics();
    assert_eq!(aggregate["overall"]["total_hits"], 1);
    assert_eq!(aggregate["overall"]["total_misses"], 1);
    assert_eq!(aggregate["image_cache"]["entries"], 1);
    assert_eq!(aggregate["embedding_cache"]["entries"], 1);
}

#[test]
fn certify_perceptual_and_quantized_hash_stability() {
    println!("\n📡 [PROVING_GROUNDS]: Cache key stability audit...");

    // Dos frames idénticos colapsan a la misma llave perceptual.
    let frame_pixels = vec![128u8; (64 * 48 * 3) as usize];
    let first_hash = hash_frame_perceptual(&frame_pixels, 64, 48);
    let second_hash = hash_frame_perceptual(&frame_pixels, 64, 48);
    assert_eq!(first_hash, second_hash);
    assert_eq!(first_hash.len(), 32);

    // Un frame distinto produce otra llave.
    let altered_pixels = vec![200u8; (64 * 48 * 3) as usize];
    assert_ne!(first_hash, hash_frame_perceptual(&altered_pixels, 64, 48));

    // La cuantización a 4 decimales absorbe ruido sub-resolución.
    let base_embedding = vec![0.12341f32; 512];
    let jittered_embedding = vec![0.12344f32; 512];
    assert_eq!(
        hash_embedding_quantized(&base_embedding),
        hash_embedding_quantized(&jittered_embedding),
        "sub-quantization jitter must collapse to the same key"
    );

    let distinct_embedding = vec![0.2f32; 512];
    assert_ne!(
        hash_embedding_quantized(&base_embedding),
        hash_embedding_quantized(&distinct_embedding)
    );
    println!("   ✅ [SUCCESS]: Perceptual and quantized keys stable.");
}
