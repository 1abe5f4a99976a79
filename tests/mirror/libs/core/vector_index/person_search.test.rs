// [tests/mirror/libs/core/vector_index/person_search.test.rs]
/**
 * =================================================================
 * APARATO: PERSON SEARCH PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * OBJETIVO: Certificar el emparejamiento exhaustivo y su determinismo.
 * =================================================================
 */

use faceguard_core_vector_index::{IndexError, VectorIndex};
use faceguard_domain_models::{PersonEmbedding, EMBEDDING_DIMENSION};

/// Vector de 512 dimensiones con masa concentrada en un eje.
fn axis_vector(axis: usize, magnitude: f32) -> Vec<f32> {
    let mut vector = vec![0.001f32; EMBEDDING_DIMENSION];
    vector[axis] = magnitude;
    vector
}

fn embedding_for(person_id: &str, embedding_id: &str, vector: Vec<f32>) -> PersonEmbedding {
    PersonEmbedding {
        embedding_id: embedding_id.to_string(),
        person_id: person_id.to_string(),
        vector,
        quality_score: 0.9,
        confidence_score: 0.95,
        model_name: "arcface".to_string(),
        model_version: "r100".to_string(),
    }
}

#[test]
fn certify_dimension_and_norm_invariants() {
    println!("\n📡 [PROVING_GROUNDS]: Vector Index invariants audit...");
    let index = VectorIndex::new();

    let short_vector = embedding_for("p1", "e1", vec![1.0; 64]);
    assert!(matches!(
        index.add_embedding(short_vector),
        Err(IndexError::DimensionMismatch { expected: 512, received: 64 })
    ));

    let mut poisoned = axis_vector(0, 1.0);
    poisoned[7] = f32::NAN;
    assert!(matches!(
        index.add_embedding(embedding_for("p1", "e2", poisoned)),
        Err(IndexError::NonFiniteNorm { .. })
    ));

    assert!(index.add_embedding(embedding_for("p1", "e3", axis_vector(0, 1.0))).is_ok());
    assert_eq!(index.total_vectors(), 1);
    println!("   ✅ [SUCCESS]: Dimension and norm gates enforced.");
}

#[test]
fn certify_search_similar_ordering_and_threshold() {
    let index = VectorIndex::new();
    index.add_embedding(embedding_for("alpha", "a1", axis_vector(0, 1.0))).unwrap();
    index.add_embedding(embedding_for("beta", "b1", axis_vector(1, 1.0))).unwrap();
    index.add_embedding(embedding_for("gamma", "g1", axis_vector(2, 1.0))).unwrap();

    // Consulta alineada con alpha, con fuga menor hacia beta.
    let mut query = axis_vector(0, 1.0);
    query[1] = 0.3;

    let matches = index.search_similar(&query, 10, 0.10).unwrap();
    assert!(!matches.is_empty());
    assert_eq!(matches[0].person_id, "alpha");
    for window in matches.windows(2) {
        assert!(window[0].similarity >= window[1].similarity, "descending order violated");
    }

    // Umbral imposible: galería vacía de resultados.
    let strict_matches = index.search_similar(&query, 10, 0.999).unwrap();
    assert!(strict_matches.iter().all(|m| m.person_id == "alpha"));
}

#[test]
fn certify_search_person_evaluates_every_embedding() {
    println!("\n📡 [PROVING_GROUNDS]: Exhaustive per-person match audit...");
    let index = VectorIndex::new();

    // 'veteran' tiene un embedding mediocre y uno excelente: el máximo
    // por persona debe rescatarlo frente a 'impostor'.
    index.add_embedding(embedding_for("veteran", "v-old", axis_vector(3, 1.0))).unwrap();
    let mut veteran_sharp = axis_vector(0, 1.0);
    veteran_sharp[3] = 0.05;
    index.add_embedding(embedding_for("veteran", "v-new", veteran_sharp)).unwrap();

    let mut impostor_vector = axis_vector(0, 0.8);
    impostor_vector[5] = 0.7;
    index.add_embedding(embedding_for("impostor", "i-1", impostor_vector)).unwrap();

    let verdict = index.search_person(&axis_vector(0, 1.0), 0.5).unwrap().expect("match expected");
    assert_eq!(verdict.person_id, "veteran");
    assert_eq!(verdict.embeddings_evaluated, 2);
    assert!(verdict.max_similarity > 0.95);
    println!("   ✅ [SUCCESS]: Best person chosen by per-person MAX similarity.");
}

#[test]
fn certify_tie_break_by_mean_similarity() {
    let index = VectorIndex::new();

    // Ambas personas comparten un embedding idéntico al de la consulta
    // (máximos empatados); 'consistent' añade un segundo vector cercano
    // y 'erratic' uno ortogonal: gana la media más alta.
    let query = axis_vector(0, 1.0);

    index.add_embedding(embedding_for("consistent", "c1", axis_vector(0, 1.0))).unwrap();
    let mut near_query = axis_vector(0, 1.0);
    near_query[1] = 0.1;
    index.add_embedding(embedding_for("consistent", "c2", near_query)).unwrap();

    index.add_embedding(embedding_for("erratic", "e1", axis_vector(0, 1.0))).unwrap();
    index.add_embedding(embedding_for("erratic", "e2", axis_vector(9, 1.0))).unwrap();

    let verdict = index.search_person(&query, 0.3).unwrap().expect("match expected");
    assert_eq!(verdict.person_id, "consistent", "mean-similarity tie-break violated");

    // Determinismo: la misma consulta produce el mismo veredicto.
    for _ in 0..5 {
        let replay = index.search_person(&query, 0.3).unwrap().expect("match expected");
        assert_eq!(replay.person_id, verdict.person_id);
        assert_eq!(replay.max_similarity, verdict.max_similarity);
    }
}

#[test]
fn certify_below_threshold_yields_none() {
    let index = VectorIndex::new();
    index.add_embedding(embedding_for("alpha", "a1", axis_vector(0, 1.0))).unwrap();

    let orthogonal_query = axis_vector(200, 1.0);
    assert!(index.search_person(&orthogonal_query, 0.6).unwrap().is_none());

    assert_eq!(index.remove_person("alpha").unwrap(), 1);
    assert_eq!(index.total_vectors(), 0);
}
