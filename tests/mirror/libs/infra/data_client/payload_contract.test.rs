// [tests/mirror/libs/infra/data_client/payload_contract.test.rs]
/**
 * =================================================================
 * APARATO: DATA CLIENT CONTRACT TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * OBJETIVO: Certificar el sobre de evaluación y los guardas de config.
 * =================================================================
 */

use chrono::Utc;
use faceguard_domain_models::{Sighting, SightingSourceType};
use faceguard_infra_data_client::{CoreDataClient, DataClientError, NotificationClient};

fn sample_sighting() -> Sighting {
    Sighting {
        sighting_id: "local-sighting-1".into(),
        person_id: "person-42".into(),
        camera_id: "camera_0".into(),
        confidence: 0.91,
        timestamp: Utc::now(),
        face_bbox: vec![10.0, 12.0, 110.0, 140.0],
        face_crop_jpeg: Some(vec![0xFF, 0xD8]),
        quality_score: Some(0.82),
        source_type: SightingSourceType::CameraStream,
        frame_metadata: Some(serde_json::json!({"width": 1280, "height": 720})),
    }
}

#[test]
fn certify_empty_endpoints_are_rejected_at_construction() {
    println!("\n📡 [PROVING_GROUNDS]: Data client configuration guard audit...");
    assert!(matches!(CoreDataClient::new("  "), Err(DataClientError::Configuration(_))));
    assert!(matches!(NotificationClient::new(""), Err(DataClientError::Configuration(_))));
    assert!(CoreDataClient::new("http://localhost:8001").is_ok());
    println!("   ✅ [SUCCESS]: Void endpoints rejected before any network traffic.");
}

#[test]
fn certify_evaluation_payload_contract() {
    let sighting = sample_sighting();

    // Con id asignado por el servicio de datos: ese id manda.
    let payload = NotificationClient::build_evaluation_payload(&sighting, Some("assigned-77"));
    assert_eq!(payload["sighting_id"], "assigned-77");
    assert_eq!(payload["person_id"], "person-42");
    assert_eq!(payload["camera_id"], "camera_0");
    assert_eq!(payload["confidence_score"], 0.91);
    assert_eq!(payload["source_type"], "camera_stream");
    assert_eq!(payload["face_bbox"].as_array().unwrap().len(), 4);
    assert!(payload["timestamp"].as_str().unwrap().contains('T'), "RFC 3339 expected");
    assert_eq!(payload["metadata"]["width"], 1280);

    // Sin id asignado: degrada al identificador local.
    let fallback_payload = NotificationClient::build_evaluation_payload(&sighting, None);
    assert_eq!(fallback_payload["sighting_id"], "local-sighting-1");
}
