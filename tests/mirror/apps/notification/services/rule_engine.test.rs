// [tests/mirror/apps/notification/services/rule_engine.test.rs]
/**
 * =================================================================
 * APARATO: RULE ENGINE PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * OBJETIVO: Certificar la conjunción de condiciones, exclusiones y
 *           el cortocircuito any_person.
 * =================================================================
 */

use faceguard_notification::services::rule_engine::{rule_matches, SightingContext};
use faceguard_domain_models::{TimeRange, TriggerConditions};

fn bench_sighting() -> SightingContext {
    SightingContext {
        person_id: "person-42".into(),
        camera_id: "camera_0".into(),
        confidence: 0.85,
        location_id: Some("lobby".into()),
        department: Some("engineering".into()),
        access_level: Some(3),
    }
}

#[test]
fn certify_conjunction_of_all_configured_conditions() {
    println!("\n📡 [PROVING_GROUNDS]: Rule conjunction audit...");
    let sighting = bench_sighting();

    let full_conditions = TriggerConditions {
        person_ids: Some(vec!["person-42".into(), "person-7".into()]),
        camera_ids: Some(vec!["camera_0".into()]),
        confidence_min: Some(0.7),
        confidence_max: Some(0.95),
        time_ranges: Some(vec![TimeRange { start_hour: 0, end_hour: 24 }]),
        location_ids: Some(vec!["lobby".into()]),
        departments: Some(vec!["engineering".into()]),
        min_access_level: Some(2),
        ..Default::default()
    };
    assert!(rule_matches(&full_conditions, &sighting, 12));

    // Una sola condición fallida rompe la conjunción completa.
    let mut broken_camera = full_conditions.clone();
    broken_camera.camera_ids = Some(vec!["camera_9".into()]);
    assert!(!rule_matches(&broken_camera, &sighting, 12));

    let mut broken_confidence = full_conditions.clone();
    broken_confidence.confidence_min = Some(0.90);
    assert!(!rule_matches(&broken_confidence, &sighting, 12));

    let mut broken_access = full_conditions;
    broken_access.min_access_level = Some(5);
    assert!(!rule_matches(&broken_access, &sighting, 12));

    println!("   ✅ [SUCCESS]: AND semantics enforced across every condition.");
}

#[test]
fn certify_exclusions_always_win() {
    let sighting = bench_sighting();

    // La exclusión domina incluso sobre any_person.
    let excluded_any = TriggerConditions {
        excluded_persons: Some(vec!["person-42".into()]),
        any_person: true,
        ..Default::default()
    };
    assert!(!rule_matches(&excluded_any, &sighting, 12));

    let excluded_listed = TriggerConditions {
        person_ids: Some(vec!["person-42".into()]),
        excluded_persons: Some(vec!["person-42".into()]),
        ..Default::default()
    };
    assert!(!rule_matches(&excluded_listed, &sighting, 12));
}

#[test]
fn certify_any_person_short_circuit() {
    let sighting = bench_sighting();

    // any_person sin más condiciones: dispara con cualquier identidad.
    let universal = TriggerConditions { any_person: true, ..Default::default() };
    assert!(rule_matches(&universal, &sighting, 3));

    // Sin condición positiva alguna y sin any_person: el disparo
    // universal debe ser explícito, nunca accidental.
    let vacuous = TriggerConditions::default();
    assert!(!rule_matches(&vacuous, &sighting, 3));
}

#[test]
fn certify_time_range_window() {
    let sighting = bench_sighting();
    let night_watch = TriggerConditions {
        any_person: true,
        time_ranges: Some(vec![
            TimeRange { start_hour: 22, end_hour: 24 },
            TimeRange { start_hour: 0, end_hour: 6 },
        ]),
        ..Default::default()
    };

    assert!(rule_matches(&night_watch, &sighting, 23));
    assert!(rule_matches(&night_watch, &sighting, 2));
    assert!(!rule_matches(&night_watch, &sighting, 12));
    // Frontera superior exclusiva: las 06:00 ya no pertenecen al turno.
    assert!(!rule_matches(&night_watch, &sighting, 6));
}

#[test]
fn certify_missing_person_attributes_fail_closed() {
    let mut anonymous_sighting = bench_sighting();
    anonymous_sighting.department = None;
    anonymous_sighting.access_level = None;
    anonymous_sighting.location_id = None;

    let department_gate = TriggerConditions {
        departments: Some(vec!["engineering".into()]),
        ..Default::default()
    };
    assert!(!rule_matches(&department_gate, &anonymous_sighting, 12));

    let access_gate =
        TriggerConditions { min_access_level: Some(1), ..Default::default() };
    assert!(!rule_matches(&access_gate, &anonymous_sighting, 12));
}
