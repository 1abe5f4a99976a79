// [tests/mirror/libs/shared/watchtower/watchtower_integrity.test.rs]
/**
 * =================================================================
 * APARATO: WATCHTOWER INTEGRITY TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Certificar la ignición única del estrato de observabilidad.
 * =================================================================
 */

use faceguard_shared_watchtower::init_tracing;

#[test]
fn certify_tracing_ignition_and_panic_shield() {
    println!("\n📡 [PROVING_GROUNDS]: Watchtower ignition audit...");

    // La ignición instala el suscriptor global y el hook de pánicos
    // sin colapsar el proceso.
    init_tracing("faceguard_proving_grounds");

    tracing::info!("signal emitted through the levelized subscriber");

    // El hook de pánico captura y registra sin impedir el unwinding.
    let captured_panic = std::panic::catch_unwind(|| {
        panic!("controlled collapse for shield certification");
    });
    assert!(captured_panic.is_err());

    println!("✅ WATCHTOWER: Observability strata certified.");
}
