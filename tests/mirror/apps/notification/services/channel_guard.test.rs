// [tests/mirror/apps/notification/services/channel_guard.test.rs]
/**
 * =================================================================
 * APARATO: CHANNEL SAFEGUARD PROVING GROUNDS
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * OBJETIVO: Certificar la ventana deslizante de 60s y la doctrina
 *           completa del cortacircuitos (trip, half-open, reset).
 * =================================================================
 */

use std::time::{Duration, Instant};

use faceguard_notification::services::channel_guard::{
    BreakerState, CircuitBreakerBank, SlidingWindowRateLimiter, BREAKER_FAILURE_THRESHOLD,
    BREAKER_OPEN_COOLDOWN,
};

#[test]
fn certify_rate_limit_never_exceeds_window_budget() {
    println!("\n📡 [PROVING_GROUNDS]: Sliding window audit...");
    let rate_limiter = SlidingWindowRateLimiter::new();
    let t0 = Instant::now();

    // Límite 3: la cuarta admisión dentro de la misma ventana cae.
    for _ in 0..3 {
        assert!(rate_limiter.admit_and_record_at("channel-sms", 3, t0));
    }
    assert!(!rate_limiter.admit_and_record_at("channel-sms", 3, t0 + Duration::from_secs(30)));

    // Al deslizar la ventana 60s las marcas antiguas caducan.
    assert!(rate_limiter.admit_and_record_at("channel-sms", 3, t0 + Duration::from_secs(61)));
    println!("   ✅ [SUCCESS]: No more than L admissions per 60s window.");
}

#[test]
fn certify_rate_limit_is_per_channel() {
    let rate_limiter = SlidingWindowRateLimiter::new();
    let t0 = Instant::now();

    assert!(rate_limiter.admit_and_record_at("channel-a", 1, t0));
    assert!(!rate_limiter.admit_and_record_at("channel-a", 1, t0));
    // Otro canal conserva su presupuesto intacto.
    assert!(rate_limiter.admit_and_record_at("channel-b", 1, t0));
}

#[test]
fn certify_breaker_trips_after_five_consecutive_failures() {
    println!("\n📡 [PROVING_GROUNDS]: Circuit breaker trip audit...");
    let breaker_bank = CircuitBreakerBank::new();
    let t0 = Instant::now();

    for failure_number in 1..=BREAKER_FAILURE_THRESHOLD {
        assert!(
            breaker_bank.admits_at("channel-email", t0),
            "breaker must stay closed before failure {failure_number}"
        );
        breaker_bank.register_failure_at("channel-email", t0);
    }

    assert_eq!(breaker_bank.state_of("channel-email"), BreakerState::Open);
    assert!(!breaker_bank.admits_at("channel-email", t0 + Duration::from_secs(1)));
    assert!(
        !breaker_bank.admits_at("channel-email", t0 + BREAKER_OPEN_COOLDOWN - Duration::from_secs(1)),
        "no delivery may occur before next_attempt"
    );
    assert_eq!(breaker_bank.open_circuit_count(), 1);
    println!("   ✅ [SUCCESS]: Five failures -> OPEN for the full cooldown.");
}

#[test]
fn certify_half_open_probe_success_closes_and_zeroes() {
    let breaker_bank = CircuitBreakerBank::new();
    let t0 = Instant::now();

    for _ in 0..BREAKER_FAILURE_THRESHOLD {
        breaker_bank.register_failure_at("channel-x", t0);
    }
    assert_eq!(breaker_bank.state_of("channel-x"), BreakerState::Open);

    // Al vencer la hibernación el banco admite UNA sonda half-open.
    let probe_time = t0 + BREAKER_OPEN_COOLDOWN;
    assert!(breaker_bank.admits_at("channel-x", probe_time));
    assert_eq!(breaker_bank.state_of("channel-x"), BreakerState::HalfOpen);

    // La sonda exitosa cierra el circuito y pone el contador a cero:
    // cuatro fallos posteriores NO deben volver a disparar.
    breaker_bank.register_success("channel-x");
    assert_eq!(breaker_bank.state_of("channel-x"), BreakerState::Closed);

    for _ in 0..(BREAKER_FAILURE_THRESHOLD - 1) {
        breaker_bank.register_failure_at("channel-x", probe_time);
    }
    assert_eq!(breaker_bank.state_of("channel-x"), BreakerState::Closed);
}

#[test]
fn certify_half_open_probe_failure_reopens_immediately() {
    let breaker_bank = CircuitBreakerBank::new();
    let t0 = Instant::now();

    for _ in 0..BREAKER_FAILURE_THRESHOLD {
        breaker_bank.register_failure_at("channel-y", t0);
    }

    let probe_time = t0 + BREAKER_OPEN_COOLDOWN;
    assert!(breaker_bank.admits_at("channel-y", probe_time));

    breaker_bank.register_failure_at("channel-y", probe_time);
    assert_eq!(breaker_bank.state_of("channel-y"), BreakerState::Open);
    assert!(!breaker_bank.admits_at("channel-y", probe_time + Duration::from_secs(10)));
}
