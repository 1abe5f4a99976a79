// [apps/notification/src/services/channel_guard.rs]
/*!
 * =================================================================
 * APARATO: CHANNEL SAFEGUARD BANK (V2.7 - RESILIENCE CORE)
 * CLASIFICACIÓN: DELIVERY INFRASTRUCTURE (ESTRATO L4-APP)
 * RESPONSABILIDAD: VENTANA DESLIZANTE Y CORTACIRCUITOS POR CANAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SLIDING WINDOW: Techo de envíos por canal en los últimos 60s;
 *    la poda de marcas antiguas ocurre en cada admisión.
 * 2. BREAKER DOCTRINE: 5 fallos consecutivos abren el circuito por
 *    5 minutos; al vencer admite UNA sonda (half-open); el éxito
 *    cierra y pone el contador a cero.
 * 3. INJECTABLE CLOCK: Las variantes *_at reciben el instante para
 *    certificación determinista en el espejo de pruebas.
 *
 * # Mathematical Proof (Rate Limit Window):
 * Para límite L, la ventana retiene a lo sumo L marcas con edad < 60s;
 * la admisión L+1 dentro de la ventana es imposible por construcción.
 * =================================================================
 */

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Ventana deslizante del límite de tasa: 60 segundos.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Fallos consecutivos que disparan el cortacircuitos.
pub const BREAKER_FAILURE_THRESHOLD: u32 = 5;

/// Hibernación del circuito abierto: 5 minutos.
pub const BREAKER_OPEN_COOLDOWN: Duration = Duration::from_secs(300);

// --- ESTRATO DE LÍMITE DE TASA ---

/// Limitador por canal con ventana deslizante de marcas de envío.
pub struct SlidingWindowRateLimiter {
    send_windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowRateLimiter {
    pub fn new() -> Self {
        Self { send_windows: Mutex::new(HashMap::new()) }
    }

    /// Admite y registra el envío si la ventana no alcanzó el límite.
    pub fn admit_and_record(&self, channel_id: &str, limit_per_minute: u32) -> bool {
        self.admit_and_record_at(channel_id, limit_per_minute, Instant::now())
    }

    /// Variante de reloj inyectable para certificación determinista.
    pub fn admit_and_record_at(&self, channel_id: &str, limit_per_minute: u32, now: Instant) -> bool {
        let mut windows_guard = self.send_windows.lock().expect("rate window lock poisoned");
        let channel_window = windows_guard.entry(channel_id.to_string()).or_default();

        // Poda de marcas fuera de la ventana de 60 segundos.
        while let Some(oldest_mark) = channel_window.front() {
            if now.duration_since(*oldest_mark) >= RATE_LIMIT_WINDOW {
                channel_window.pop_front();
            } else {
                break;
            }
        }

        if channel_window.len() >= limit_per_minute as usize {
            debug!("⏳ [RATE_LIMITER]: Channel {} saturated ({} in window).", channel_id, channel_window.len());
            return false;
        }

        channel_window.push_back(now);
        true
    }

    pub fn saturated_channel_count(&self, limit_per_minute: u32) -> usize {
        let windows_guard = self.send_windows.lock().expect("rate window lock poisoned");
        windows_guard
            .values()
            .filter(|window| window.len() >= limit_per_minute as usize)
            .count()
    }
}

impl Default for SlidingWindowRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

// --- ESTRATO DE CORTACIRCUITOS ---

/// Estados del cortacircuitos por canal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

struct BreakerStrata {
    state: BreakerState,
    consecutive_failures: u32,
    next_attempt: Option<Instant>,
}

impl Default for BreakerStrata {
    fn default() -> Self {
        Self { state: BreakerState::Closed, consecutive_failures: 0, next_attempt: None }
    }
}

/// Banco de cortacircuitos por identificador de canal.
pub struct CircuitBreakerBank {
    breakers: Mutex<HashMap<String, BreakerStrata>>,
}

impl CircuitBreakerBank {
    pub fn new() -> Self {
        Self { breakers: Mutex::new(HashMap::new()) }
    }

    /// ¿Admite el canal una entrega? Un circuito abierto rechaza todo
    /// hasta next_attempt; al vencer transiciona a half-open y admite
    /// exactamente la sonda.
    pub fn admits(&self, channel_id: &str) -> bool {
        self.admits_at(channel_id, Instant::now())
    }

    pub fn admits_at(&self, channel_id: &str, now: Instant) -> bool {
        let mut breakers_guard = self.breakers.lock().expect("breaker lock poisoned");
        let breaker = breakers_guard.entry(channel_id.to_string()).or_default();

        match breaker.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => match breaker.next_attempt {
                Some(next_attempt) if now >= next_attempt => {
                    breaker.state = BreakerState::HalfOpen;
                    debug!("🔦 [CIRCUIT_BREAKER]: Channel {} admitted half-open probe.", channel_id);
                    true
                }
                _ => false,
            },
        }
    }

    /// Registra un fallo de entrega. Cinco consecutivos abren el
    /// circuito; una sonda half-open fallida reabre de inmediato.
    pub fn register_failure(&self, channel_id: &str) {
        self.register_failure_at(channel_id, Instant::now())
    }

    pub fn register_failure_at(&self, channel_id: &str, now: Instant) {
        let mut breakers_guard = self.breakers.lock().expect("breaker lock poisoned");
        let breaker = breakers_guard.entry(channel_id.to_string()).or_default();

        breaker.consecutive_failures += 1;

        let should_trip = breaker.state == BreakerState::HalfOpen
            || breaker.consecutive_failures >= BREAKER_FAILURE_THRESHOLD;

        if should_trip {
            breaker.state = BreakerState::Open;
            breaker.next_attempt = Some(now + BREAKER_OPEN_COOLDOWN);
            warn!(
                "🛑 [CIRCUIT_BREAKER]: Channel {} tripped OPEN after {} consecutive failures.",
                channel_id, breaker.consecutive_failures
            );
        }
    }

    /// Un éxito cualquiera cierra el circuito y pone el contador a cero.
    pub fn register_success(&self, channel_id: &str) {
        let mut breakers_guard = self.breakers.lock().expect("breaker lock poisoned");
        let breaker = breakers_guard.entry(channel_id.to_string()).or_default();

        if breaker.state != BreakerState::Closed {
            debug!("✅ [CIRCUIT_BREAKER]: Channel {} recovered. Circuit closed.", channel_id);
        }
        *breaker = BreakerStrata::default();
    }

    pub fn state_of(&self, channel_id: &str) -> BreakerState {
        self.breakers
            .lock()
            .expect("breaker lock poisoned")
            .get(channel_id)
            .map(|breaker| breaker.state)
            .unwrap_or(BreakerState::Closed)
    }

    pub fn open_circuit_count(&self) -> usize {
        self.breakers
            .lock()
            .expect("breaker lock poisoned")
            .values()
            .filter(|breaker| breaker.state == BreakerState::Open)
            .count()
    }
}

impl Default for CircuitBreakerBank {
    fn default() -> Self {
        Self::new()
    }
}
