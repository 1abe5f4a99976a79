// [apps/notification/src/services/rule_engine.rs]
/*!
 * =================================================================
 * APARATO: ALERT RULE ENGINE (V2.8 - CONJUNCTION MASTER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2-APP)
 * RESPONSABILIDAD: EMPAREJAMIENTO DECLARATIVO Y LEDGER DE ENFRIAMIENTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CONJUNCTION SEMANTICS: Una regla empareja cuando TODAS sus
 *    condiciones configuradas se cumplen; las exclusiones se evalúan
 *    primero y 'any_person' al final como cortocircuito positivo.
 * 2. COOLDOWN ATOMICITY: El ledger verifica e inserta la expiración
 *    bajo el mismo cerrojo ANTES de la emisión, garantizando
 *    a-lo-sumo-una-alerta por ventana y por (regla, persona, cámara).
 * =================================================================
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use faceguard_domain_models::TriggerConditions;
use tracing::debug;

/// Contexto de un avistamiento frente al motor de reglas.
#[derive(Debug, Clone)]
pub struct SightingContext {
    pub person_id: String,
    pub camera_id: String,
    pub confidence: f64,
    pub location_id: Option<String>,
    pub department: Option<String>,
    pub access_level: Option<u32>,
}

/// Evalúa si las condiciones de una regla emparejan el avistamiento.
///
/// Orden de evaluación: exclusiones -> condiciones positivas ->
/// any_person (último). Una regla sin condición positiva alguna y sin
/// any_person NO empareja: el disparo universal debe ser explícito.
pub fn rule_matches(
    conditions: &TriggerConditions,
    sighting: &SightingContext,
    evaluation_hour: u8,
) -> bool {
    // 1. EXCLUSIONES: siempre se honran, incluso con any_person.
    if let Some(excluded_persons) = &conditions.excluded_persons {
        if excluded_persons.iter().any(|excluded| excluded == &sighting.person_id) {
            return false;
        }
    }

    let mut positive_condition_present = false;

    // 2. CONJUNCIÓN DE CONDICIONES POSITIVAS CONFIGURADAS.
    if let Some(person_ids) = &conditions.person_ids {
        positive_condition_present = true;
        if !person_ids.iter().any(|candidate| candidate == &sighting.person_id) {
            return false;
        }
    }

    if let Some(camera_ids) = &conditions.camera_ids {
        positive_condition_present = true;
        if !camera_ids.iter().any(|candidate| candidate == &sighting.camera_id) {
            return false;
        }
    }

    if let Some(confidence_min) = conditions.confidence_min {
        positive_condition_present = true;
        if sighting.confidence < confidence_min {
            return false;
        }
    }

    if let Some(confidence_max) = conditions.confidence_max {
        positive_condition_present = true;
        if sighting.confidence > confidence_max {
            return false;
        }
    }

    if let Some(time_ranges) = &conditions.time_ranges {
        positive_condition_present = true;
        let hour_in_any_range = time_ranges
            .iter()
            .any(|range| range.start_hour <= evaluation_hour && evaluation_hour < range.end_hour);
        if !hour_in_any_range {
            return false;
        }
    }

    if let Some(location_ids) = &conditions.location_ids {
        positive_condition_present = true;
        let location_matches = sighting
            .location_id
            .as_ref()
            .map(|location| location_ids.iter().any(|candidate| candidate == location))
            .unwrap_or(false);
        if !location_matches {
            return false;
        }
    }

    if let Some(departments) = &conditions.departments {
        positive_condition_present = true;
        let department_matches = sighting
            .department
            .as_ref()
            .map(|department| departments.iter().any(|candidate| candidate == department))
            .unwrap_or(false);
        if !department_matches {
            return false;
        }
    }

    if let Some(min_access_level) = conditions.min_access_level {
        positive_condition_present = true;
        if sighting.access_level.unwrap_or(0) < min_access_level {
            return false;
        }
    }

    // 3. ANY_PERSON: cortocircuito positivo, evaluado al final.
    if conditions.any_person {
        return true;
    }

    positive_condition_present
}

// --- ESTRATO DE ENFRIAMIENTO ---

type CooldownKey = (String, String, String);

/// Ledger de enfriamiento por (regla, persona, cámara) con expiración.
pub struct CooldownLedger {
    expirations: Mutex<HashMap<CooldownKey, DateTime<Utc>>>,
    pub cooldown_skipped: AtomicU64,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self { expirations: Mutex::new(HashMap::new()), cooldown_skipped: AtomicU64::new(0) }
    }

    /// Adquiere la ventana de emisión. Con expiración futura vigente
    /// devuelve false y cuenta el salto; en caso contrario sella la
    /// nueva expiración ANTES de permitir la emisión.
    pub fn acquire(
        &self,
        rule_id: &str,
        person_id: &str,
        camera_id: &str,
        cooldown_minutes: u32,
    ) -> bool {
        self.acquire_at(rule_id, person_id, camera_id, cooldown_minutes, Utc::now())
    }

    /// Variante de reloj inyectable para certificación determinista.
    pub fn acquire_at(
        &self,
        rule_id: &str,
        person_id: &str,
        camera_id: &str,
        cooldown_minutes: u32,
        now: DateTime<Utc>,
    ) -> bool {
        let cooldown_key =
            (rule_id.to_string(), person_id.to_string(), camera_id.to_string());

        let mut expirations_guard = self.expirations.lock().expect("cooldown lock poisoned");

        if let Some(expiry) = expirations_guard.get(&cooldown_key) {
            if *expiry > now {
                self.cooldown_skipped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "🧊 [COOLDOWN]: Rule {} in cooldown for ({}, {}). Skipping.",
                    rule_id, person_id, camera_id
                );
                return false;
            }
            expirations_guard.remove(&cooldown_key);
        }

        if cooldown_minutes > 0 {
            expirations_guard
                .insert(cooldown_key, now + Duration::minutes(i64::from(cooldown_minutes)));
        }

        true
    }

    /// Poda de expiraciones vencidas; devuelve cuántas cayeron.
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut expirations_guard = self.expirations.lock().expect("cooldown lock poisoned");
        let before_purge = expirations_guard.len();
        expirations_guard.retain(|_, expiry| *expiry > now);
        before_purge - expirations_guard.len()
    }

    pub fn active_count(&self) -> usize {
        self.expirations.lock().expect("cooldown lock poisoned").len()
    }

    pub fn skipped_count(&self) -> u64 {
        self.cooldown_skipped.load(Ordering::Relaxed)
    }
}

impl Default for CooldownLedger {
    fn default() -> Self {
        Self::new()
    }
}
