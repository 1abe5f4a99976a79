// [apps/notification/src/services/registry.rs]
/*!
 * =================================================================
 * APARATO: RULE / CHANNEL REGISTRIES & ALERT LEDGER (V2.5)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L2-APP)
 * RESPONSABILIDAD: ESPEJOS CALIENTES EN RAM DEL PLANO DECLARATIVO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. HOT MIRROR: Reglas, canales e instancias viven en RAM para la
 *    evaluación de baja latencia; el servicio de datos externo es el
 *    rastro autoritativo y se alimenta en tareas desprendidas.
 * 2. EXPLICIT TRANSITIONS: Las instancias de alerta solo mutan por
 *    transiciones legales (active->acknowledged->resolved, escalated).
 * =================================================================
 */

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use faceguard_domain_models::{AlertInstance, AlertPriority, AlertRule, AlertStatus, NotificationChannel};

/// Techo de instancias retenidas en el espejo caliente.
const ALERT_LEDGER_CAPACITY: usize = 1000;

// --- ESTRATO DE REGLAS ---

/// Registro en memoria de reglas de alerta declarativas.
pub struct RuleRegistry {
    rules: RwLock<HashMap<String, AlertRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: RwLock::new(HashMap::new()) }
    }

    pub fn upsert(&self, rule: AlertRule) {
        self.rules.write().expect("rule lock poisoned").insert(rule.id.clone(), rule);
    }

    pub fn remove(&self, rule_id: &str) -> bool {
        self.rules.write().expect("rule lock poisoned").remove(rule_id).is_some()
    }

    pub fn get(&self, rule_id: &str) -> Option<AlertRule> {
        self.rules.read().expect("rule lock poisoned").get(rule_id).cloned()
    }

    pub fn all(&self) -> Vec<AlertRule> {
        let mut all_rules: Vec<AlertRule> =
            self.rules.read().expect("rule lock poisoned").values().cloned().collect();
        all_rules.sort_by(|a, b| a.rule_name.cmp(&b.rule_name));
        all_rules
    }

    pub fn active(&self) -> Vec<AlertRule> {
        self.all().into_iter().filter(|rule| rule.is_active).collect()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// --- ESTRATO DE CANALES ---

/// Registro en memoria de canales de entrega.
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, NotificationChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self { channels: RwLock::new(HashMap::new()) }
    }

    pub fn upsert(&self, channel: NotificationChannel) {
        self.channels.write().expect("channel lock poisoned").insert(channel.id.clone(), channel);
    }

    pub fn remove(&self, channel_id: &str) -> bool {
        self.channels.write().expect("channel lock poisoned").remove(channel_id).is_some()
    }

    pub fn get(&self, channel_id: &str) -> Option<NotificationChannel> {
        self.channels.read().expect("channel lock poisoned").get(channel_id).cloned()
    }

    pub fn all(&self) -> Vec<NotificationChannel> {
        let mut all_channels: Vec<NotificationChannel> =
            self.channels.read().expect("channel lock poisoned").values().cloned().collect();
        all_channels.sort_by(|a, b| a.channel_name.cmp(&b.channel_name));
        all_channels
    }

    /// Resuelve ids a canales ACTIVOS; los ids huérfanos se descartan.
    pub fn resolve_active(&self, channel_ids: &[String]) -> Vec<NotificationChannel> {
        let channels_guard = self.channels.read().expect("channel lock poisoned");
        channel_ids
            .iter()
            .filter_map(|channel_id| channels_guard.get(channel_id))
            .filter(|channel| channel.is_active)
            .cloned()
            .collect()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// --- ESTRATO DE INSTANCIAS ---

/// Filtros de consulta del historial de alertas.
#[derive(Debug, Default, Clone)]
pub struct AlertHistoryFilter {
    pub person_id: Option<String>,
    pub camera_id: Option<String>,
    pub status: Option<AlertStatus>,
    pub limit: usize,
}

/// Espejo caliente de instancias de alerta con transiciones legales.
pub struct AlertLedger {
    strata: Mutex<LedgerStrata>,
}

struct LedgerStrata {
    instances: HashMap<String, AlertInstance>,
    insertion_order: VecDeque<String>,
}

impl AlertLedger {
    pub fn new() -> Self {
        Self {
            strata: Mutex::new(LedgerStrata {
                instances: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
        }
    }

    /// Inserta una instancia recién disparada; expulsa la más antigua
    /// al superar la capacidad del espejo.
    pub fn insert(&self, alert_instance: AlertInstance) {
        let mut strata_guard = self.strata.lock().expect("ledger lock poisoned");

        strata_guard.insertion_order.push_back(alert_instance.id.clone());
        strata_guard.instances.insert(alert_instance.id.clone(), alert_instance);

        while strata_guard.insertion_order.len() > ALERT_LEDGER_CAPACITY {
            if let Some(evicted_id) = strata_guard.insertion_order.pop_front() {
                strata_guard.instances.remove(&evicted_id);
            }
        }
    }

    pub fn get(&self, alert_id: &str) -> Option<AlertInstance> {
        self.strata.lock().expect("ledger lock poisoned").instances.get(alert_id).cloned()
    }

    /// active -> acknowledged. Registra quién y cuándo.
    pub fn acknowledge(
        &self,
        alert_id: &str,
        acknowledged_by: &str,
        now: DateTime<Utc>,
    ) -> Result<AlertInstance, String> {
        self.transition(alert_id, |instance| {
            if instance.status != AlertStatus::Active {
                return Err(format!(
                    "illegal transition: {:?} -> acknowledged",
                    instance.status
                ));
            }
            instance.status = AlertStatus::Acknowledged;
            instance.acknowledged_at = Some(now);
            instance.acknowledged_by = Some(acknowledged_by.to_string());
            Ok(())
        })
    }

    /// active | acknowledged -> resolved.
    pub fn resolve(
        &self,
        alert_id: &str,
        resolved_by: &str,
        now: DateTime<Utc>,
    ) -> Result<AlertInstance, String> {
        self.transition(alert_id, |instance| {
            if !matches!(instance.status, AlertStatus::Active | AlertStatus::Acknowledged) {
                return Err(format!("illegal transition: {:?} -> resolved", instance.status));
            }
            instance.status = AlertStatus::Resolved;
            instance.resolved_at = Some(now);
            instance.resolved_by = Some(resolved_by.to_string());
            Ok(())
        })
    }

    /// active -> escalated. Preserva la prioridad original en
    /// escalated_from y eleva la efectiva.
    pub fn escalate(
        &self,
        alert_id: &str,
        escalated_priority: AlertPriority,
        now: DateTime<Utc>,
    ) -> Result<AlertInstance, String> {
        self.transition(alert_id, |instance| {
            if instance.status != AlertStatus::Active {
                return Err(format!("illegal transition: {:?} -> escalated", instance.status));
            }
            instance.escalated_from = Some(instance.priority);
            instance.priority = escalated_priority;
            instance.status = AlertStatus::Escalated;
            instance.escalated_at = Some(now);
            Ok(())
        })
    }

    pub fn register_notification(&self, alert_id: &str, delivered_count: u32) {
        let mut strata_guard = self.strata.lock().expect("ledger lock poisoned");
        if let Some(instance) = strata_guard.instances.get_mut(alert_id) {
            instance.notification_count += delivered_count;
        }
    }

    /// Instancias activas con su antigüedad, para el centinela de escalamiento.
    pub fn active_alerts(&self) -> Vec<AlertInstance> {
        self.strata
            .lock()
            .expect("ledger lock poisoned")
            .instances
            .values()
            .filter(|instance| instance.status == AlertStatus::Active)
            .cloned()
            .collect()
    }

    /// Historial filtrado, más recientes primero.
    pub fn history(&self, filter: &AlertHistoryFilter) -> Vec<AlertInstance> {
        let strata_guard = self.strata.lock().expect("ledger lock poisoned");
        let result_limit = if filter.limit == 0 { 100 } else { filter.limit };

        strata_guard
            .insertion_order
            .iter()
            .rev()
            .filter_map(|alert_id| strata_guard.instances.get(alert_id))
            .filter(|instance| {
                filter.person_id.as_ref().map(|p| &instance.person_id == p).unwrap_or(true)
                    && filter.camera_id.as_ref().map(|c| &instance.camera_id == c).unwrap_or(true)
                    && filter.status.map(|s| instance.status == s).unwrap_or(true)
            })
            .take(result_limit)
            .cloned()
            .collect()
    }

    pub fn total_count(&self) -> usize {
        self.strata.lock().expect("ledger lock poisoned").instances.len()
    }

    fn transition<F>(&self, alert_id: &str, mutate: F) -> Result<AlertInstance, String>
    where
        F: FnOnce(&mut AlertInstance) -> Result<(), String>,
    {
        let mut strata_guard = self.strata.lock().expect("ledger lock poisoned");
        let instance = strata_guard
            .instances
            .get_mut(alert_id)
            .ok_or_else(|| format!("alert '{alert_id}' not found"))?;

        mutate(instance)?;
        Ok(instance.clone())
    }
}

impl Default for AlertLedger {
    fn default() -> Self {
        Self::new()
    }
}
