// [apps/notification/src/handlers/alerts.rs]
/*!
 * =================================================================
 * APARATO: ALERT RULE HANDLERS (V2.4 - DECLARATIVE SURFACE)
 * CLASIFICACIÓN: API HANDLER (ESTRATO L4-APP)
 * RESPONSABILIDAD: CRUD DE REGLAS, HISTORIAL Y ACUSES DE ALERTA
 * =================================================================
 */

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use faceguard_domain_models::{AlertPriority, AlertRule, AlertStatus, TriggerConditions};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::ApiError;
use crate::services::AlertHistoryFilter;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub rule_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: AlertPriority,
    #[serde(default)]
    pub trigger_conditions: TriggerConditions,
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u32,
    #[serde(default)]
    pub escalation_minutes: Option<u32>,
    #[serde(default)]
    pub auto_resolve_minutes: Option<u32>,
    #[serde(default)]
    pub notification_channel_ids: Vec<String>,
    #[serde(default)]
    pub notification_template: Option<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_cooldown_minutes() -> u32 {
    30
}

fn default_is_active() -> bool {
    true
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub camera_id: Option<String>,
    #[serde(default)]
    pub status: Option<AlertStatus>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct AcknowledgeRequest {
    #[serde(default = "default_operator")]
    pub acknowledged_by: String,
}

fn default_operator() -> String {
    "operator".to_string()
}

/// GET /alerts/rules
pub async fn handle_list_rules(State(application_state): State<AppState>) -> Json<serde_json::Value> {
    let alert_rules = application_state.rule_registry.all();
    Json(serde_json::json!({
        "alert_rules": alert_rules,
        "total": alert_rules.len(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// POST /alerts/rules
pub async fn handle_create_rule(
    State(application_state): State<AppState>,
    Json(request): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<AlertRule>), ApiError> {
    if request.rule_name.trim().is_empty() {
        return Err(ApiError::validation("rule_name must not be empty"));
    }

    let alert_rule = AlertRule {
        id: Uuid::new_v4().to_string(),
        rule_name: request.rule_name,
        description: request.description,
        priority: request.priority,
        trigger_conditions: request.trigger_conditions,
        cooldown_minutes: request.cooldown_minutes,
        escalation_minutes: request.escalation_minutes,
        auto_resolve_minutes: request.auto_resolve_minutes,
        notification_channel_ids: request.notification_channel_ids,
        notification_template: request.notification_template,
        is_active: request.is_active,
    };

    application_state.rule_registry.upsert(alert_rule.clone());
    Ok((StatusCode::CREATED, Json(alert_rule)))
}

/// GET /alerts/rules/{id}
pub async fn handle_get_rule(
    State(application_state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<Json<AlertRule>, ApiError> {
    application_state
        .rule_registry
        .get(&rule_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("alert rule '{rule_id}' not found")))
}

/// PUT /alerts/rules/{id}
pub async fn handle_update_rule(
    State(application_state): State<AppState>,
    Path(rule_id): Path<String>,
    Json(request): Json<CreateRuleRequest>,
) -> Result<Json<AlertRule>, ApiError> {
    if application_state.rule_registry.get(&rule_id).is_none() {
        return Err(ApiError::not_found(format!("alert rule '{rule_id}' not found")));
    }

    let updated_rule = AlertRule {
        id: rule_id,
        rule_name: request.rule_name,
        description: request.description,
        priority: request.priority,
        trigger_conditions: request.trigger_conditions,
        cooldown_minutes: request.cooldown_minutes,
        escalation_minutes: request.escalation_minutes,
        auto_resolve_minutes: request.auto_resolve_minutes,
        notification_channel_ids: request.notification_channel_ids,
        notification_template: request.notification_template,
        is_active: request.is_active,
    };

    application_state.rule_registry.upsert(updated_rule.clone());
    Ok(Json(updated_rule))
}

/// DELETE /alerts/rules/{id}
pub async fn handle_delete_rule(
    State(application_state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !application_state.rule_registry.remove(&rule_id) {
        return Err(ApiError::not_found(format!("alert rule '{rule_id}' not found")));
    }

    Ok(Json(serde_json::json!({
        "rule_id": rule_id,
        "status": "deleted",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// GET /alerts/history — instancias con filtros.
pub async fn handle_alert_history(
    State(application_state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<serde_json::Value> {
    let history_filter = AlertHistoryFilter {
        person_id: query.person_id,
        camera_id: query.camera_id,
        status: query.status,
        limit: query.limit.unwrap_or(100),
    };

    let alert_instances = application_state.alert_ledger.history(&history_filter);

    Json(serde_json::json!({
        "alerts": alert_instances,
        "total": alert_instances.len(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// POST /alerts/acknowledge/{id}
pub async fn handle_acknowledge_alert(
    State(application_state): State<AppState>,
    Path(alert_id): Path<String>,
    Json(request): Json<AcknowledgeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let acknowledged_instance = application_state
        .alert_evaluator
        .acknowledge_alert(&alert_id, &request.acknowledged_by)
        .map_err(|transition_fault| {
            if transition_fault.contains("not found") {
                ApiError::not_found(transition_fault)
            } else {
                ApiError::conflict(transition_fault)
            }
        })?;

    Ok(Json(serde_json::json!({
        "alert": acknowledged_instance,
        "status": "acknowledged",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
