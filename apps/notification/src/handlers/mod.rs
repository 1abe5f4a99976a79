// [apps/notification/src/handlers/mod.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION HANDLERS ROOT (V2.1)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4-APP)
 * RESPONSABILIDAD: ADAPTADORES DE ENTRADA Y SOBRE DE ERROR CANÓNICO
 * =================================================================
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

/// CRUD de reglas, historial y acuses.
pub mod alerts;
/// CRUD de canales y pruebas de entrega.
pub mod channels;
/// Envío directo y logs de entrega.
pub mod delivery;
/// Punto de entrada del pipeline avistamiento -> alerta.
pub mod evaluation;
/// Ingest externo de avistamientos firmado HMAC.
pub mod webhook;
/// Salas WebSocket en tiempo real.
pub mod ws;

/// Sobre de error canónico de la plataforma.
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
    pub details: serde_json::Value,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: "not_found",
            message: message.into(),
            details: serde_json::json!({}),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "validation_error",
            message: message.into(),
            details: serde_json::json!({}),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            error: "illegal_transition",
            message: message.into(),
            details: serde_json::json!({}),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "invalid_signature",
            message: message.into(),
            details: serde_json::json!({}),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: "infrastructure_error",
            message: message.into(),
            details: serde_json::json!({}),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.error,
            "message": self.message,
            "details": self.details,
            "timestamp": Utc::now().to_rfc3339(),
        });
        (self.status, Json(body)).into_response()
    }
}
