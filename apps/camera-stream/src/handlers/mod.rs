// [apps/camera-stream/src/handlers/mod.rs]
/*!
 * =================================================================
 * APARATO: HTTP HANDLERS ROOT (V2.1 - ENVELOPE DISCIPLINE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4-APP)
 * RESPONSABILIDAD: ADAPTADORES DE ENTRADA Y SOBRE DE ERROR CANÓNICO
 *
 * # Contrato de error:
 * Validación y dominio -> 4xx; infraestructura -> 5xx. Cuerpo
 * uniforme {error, message, details} con marca RFC 3339.
 * =================================================================
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

/// Control y telemetría de cámaras.
pub mod cameras;
/// Superficie de salud y sondas de orquestación.
pub mod health;

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

    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: "infrastructure_error",
            message: message.into(),
            details: serde_json::json!({}),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
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
