//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("External API error: {0}")]
    ExternalApi(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Traduce un código SQLSTATE de Postgres a (status, mensaje amigable)
pub fn map_sql_state(code: &str) -> Option<(StatusCode, &'static str)> {
    match code {
        "23505" => Some((StatusCode::CONFLICT, "A record with this value already exists")),
        "23503" => Some((
            StatusCode::CONFLICT,
            "Referenced record does not exist or is still in use",
        )),
        "23514" => Some((StatusCode::BAD_REQUEST, "Value violates a check constraint")),
        _ => None,
    }
}

impl AppError {
    /// Status HTTP que corresponde a este error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Database(sqlx::Error::Database(db)) => db
                .code()
                .and_then(|code| map_sql_state(&code).map(|(status, _)| status))
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = match self {
            AppError::Database(sqlx::Error::RowNotFound) => {
                tracing::warn!("🔍 Row not found");
                ErrorResponse {
                    error: "Record not found".to_string(),
                    code: Some("NOT_FOUND".to_string()),
                    details: None,
                }
            }

            AppError::Database(sqlx::Error::Database(db)) => {
                let sql_code = db.code().map(|c| c.to_string());
                tracing::error!("❌ Database error ({:?}): {}", sql_code, db.message());
                let friendly = sql_code
                    .as_deref()
                    .and_then(map_sql_state)
                    .map(|(_, message)| message.to_string());
                ErrorResponse {
                    error: friendly.unwrap_or_else(|| db.message().to_string()),
                    code: sql_code,
                    details: Some(json!({
                        "message": db.message(),
                        "constraint": db.constraint(),
                    })),
                }
            }

            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                ErrorResponse {
                    error: e.to_string(),
                    code: Some("DB_ERROR".to_string()),
                    details: None,
                }
            }

            AppError::Validation(e) => {
                tracing::warn!("⚠️ Validation error: {}", e);
                ErrorResponse {
                    error: validation_summary(&e),
                    code: Some("VALIDATION_ERROR".to_string()),
                    details: Some(json!(e)),
                }
            }

            AppError::Unauthorized(msg) => {
                tracing::warn!("🔒 Unauthorized access: {}", msg);
                ErrorResponse {
                    error: msg,
                    code: Some("UNAUTHORIZED".to_string()),
                    details: None,
                }
            }

            AppError::Forbidden(msg) => {
                tracing::warn!("🚫 Forbidden access: {}", msg);
                ErrorResponse {
                    error: msg,
                    code: Some("FORBIDDEN".to_string()),
                    details: None,
                }
            }

            AppError::NotFound(msg) => {
                tracing::info!("🔍 Resource not found: {}", msg);
                ErrorResponse {
                    error: msg,
                    code: Some("NOT_FOUND".to_string()),
                    details: None,
                }
            }

            AppError::Conflict(msg) => {
                tracing::warn!("⚠️ Conflict: {}", msg);
                ErrorResponse {
                    error: msg,
                    code: Some("CONFLICT".to_string()),
                    details: None,
                }
            }

            AppError::BadRequest(msg) => {
                tracing::warn!("⚠️ Bad request: {}", msg);
                ErrorResponse {
                    error: msg,
                    code: Some("BAD_REQUEST".to_string()),
                    details: None,
                }
            }

            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                ErrorResponse {
                    error: "An unexpected error occurred".to_string(),
                    code: Some("INTERNAL_ERROR".to_string()),
                    details: Some(json!({ "internal_error": msg })),
                }
            }

            AppError::Jwt(msg) => {
                tracing::warn!("🔒 JWT error: {}", msg);
                ErrorResponse {
                    error: msg,
                    code: Some("JWT_ERROR".to_string()),
                    details: None,
                }
            }

            AppError::ExternalApi(msg) => {
                tracing::error!("❌ External API error: {}", msg);
                ErrorResponse {
                    error: "An error occurred while communicating with external service".to_string(),
                    code: Some("EXTERNAL_API_ERROR".to_string()),
                    details: Some(json!({ "external_api_error": msg })),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Primer mensaje legible de un conjunto de errores de validación
fn validation_summary(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value for '{}'", field),
            })
        })
        .next()
        .unwrap_or_else(|| "The provided data is invalid".to_string())
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_state_mapping() {
        assert_eq!(map_sql_state("23505").map(|(s, _)| s), Some(StatusCode::CONFLICT));
        assert_eq!(map_sql_state("23503").map(|(s, _)| s), Some(StatusCode::CONFLICT));
        assert_eq!(map_sql_state("23514").map(|(s, _)| s), Some(StatusCode::BAD_REQUEST));
        assert!(map_sql_state("42P01").is_none());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
