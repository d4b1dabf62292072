//! Unified error handling with Sentry integration.
//!
//! Provides a unified `ApiError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, ApiError>`.
//!
//! Every error renders the same JSON envelope:
//!
//! ```json
//! {"success": false, "error": {"type": "...", "code": "...", "message": "...",
//!  "timestamp": "...", "debug": "..."}}
//! ```
//!
//! `debug` is attached only when the server runs with `APP_ENV=development`.
//! Validation failures additionally carry a `errors` map of field-level
//! messages.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::recaptcha::RecaptchaError;
use crate::services::resend::ResendError;

/// Whether debug detail is attached to error responses.
///
/// Set once at startup from `ApiConfig::development`; defaults to off so a
/// missed initialization can never leak detail.
static DEVELOPMENT: OnceLock<bool> = OnceLock::new();

/// Enable or disable debug detail in error responses. Call once at startup.
pub fn set_development(enabled: bool) {
    let _ = DEVELOPMENT.set(enabled);
}

fn is_development() -> bool {
    DEVELOPMENT.get().copied().unwrap_or(false)
}

/// Field-level validation errors, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Outbound email operation failed.
    #[error("Email error: {0}")]
    Email(#[from] ResendError),

    /// reCAPTCHA verification could not be performed.
    #[error("reCAPTCHA error: {0}")]
    Recaptcha(#[from] RecaptchaError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request failed field-level validation.
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Query too large to serve.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The `error` object of the uniform envelope.
#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: &'static str,
    code: String,
    message: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<String>,
}

/// The uniform error envelope.
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Email(_) | Self::Recaptcha(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => err.status(),
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ResourceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Email(_) | Self::Recaptcha(_) | Self::Internal(_) => {
                "server_error"
            }
            Self::Auth(err) => {
                if err.status() == StatusCode::UNAUTHORIZED {
                    "unauthorized"
                } else {
                    "server_error"
                }
            }
            Self::Unauthorized(_) => "unauthorized",
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::ResourceExhausted(_) => "resource_exhausted",
        }
    }

    /// User-facing message; never exposes internal detail outside development.
    fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => {
                "An internal server error occurred. Please try again later.".to_string()
            }
            Self::Email(_) | Self::Recaptcha(_) => {
                "Service temporarily unavailable. Please try again later.".to_string()
            }
            Self::Auth(err) => err.public_message().to_string(),
            Self::Validation(_) => "Validation failed. Please check your input.".to_string(),
            Self::NotFound(msg) | Self::BadRequest(msg) | Self::Unauthorized(msg) => msg.clone(),
            Self::ResourceExhausted(_) => {
                "Dataset too large. Please reduce the limit or use pagination.".to_string()
            }
        }
    }

    fn code(&self) -> String {
        let kind = match self {
            Self::Database(_) => "DATABASE",
            Self::Email(_) => "EMAIL",
            Self::Recaptcha(_) => "RECAPTCHA",
            Self::Auth(_) => "AUTH",
            Self::Validation(_) => "VALIDATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::ResourceExhausted(_) => "RESOURCE_EXHAUSTED",
            Self::Internal(_) => "INTERNAL",
        };
        format!("{kind}_{}", self.status().as_u16())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Email(_) | Self::Recaptcha(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let errors = match &self {
            Self::Validation(fields) => Some(fields.clone()),
            _ => None,
        };

        let debug = is_development().then(|| self.to_string());

        let envelope = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                error_type: self.error_type(),
                code: self.code(),
                message: self.public_message(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                debug,
            },
            errors,
        };

        (status, Json(envelope)).into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("Message not found".to_string());
        assert_eq!(err.to_string(), "Not found: Message not found");

        let err = ApiError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_api_error_status_codes() {
        fn get_status(err: ApiError) -> StatusCode {
            err.status()
        }

        assert_eq!(
            get_status(ApiError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ApiError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(ApiError::Validation(FieldErrors::new())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(ApiError::ResourceExhausted("test".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(ApiError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_type_strings() {
        assert_eq!(
            ApiError::ResourceExhausted("x".into()).error_type(),
            "resource_exhausted"
        );
        assert_eq!(
            ApiError::Validation(FieldErrors::new()).error_type(),
            "validation_error"
        );
        assert_eq!(ApiError::Internal("x".into()).error_type(), "server_error");
    }

    #[test]
    fn test_code_combines_kind_and_status() {
        assert_eq!(ApiError::NotFound("x".into()).code(), "NOT_FOUND_404");
        assert_eq!(
            ApiError::Validation(FieldErrors::new()).code(),
            "VALIDATION_422"
        );
    }

    #[test]
    fn test_internal_detail_is_redacted() {
        // DEVELOPMENT is unset in tests, so debug must stay off
        let err = ApiError::Internal("connection refused to 10.0.0.1".to_string());
        assert_eq!(
            err.public_message(),
            "An internal server error occurred. Please try again later."
        );
    }
}
