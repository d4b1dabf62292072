//! Admin session lifecycle route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::{ApiError, FieldErrors, Result};
use crate::middleware::{OptionalAdmin, SessionProbe, clear_admin_session, set_admin_session};
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Maximum accepted username length.
const USERNAME_MAX: usize = 100;
/// Maximum accepted password length.
const PASSWORD_MAX: usize = 255;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Simple success/message response used by the session endpoints.
#[derive(Debug, Serialize)]
pub struct SessionActionResponse {
    pub success: bool,
    pub message: String,
}

/// Authentication status response.
#[derive(Debug, Serialize)]
pub struct AuthCheckResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
}

/// Session recovery response.
#[derive(Debug, Serialize)]
pub struct RecoverSessionResponse {
    pub recovered: bool,
    pub authenticated: bool,
    pub message: String,
}

/// Log an admin in.
///
/// POST /admin/login
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<SessionActionResponse>> {
    validate_login_form(&form)?;

    let auth = AdminAuthService::new(state.pool());
    let admin = auth.authenticate(&form.username, &form.password).await?;

    set_admin_session(&session, &admin.username)
        .await
        .map_err(|e| ApiError::Internal(format!("session error: {e}")))?;

    info!(username = %admin.username, "Admin logged in");

    Ok(Json(SessionActionResponse {
        success: true,
        message: "Login successful.".to_string(),
    }))
}

/// Log the current admin out.
///
/// POST /admin/logout
#[instrument(skip(session, admin))]
pub async fn logout(
    OptionalAdmin(admin): OptionalAdmin,
    session: Session,
) -> Result<Json<SessionActionResponse>> {
    let Some(admin) = admin else {
        return Err(ApiError::Unauthorized("Not logged in.".to_string()));
    };

    clear_admin_session(&session)
        .await
        .map_err(|e| ApiError::Internal(format!("session error: {e}")))?;

    info!(username = %admin.username, "Admin logged out");

    Ok(Json(SessionActionResponse {
        success: true,
        message: "Logout successful.".to_string(),
    }))
}

/// Report the authentication status of the caller's session.
///
/// GET /admin/check
#[instrument(skip(session, admin))]
pub async fn check(OptionalAdmin(admin): OptionalAdmin, session: Session) -> Json<AuthCheckResponse> {
    match admin {
        Some(admin) => {
            let last_activity = chrono::DateTime::from_timestamp(admin.last_regen, 0)
                .map(|t| t.to_rfc3339());

            Json(AuthCheckResponse {
                authenticated: true,
                session_id: session.id().map(|id| id.to_string()),
                last_activity,
            })
        }
        None => Json(AuthCheckResponse {
            authenticated: false,
            session_id: None,
            last_activity: None,
        }),
    }
}

/// Frontend recovery probe after resource failures.
///
/// POST /admin/recover-session
///
/// The session layer recreates a session transparently, so "recovered" only
/// reports whether a session is live for this request.
#[instrument(skip(session, admin))]
pub async fn recover_session(
    OptionalAdmin(admin): OptionalAdmin,
    SessionProbe(session): SessionProbe,
) -> Json<RecoverSessionResponse> {
    let recovered = session.is_some();
    let authenticated = admin.is_some();

    let message = if recovered {
        if authenticated {
            "Session recovered and authenticated"
        } else {
            "Session recovered but not authenticated"
        }
    } else {
        "Could not recover session"
    };

    Json(RecoverSessionResponse {
        recovered,
        authenticated,
        message: message.to_string(),
    })
}

/// Validate the login request fields.
fn validate_login_form(form: &LoginForm) -> Result<()> {
    let mut errors = FieldErrors::new();

    let username = form.username.trim();
    if username.is_empty() {
        errors
            .entry("username".to_string())
            .or_default()
            .push("Username is required".to_string());
    } else if username.len() > USERNAME_MAX {
        errors
            .entry("username".to_string())
            .or_default()
            .push(format!("Username must be at most {USERNAME_MAX} characters"));
    }

    if form.password.is_empty() {
        errors
            .entry("password".to_string())
            .or_default()
            .push("Password is required".to_string());
    } else if form.password.len() > PASSWORD_MAX {
        errors
            .entry("password".to_string())
            .or_default()
            .push(format!("Password must be at most {PASSWORD_MAX} characters"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_login_form_ok() {
        let form = LoginForm {
            username: "admin".to_string(),
            password: "hunter2hunter2".to_string(),
        };
        assert!(validate_login_form(&form).is_ok());
    }

    #[test]
    fn test_validate_login_form_missing_fields() {
        let form = LoginForm {
            username: "  ".to_string(),
            password: String::new(),
        };
        let err = validate_login_form(&form).unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert!(errors.contains_key("username"));
                assert!(errors.contains_key("password"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_login_form_length_limits() {
        let form = LoginForm {
            username: "u".repeat(USERNAME_MAX + 1),
            password: "p".repeat(PASSWORD_MAX + 1),
        };
        assert!(validate_login_form(&form).is_err());
    }
}
