//! Admin authentication middleware and extractors.
//!
//! The session policy is enforced per request, never by a background timer:
//! an authenticated request past the idle timeout destroys the session and is
//! rejected; one past the regeneration interval gets a fresh session id to
//! mitigate fixation.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::error::ApiError;
use crate::models::{AdminSession, session_keys};

/// Seconds of inactivity (measured from the last regeneration) after which
/// an admin session is destroyed.
pub const SESSION_IDLE_SECONDS: i64 = 60 * 60;

/// Seconds between session-id regenerations for an active session.
pub const REGENERATION_INTERVAL_SECONDS: i64 = 30 * 60;

/// Extractor that requires an authenticated admin session.
///
/// Applies the idle-timeout and periodic-regeneration policy before the
/// handler runs.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.username)
/// }
/// ```
pub struct RequireAdmin(pub AdminSession);

/// Rejection for unauthenticated or expired admin sessions.
pub enum AdminRejection {
    /// No authenticated session present.
    Unauthenticated,
    /// Session was authenticated but idle past the timeout.
    Expired,
    /// Session store failure.
    Session(String),
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => {
                ApiError::Unauthorized("Authentication required".to_string()).into_response()
            }
            Self::Expired => {
                ApiError::Unauthorized("Session expired. Please log in again.".to_string())
                    .into_response()
            }
            Self::Session(msg) => ApiError::Internal(msg).into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminRejection::Unauthenticated)?
            .clone();

        let mut admin: AdminSession = session
            .get(session_keys::ADMIN)
            .await
            .map_err(|e| AdminRejection::Session(e.to_string()))?
            .ok_or(AdminRejection::Unauthenticated)?;

        let now = chrono::Utc::now().timestamp();
        let since_regen = now - admin.last_regen;

        if since_regen > SESSION_IDLE_SECONDS {
            session
                .flush()
                .await
                .map_err(|e| AdminRejection::Session(e.to_string()))?;
            return Err(AdminRejection::Expired);
        }

        if since_regen > REGENERATION_INTERVAL_SECONDS {
            session
                .cycle_id()
                .await
                .map_err(|e| AdminRejection::Session(e.to_string()))?;
            admin.last_regen = now;
            session
                .insert(session_keys::ADMIN, &admin)
                .await
                .map_err(|e| AdminRejection::Session(e.to_string()))?;
        }

        Ok(Self(admin))
    }
}

/// Extractor that optionally reads the admin session without enforcing
/// the policy. Used by the public auth-status endpoints.
pub struct OptionalAdmin(pub Option<AdminSession>);

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<AdminSession>(session_keys::ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Extractor that exposes the raw session when the session layer is active.
///
/// Unlike the `Session` extractor this never rejects, so the recovery
/// endpoint can report a missing session instead of failing.
pub struct SessionProbe(pub Option<Session>);

impl<S> FromRequestParts<S> for SessionProbe
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Session>().cloned()))
    }
}

/// Store the logged-in admin in the session, cycling the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_admin_session(
    session: &Session,
    username: &str,
) -> Result<(), tower_sessions::session::Error> {
    // Fresh id on privilege change
    session.cycle_id().await?;
    session
        .insert(
            session_keys::ADMIN,
            &AdminSession {
                username: username.to_string(),
                last_regen: chrono::Utc::now().timestamp(),
            },
        )
        .await
}

/// Destroy the admin session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_admin_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
