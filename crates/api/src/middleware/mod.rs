//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. CORS layer (credentialed allow-list)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Admin authentication is an extractor ([`auth::RequireAdmin`]), not a
//! layer, so only the `/admin` handlers pay for it.

pub mod auth;
pub mod cors;
pub mod session;

pub use auth::{
    OptionalAdmin, RequireAdmin, SessionProbe, clear_admin_session, set_admin_session,
};
pub use cors::create_cors_layer;
pub use session::create_session_layer;
