//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (probes the database)
//!
//! # Contact (public)
//! POST /contact                 - Submit contact form
//! GET  /message/{messageId}     - Public delivery-status lookup
//!
//! # Admin session
//! POST /admin/login             - Log in (sets session cookie)
//! POST /admin/logout            - Log out
//! GET  /admin/check             - Authentication status
//! POST /admin/recover-session   - Session recovery probe
//!
//! # Admin messages (session required)
//! GET   /admin/messages         - Paginated, filterable message list
//! GET   /admin/messages/stats   - Read/unread counts
//! GET   /admin/messages/{id}    - Single message (marks as read)
//! PATCH /admin/bulk/messages    - Bulk mark read/unread/delete
//!
//! # Webhooks
//! POST /resend-webhook          - Signed delivery-status callback
//! ```

pub mod admin;
pub mod admin_auth;
pub mod contact;
pub mod webhook;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the public contact routes router.
pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact::submit))
        .route("/message/{messageId}", get(contact::message_status))
}

/// Create the admin session lifecycle router.
pub fn admin_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin_auth::login))
        .route("/logout", post(admin_auth::logout))
        .route("/check", get(admin_auth::check))
        .route("/recover-session", post(admin_auth::recover_session))
}

/// Create the admin message management router.
pub fn admin_message_routes() -> Router<AppState> {
    Router::new()
        // Static segments before the `{id}` match
        .route("/messages/stats", get(admin::statistics))
        .route("/messages/{id}", get(admin::get_message))
        .route("/messages", get(admin::list_messages))
        .route("/bulk/messages", patch(admin::bulk_action))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(contact_routes())
        .nest("/admin", admin_auth_routes().merge(admin_message_routes()))
        .route("/resend-webhook", post(webhook::handle_resend_webhook))
}
