//! Session-related types.
//!
//! Types stored in the session for admin authentication state. The session
//! object is passed explicitly into handlers via extractors; there is no
//! ambient global login flag.

use serde::{Deserialize, Serialize};

/// Session-stored admin identity.
///
/// `last_regen` drives both the idle timeout and the periodic session-id
/// regeneration check, matching the per-request policy in
/// [`crate::middleware::auth`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    /// Logged-in admin's username.
    pub username: String,
    /// Unix timestamp of the last session-id regeneration.
    pub last_regen: i64,
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the logged-in admin.
    pub const ADMIN: &str = "admin";
}
