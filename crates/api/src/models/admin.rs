//! Admin operator account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use portfolio_core::AdminId;

/// A dashboard operator account.
///
/// The password hash is argon2 and is rehashed only by the explicit
/// `admin set-password` CLI operation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Admin {
    /// Database id.
    pub id: AdminId,
    /// Unique login name.
    pub username: String,
    /// Argon2 password hash. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
