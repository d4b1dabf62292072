//! Webhook event log repository.
//!
//! Raw provider events are recorded before processing so delivery history can
//! be audited even when an event maps to nothing. Rows are insert-only.

use sqlx::PgPool;

use super::RepositoryError;

/// Repository for webhook event log operations.
pub struct EventLogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventLogRepository<'a> {
    /// Create a new event log repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a raw webhook event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO event_logs (event_type, payload) VALUES ($1, $2)")
            .bind(event_type)
            .bind(payload)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
