//! Contact message model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use portfolio_core::{EmailAddress, MessageDbId, MessageId, MessageStatus};

/// A stored contact form submission.
///
/// The external `message_id` correlates webhook events back to this row and
/// is immutable once assigned. `status` is only changed by webhook delivery
/// events; `is_read` only by admin actions.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    /// Database id.
    pub id: MessageDbId,
    /// Submitter's name.
    pub name: String,
    /// Submitter's email address (normalized).
    pub email: EmailAddress,
    /// Subject line.
    pub subject: String,
    /// Message body (the `message` column).
    #[sqlx(rename = "message")]
    #[serde(rename = "message")]
    pub body: String,
    /// External correlation id, present on all rows created by the intake
    /// service.
    pub message_id: Option<MessageId>,
    /// Delivery-lifecycle status.
    pub status: MessageStatus,
    /// Whether an admin has viewed the message.
    pub is_read: bool,
    /// When the message was submitted.
    pub created_at: DateTime<Utc>,
    /// Bumped on every mutation.
    pub updated_at: DateTime<Utc>,
}
