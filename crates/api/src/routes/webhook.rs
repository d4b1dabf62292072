//! Resend webhook route handler.
//!
//! Only signature failure is reported to the provider; every downstream
//! condition (unparseable body, missing tag, unknown event type, unknown
//! message id) is logged and answered with 200 so the provider does not
//! retry events that can never be applied.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, info, instrument, warn};

use portfolio_core::{MessageId, MessageStatus};

use crate::db::{EventLogRepository, MessageRepository};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Handle a Resend delivery-lifecycle webhook.
///
/// POST /resend-webhook
#[instrument(skip(state, headers, body))]
pub async fn handle_resend_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    // Svix headers (used by Resend); fall back to the legacy header
    let mut signature = header_str(&headers, "svix-signature");
    let timestamp = header_str(&headers, "svix-timestamp");
    let msg_id = header_str(&headers, "svix-id");

    if signature.is_empty() {
        signature = header_str(&headers, "resend-signature");
    }

    if !state
        .webhook_verifier()
        .verify(&body, signature, timestamp, msg_id)
    {
        warn!("Resend webhook signature verification failed");
        return Err(ApiError::Unauthorized(
            "Invalid webhook signature".to_string(),
        ));
    }

    let Ok(event) = serde_json::from_slice::<serde_json::Value>(&body) else {
        warn!("Webhook body is not valid JSON, ignoring");
        return Ok(StatusCode::OK);
    };

    let event_type = event
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("");

    info!(event_type, "Resend webhook received");

    // Record the raw event before acting on it; failure here must not block
    // status processing.
    if let Err(e) = EventLogRepository::new(state.pool())
        .record(event_type, &event)
        .await
    {
        warn!(error = %e, "Failed to record webhook event");
    }

    process_webhook_event(&state, &event, event_type).await;

    Ok(StatusCode::OK)
}

/// Apply a verified webhook event to the message store.
async fn process_webhook_event(state: &AppState, event: &serde_json::Value, event_type: &str) {
    let Some(message_id) = extract_message_id(event) else {
        warn!("No message ID found in webhook event");
        return;
    };

    let Some(status) = map_event_type(event_type) else {
        debug!(event_type, "Ignoring unrecognized webhook event type");
        return;
    };

    let repo = MessageRepository::new(state.pool());

    match repo.find_by_message_id(&message_id).await {
        Ok(Some(message)) => match repo.update_status(message.id, status).await {
            Ok(true) => {
                info!(message_id = %message_id, status = %status, "Updated message status");
            }
            Ok(false) => warn!(message_id = %message_id, "Message vanished before update"),
            Err(e) => warn!(message_id = %message_id, error = %e, "Status update failed"),
        },
        Ok(None) => warn!(message_id = %message_id, "Message not found for webhook event"),
        Err(e) => warn!(message_id = %message_id, error = %e, "Message lookup failed"),
    }
}

/// Extract the external message id from the event's tag list.
///
/// Tags arrive either as an object (`{"message_id": "..."}`) or as an array
/// of `{name, value}` objects (legacy format); first match wins.
fn extract_message_id(event: &serde_json::Value) -> Option<MessageId> {
    let tags = event.get("data")?.get("tags")?;

    let raw = if let Some(value) = tags.get("message_id").and_then(serde_json::Value::as_str) {
        Some(value)
    } else {
        tags.as_array()?.iter().find_map(|tag| {
            let name = tag.get("name")?.as_str()?;
            (name == "message_id").then(|| tag.get("value")?.as_str())?
        })
    };

    MessageId::parse(raw?).ok()
}

/// Map a provider event type to a message status.
///
/// Unrecognized event types are ignored, not errored.
fn map_event_type(event_type: &str) -> Option<MessageStatus> {
    match event_type {
        "email.delivered" => Some(MessageStatus::Delivered),
        // Email is still pending delivery
        "email.delivery_delayed" => Some(MessageStatus::Pending),
        "email.bounced" => Some(MessageStatus::Bounced),
        "email.opened" => Some(MessageStatus::Opened),
        "email.clicked" => Some(MessageStatus::Clicked),
        "email.complained" => Some(MessageStatus::Complained),
        _ => None,
    }
}

/// Read a header as UTF-8, defaulting to the empty string.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
