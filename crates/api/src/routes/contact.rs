//! Contact form route handlers.
//!
//! Handles public contact submissions and the public delivery-status lookup.

use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, Path, State},
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use portfolio_core::MessageId;

use crate::error::{ApiError, Result};
use crate::models::Message;
use crate::services::ContactFormService;
use crate::services::contact::ContactForm;
use crate::state::AppState;

/// Response for a successful form submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    pub message_id: MessageId,
    pub data: Message,
}

/// Response for the public status lookup.
#[derive(Debug, Serialize)]
pub struct MessageStatusResponse {
    pub success: bool,
    pub message_id: MessageId,
    pub status: portfolio_core::MessageStatus,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Submit the contact form.
///
/// POST /contact
///
/// reCAPTCHA is checked here at the transport boundary; everything behind it
/// (validation, persistence, email dispatch) lives in the intake service.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn submit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(form): Json<ContactForm>,
) -> Result<Json<ContactResponse>> {
    let Some(recaptcha) = state.recaptcha() else {
        return Err(ApiError::Internal("Server configuration error".to_string()));
    };

    let Some(token) = form.recaptcha_token.as_deref().filter(|t| !t.is_empty()) else {
        return Err(ApiError::BadRequest("reCAPTCHA token missing.".to_string()));
    };

    let outcome = recaptcha.verify(token, Some(addr.ip())).await?;
    if !outcome.is_human() {
        warn!(score = ?outcome.score, "reCAPTCHA verification failed");
        return Err(ApiError::BadRequest(
            "reCAPTCHA verification failed.".to_string(),
        ));
    }

    let service = ContactFormService::new(state.pool(), state.resend());
    let message = service.process(&form).await?;

    let message_id = message
        .message_id
        .clone()
        .ok_or_else(|| ApiError::Internal("stored message lost its external id".to_string()))?;

    info!(message_id = %message_id, "Contact form processed");

    Ok(Json(ContactResponse {
        success: true,
        message: "Message received successfully".to_string(),
        message_id,
        data: message,
    }))
}

/// Public delivery-status lookup by external message id.
///
/// GET /message/{messageId}
#[instrument(skip(state))]
pub async fn message_status(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<Json<MessageStatusResponse>> {
    let message_id = MessageId::parse(&message_id)
        .map_err(|_| ApiError::NotFound("Message not found".to_string()))?;

    let service = ContactFormService::new(state.pool(), state.resend());
    let message = service.message_status(&message_id).await?;

    Ok(Json(MessageStatusResponse {
        success: true,
        message_id,
        status: message.status,
        is_read: message.is_read,
        created_at: message.created_at,
    }))
}
