//! Resend HTTP API client for transactional email.
//!
//! Sends the admin notification and the submitter auto-reply for each contact
//! form submission. Every outbound email is tagged with the external message
//! id so delivery webhooks can be correlated back to the stored row.

use askama::Template;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use portfolio_core::{EmailAddress, MessageId};

use crate::config::ResendConfig;

/// Resend API base URL.
const BASE_URL: &str = "https://api.resend.com";

/// HTML template for the submitter auto-reply.
#[derive(Template)]
#[template(path = "email/auto_reply.html")]
struct AutoReplyHtml<'a> {
    name: &'a str,
    subject: &'a str,
    portfolio_url: &'a str,
}

/// Plain text template for the submitter auto-reply.
#[derive(Template)]
#[template(path = "email/auto_reply.txt")]
struct AutoReplyText<'a> {
    name: &'a str,
    subject: &'a str,
    portfolio_url: &'a str,
}

/// Plain text template for the admin notification.
#[derive(Template)]
#[template(path = "email/admin_notification.txt")]
struct AdminNotificationText<'a> {
    name: &'a str,
    email: &'a str,
    body: &'a str,
}

/// Errors that can occur when sending through Resend.
#[derive(Debug, Error)]
pub enum ResendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Failed to construct the client.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Contact details rendered into the outbound emails.
#[derive(Debug)]
pub struct ContactEmail<'a> {
    pub name: &'a str,
    pub email: &'a EmailAddress,
    pub subject: &'a str,
    pub body: &'a str,
}

/// A name/value tag attached to an outbound email.
#[derive(Debug, Serialize)]
struct Tag {
    name: &'static str,
    value: String,
}

/// Request body for `POST /emails`.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
    text: String,
    tags: Vec<Tag>,
}

/// Response body for `POST /emails`.
#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Resend API client.
#[derive(Clone)]
pub struct ResendClient {
    client: reqwest::Client,
    from_email: String,
    admin_email: String,
    portfolio_url: String,
}

impl std::fmt::Debug for ResendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendClient")
            .field("from_email", &self.from_email)
            .field("admin_email", &self.admin_email)
            .finish_non_exhaustive()
    }
}

impl ResendClient {
    /// Create a new Resend API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ResendConfig) -> Result<Self, ResendError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| ResendError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            from_email: config.from_email.clone(),
            admin_email: config.admin_email.clone(),
            portfolio_url: config.portfolio_url.clone(),
        })
    }

    /// Notify the site owner of a new contact submission.
    ///
    /// Returns the provider's email id.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or the API request fails.
    #[instrument(skip(self, contact), fields(message_id = %message_id))]
    pub async fn send_contact_notification(
        &self,
        contact: &ContactEmail<'_>,
        message_id: &MessageId,
    ) -> Result<String, ResendError> {
        let text = AdminNotificationText {
            name: contact.name,
            email: contact.email.as_str(),
            body: contact.body,
        }
        .render()?;

        let request = SendEmailRequest {
            from: &self.from_email,
            to: [self.admin_email.as_str()],
            subject: format!("New Contact Message: {}", contact.subject),
            html: None,
            text,
            tags: tags_for(message_id, "admin_notification"),
        };

        self.send(request).await
    }

    /// Acknowledge the submission to the sender.
    ///
    /// Returns the provider's email id.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or the API request fails.
    #[instrument(skip(self, contact), fields(message_id = %message_id))]
    pub async fn send_auto_reply(
        &self,
        contact: &ContactEmail<'_>,
        message_id: &MessageId,
    ) -> Result<String, ResendError> {
        let html = AutoReplyHtml {
            name: contact.name,
            subject: contact.subject,
            portfolio_url: &self.portfolio_url,
        }
        .render()?;

        // Fallback for email clients that don't render HTML
        let text = AutoReplyText {
            name: contact.name,
            subject: contact.subject,
            portfolio_url: &self.portfolio_url,
        }
        .render()?;

        let request = SendEmailRequest {
            from: &self.from_email,
            to: [contact.email.as_str()],
            subject: "Thank you for contacting me!".to_string(),
            html: Some(html),
            text,
            tags: tags_for(message_id, "auto_reply"),
        };

        self.send(request).await
    }

    async fn send(&self, request: SendEmailRequest<'_>) -> Result<String, ResendError> {
        let response = self
            .client
            .post(format!("{BASE_URL}/emails"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ResendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| ResendError::Parse(e.to_string()))?;

        debug!(email_id = %body.id, "Email accepted by Resend");

        Ok(body.id)
    }
}

/// Standard tag set for a contact-form email.
fn tags_for(message_id: &MessageId, kind: &'static str) -> Vec<Tag> {
    vec![
        Tag {
            name: "message_id",
            value: sanitize_tag_value(message_id.as_str()),
        },
        Tag {
            name: "type",
            value: kind.to_string(),
        },
        Tag {
            name: "source",
            value: "contact_form".to_string(),
        },
    ]
}

/// Restrict a tag value to the character set Resend's tag API accepts.
///
/// Any character outside `[A-Za-z0-9_-]` is replaced with an underscore.
fn sanitize_tag_value(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_tag_value_passthrough() {
        assert_eq!(
            sanitize_tag_value("msg_68b3f1a2c4d5e_1a2b3c4d"),
            "msg_68b3f1a2c4d5e_1a2b3c4d"
        );
        assert_eq!(sanitize_tag_value("abc-DEF_123"), "abc-DEF_123");
    }

    #[test]
    fn test_sanitize_tag_value_replaces_invalid() {
        assert_eq!(sanitize_tag_value("msg id.1"), "msg_id_1");
        assert_eq!(sanitize_tag_value("a@b.com"), "a_b_com");
        assert_eq!(sanitize_tag_value("émoji🎉"), "_moji_");
    }

    #[test]
    fn test_tags_carry_sanitized_message_id() {
        let id = MessageId::parse("msg_abc_def").unwrap();
        let tags = tags_for(&id, "auto_reply");
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].name, "message_id");
        assert_eq!(tags[0].value, "msg_abc_def");
        assert_eq!(tags[1].value, "auto_reply");
        assert_eq!(tags[2].value, "contact_form");
    }

    #[test]
    fn test_admin_notification_template() {
        let text = AdminNotificationText {
            name: "Ada",
            email: "ada@example.com",
            body: "Hello there",
        }
        .render()
        .unwrap();

        assert!(text.contains("From: Ada <ada@example.com>"));
        assert!(text.contains("Hello there"));
    }

    #[test]
    fn test_auto_reply_templates_mention_subject() {
        let html = AutoReplyHtml {
            name: "Ada",
            subject: "Collaboration",
            portfolio_url: "https://example.dev",
        }
        .render()
        .unwrap();
        let text = AutoReplyText {
            name: "Ada",
            subject: "Collaboration",
            portfolio_url: "https://example.dev",
        }
        .render()
        .unwrap();

        assert!(html.contains("Collaboration"));
        assert!(html.contains("https://example.dev"));
        assert!(text.contains("Collaboration"));
        assert!(text.contains("https://example.dev"));
    }
}
