//! Contact form intake service.
//!
//! Validates a submission, assigns the external correlation id, persists the
//! message, and dispatches the two outbound emails. Persistence comes first:
//! once the row is durably stored, email failures are logged and never
//! surfaced as a submission failure.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng as _;
use sqlx::PgPool;
use tracing::{error, info, instrument};

use portfolio_core::{EmailAddress, MessageId};

use crate::db::MessageRepository;
use crate::db::messages::NewMessage;
use crate::error::{ApiError, FieldErrors};
use crate::models::Message;
use crate::services::resend::{ContactEmail, ResendClient};

/// Maximum length of the submitter name.
pub const NAME_MAX: usize = 100;
/// Maximum length of the subject line.
pub const SUBJECT_MAX: usize = 200;
/// Maximum length of the message body.
pub const BODY_MAX: usize = 5000;

/// Raw contact form fields as received from the client.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
}

/// A contact form that passed field validation.
#[derive(Debug)]
pub struct ValidatedContact {
    pub name: String,
    pub email: EmailAddress,
    pub subject: String,
    pub body: String,
}

/// Contact form intake service.
pub struct ContactFormService<'a> {
    messages: MessageRepository<'a>,
    resend: &'a ResendClient,
}

impl<'a> ContactFormService<'a> {
    /// Create a new contact form service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, resend: &'a ResendClient) -> Self {
        Self {
            messages: MessageRepository::new(pool),
            resend,
        }
    }

    /// Process a contact form submission.
    ///
    /// The returned message carries the external id handed back to the
    /// caller. Email dispatch is best-effort; the submission succeeds once
    /// the row is stored.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with field-level messages, or
    /// `ApiError::Database` when the row cannot be stored.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn process(&self, form: &ContactForm) -> Result<Message, ApiError> {
        let validated = validate_contact_form(form).map_err(ApiError::Validation)?;

        let message_id = generate_message_id();

        let message = self
            .messages
            .create(NewMessage {
                name: validated.name.clone(),
                email: validated.email.clone(),
                subject: validated.subject.clone(),
                body: validated.body.clone(),
                message_id: message_id.clone(),
            })
            .await?;

        info!(message_id = %message_id, "Contact message stored");

        let contact = ContactEmail {
            name: &validated.name,
            email: &validated.email,
            subject: &validated.subject,
            body: &validated.body,
        };

        // Best-effort notifications; the record is already durable.
        if let Err(e) = self
            .resend
            .send_contact_notification(&contact, &message_id)
            .await
        {
            error!(message_id = %message_id, error = %e, "Failed to send admin notification");
        }

        if let Err(e) = self.resend.send_auto_reply(&contact, &message_id).await {
            error!(message_id = %message_id, error = %e, "Failed to send auto-reply");
        }

        Ok(message)
    }

    /// Look up the public delivery status of a message by external id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when the id is unknown.
    pub async fn message_status(&self, message_id: &MessageId) -> Result<Message, ApiError> {
        self.messages
            .find_by_message_id(message_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))
    }
}

/// Validate the contact form fields, collecting every failure.
///
/// # Errors
///
/// Returns the map of field-level error messages when any field is invalid.
pub fn validate_contact_form(form: &ContactForm) -> Result<ValidatedContact, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = form.name.trim();
    if name.is_empty() {
        push_error(&mut errors, "name", "Name is required");
    } else if name.len() > NAME_MAX {
        push_error(
            &mut errors,
            "name",
            &format!("Name must be at most {NAME_MAX} characters"),
        );
    }

    let email = match EmailAddress::parse(&form.email) {
        Ok(email) => Some(email),
        Err(e) => {
            push_error(&mut errors, "email", &e.to_string());
            None
        }
    };

    let subject = form.subject.trim();
    if subject.is_empty() {
        push_error(&mut errors, "subject", "Subject is required");
    } else if subject.len() > SUBJECT_MAX {
        push_error(
            &mut errors,
            "subject",
            &format!("Subject must be at most {SUBJECT_MAX} characters"),
        );
    }

    let body = form.message.trim();
    if body.is_empty() {
        push_error(&mut errors, "message", "Message is required");
    } else if body.len() > BODY_MAX {
        push_error(
            &mut errors,
            "message",
            &format!("Message must be at most {BODY_MAX} characters"),
        );
    }

    match email {
        Some(email) if errors.is_empty() => Ok(ValidatedContact {
            name: name.to_string(),
            email,
            subject: subject.to_string(),
            body: body.to_string(),
        }),
        _ => Err(errors),
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Generate a unique external message id.
///
/// `msg_` + hex microseconds since epoch + 4 random bytes. Collision
/// resistant for this workload, deliberately not unguessable: the id is
/// handed to the submitter as a tracking token.
#[must_use]
pub fn generate_message_id() -> MessageId {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros())
        .unwrap_or_default();
    let noise: u32 = rand::rng().random();

    MessageId::parse(&format!("msg_{micros:x}_{noise:08x}"))
        .expect("generated id always carries the msg_ prefix")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> ContactForm {
        ContactForm {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Analytical engines".to_string(),
            message: "I have a proposal.".to_string(),
            recaptcha_token: Some("tok".to_string()),
        }
    }

    #[test]
    fn test_valid_form_passes() {
        let validated = validate_contact_form(&valid_form()).unwrap();
        assert_eq!(validated.name, "Ada Lovelace");
        assert_eq!(validated.email.as_str(), "ada@example.com");
        assert_eq!(validated.body, "I have a proposal.");
    }

    #[test]
    fn test_email_is_normalized() {
        let mut form = valid_form();
        form.email = "  ADA@Example.COM ".to_string();
        let validated = validate_contact_form(&form).unwrap();
        assert_eq!(validated.email.as_str(), "ada@example.com");
    }

    #[test]
    fn test_missing_fields_collects_all_errors() {
        let form = ContactForm {
            name: String::new(),
            email: String::new(),
            subject: String::new(),
            message: String::new(),
            recaptcha_token: None,
        };
        let errors = validate_contact_form(&form).unwrap_err();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("subject"));
        assert!(errors.contains_key("message"));
    }

    #[test]
    fn test_field_length_limits() {
        let mut form = valid_form();
        form.subject = "s".repeat(SUBJECT_MAX + 1);
        form.message = "m".repeat(BODY_MAX + 1);
        let errors = validate_contact_form(&form).unwrap_err();
        assert!(errors.contains_key("subject"));
        assert!(errors.contains_key("message"));
        assert!(!errors.contains_key("name"));
    }

    #[test]
    fn test_generated_ids_have_prefix_and_differ() {
        let a = generate_message_id();
        let b = generate_message_id();
        assert!(a.as_str().starts_with("msg_"));
        assert!(b.as_str().starts_with("msg_"));
        assert_ne!(a, b);
    }
}
