//! Application services.
//!
//! - [`auth`] - Admin credential verification (argon2)
//! - [`contact`] - Contact form intake (validate, persist, notify)
//! - [`recaptcha`] - Google reCAPTCHA v3 siteverify client
//! - [`resend`] - Resend HTTP API client for outbound email
//! - [`webhook`] - Webhook signature verification

pub mod auth;
pub mod contact;
pub mod recaptcha;
pub mod resend;
pub mod webhook;

pub use auth::AdminAuthService;
pub use contact::ContactFormService;
pub use recaptcha::RecaptchaClient;
pub use resend::ResendClient;
pub use webhook::WebhookVerifier;
