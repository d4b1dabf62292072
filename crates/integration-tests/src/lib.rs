//! Integration tests for the portfolio backend.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! cargo run -p portfolio-cli -- migrate
//!
//! # Start the API
//! cargo run -p portfolio-api
//!
//! # Run integration tests
//! cargo test -p portfolio-integration-tests -- --ignored
//! ```
//!
//! Tests are `#[ignore]`-gated because they need a running server; the
//! `API_BASE_URL` environment variable points them at it (default
//! `http://localhost:8080`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Create a cookie-keeping HTTP client for session tests.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Sign a webhook payload the way Svix does, for `RESEND_WEBHOOK_SECRET`
/// environments.
///
/// # Panics
///
/// Panics when the secret is not valid base64.
#[must_use]
pub fn sign_webhook(secret: &str, payload: &[u8], timestamp: &str, msg_id: &str) -> String {
    let trimmed = secret.strip_prefix("whsec_").unwrap_or(secret);
    let key = BASE64.decode(trimmed).expect("webhook secret is base64");

    let mut mac = Hmac::<Sha256>::new_from_slice(&key).expect("HMAC accepts any key length");
    if msg_id.is_empty() {
        mac.update(format!("{timestamp}.").as_bytes());
    } else {
        mac.update(format!("{msg_id}.{timestamp}.").as_bytes());
    }
    mac.update(payload);

    format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
}
