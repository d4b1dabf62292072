//! Google reCAPTCHA v3 verification client.
//!
//! The contact route gates submissions on a successful verification with a
//! score of at least [`MIN_SCORE`]. Scoring itself is Google's concern; this
//! client only calls the siteverify endpoint and reports the outcome.

use std::net::IpAddr;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Google siteverify endpoint.
const VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Minimum score a submission must reach.
pub const MIN_SCORE: f64 = 0.5;

/// Errors that can occur when calling the siteverify endpoint.
#[derive(Debug, Error)]
pub enum RecaptchaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Outcome of a verification call.
#[derive(Debug, Deserialize)]
pub struct RecaptchaOutcome {
    pub success: bool,
    /// v3 score in `0.0..=1.0`; absent for v2 tokens.
    pub score: Option<f64>,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
}

impl RecaptchaOutcome {
    /// Whether the verification passed with an acceptable score.
    #[must_use]
    pub fn is_human(&self) -> bool {
        self.success && self.score.unwrap_or(0.0) >= MIN_SCORE
    }
}

/// Client for the Google reCAPTCHA siteverify API.
#[derive(Clone)]
pub struct RecaptchaClient {
    client: reqwest::Client,
    secret: SecretString,
}

impl std::fmt::Debug for RecaptchaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecaptchaClient")
            .field("secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RecaptchaClient {
    /// Create a new client with the server-side secret.
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret,
        }
    }

    /// Verify a client token, passing the caller IP along when known.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response cannot be
    /// parsed. A failed verification is NOT an error; inspect the outcome.
    #[instrument(skip(self, token))]
    pub async fn verify(
        &self,
        token: &str,
        remote_ip: Option<IpAddr>,
    ) -> Result<RecaptchaOutcome, RecaptchaError> {
        let mut form = vec![
            ("secret", self.secret.expose_secret().to_string()),
            ("response", token.to_string()),
        ];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip.to_string()));
        }

        let response = self.client.post(VERIFY_URL).form(&form).send().await?;

        let outcome: RecaptchaOutcome = response
            .json()
            .await
            .map_err(|e| RecaptchaError::Parse(e.to_string()))?;

        debug!(
            success = outcome.success,
            score = ?outcome.score,
            "reCAPTCHA verification completed"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_human_requires_success_and_score() {
        let outcome = RecaptchaOutcome {
            success: true,
            score: Some(0.9),
            error_codes: Vec::new(),
        };
        assert!(outcome.is_human());

        let outcome = RecaptchaOutcome {
            success: true,
            score: Some(0.3),
            error_codes: Vec::new(),
        };
        assert!(!outcome.is_human());

        let outcome = RecaptchaOutcome {
            success: false,
            score: Some(0.9),
            error_codes: Vec::new(),
        };
        assert!(!outcome.is_human());
    }

    #[test]
    fn test_missing_score_is_rejected() {
        let outcome = RecaptchaOutcome {
            success: true,
            score: None,
            error_codes: Vec::new(),
        };
        assert!(!outcome.is_human());
    }

    #[test]
    fn test_score_at_threshold_passes() {
        let outcome = RecaptchaOutcome {
            success: true,
            score: Some(MIN_SCORE),
            error_codes: Vec::new(),
        };
        assert!(outcome.is_human());
    }

    #[test]
    fn test_outcome_deserializes_google_response() {
        let outcome: RecaptchaOutcome = serde_json::from_str(
            r#"{"success": false, "error-codes": ["invalid-input-response"]}"#,
        )
        .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error_codes, vec!["invalid-input-response"]);
    }
}
