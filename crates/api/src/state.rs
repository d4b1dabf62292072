//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::{RecaptchaClient, ResendClient, WebhookVerifier};
use crate::services::resend::ResendError;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    resend: ResendClient,
    recaptcha: Option<RecaptchaClient>,
    webhook_verifier: WebhookVerifier,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the Resend HTTP client cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, ResendError> {
        let resend = ResendClient::new(&config.resend)?;
        let recaptcha = config
            .recaptcha_secret
            .clone()
            .map(RecaptchaClient::new);
        let webhook_verifier = WebhookVerifier::new(config.resend.webhook_secret.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                resend,
                recaptcha,
                webhook_verifier,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Resend client.
    #[must_use]
    pub fn resend(&self) -> &ResendClient {
        &self.inner.resend
    }

    /// Get a reference to the reCAPTCHA client, if a secret is configured.
    #[must_use]
    pub fn recaptcha(&self) -> Option<&RecaptchaClient> {
        self.inner.recaptcha.as_ref()
    }

    /// Get a reference to the webhook signature verifier.
    #[must_use]
    pub fn webhook_verifier(&self) -> &WebhookVerifier {
        &self.inner.webhook_verifier
    }
}
