//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin account
//! portfolio-cli admin create -u damilola -p 'a strong passphrase'
//!
//! # Rotate an existing admin's password
//! portfolio-cli admin set-password -u damilola -p 'a new passphrase'
//! ```
//!
//! Accounts can only be created and rotated here; the HTTP API has no
//! account-management surface.

use portfolio_api::db::AdminRepository;
use portfolio_api::services::auth::hash_password;

use super::CliError;

/// Create a new admin account.
///
/// # Errors
///
/// Returns error if the username is taken or the database is unreachable.
pub async fn create(username: &str, password: &str) -> Result<(), CliError> {
    let pool = super::connect().await?;

    let password_hash = hash_password(password)?;
    let admin = AdminRepository::new(&pool)
        .create(username.trim(), &password_hash)
        .await?;

    tracing::info!(id = %admin.id, username = %admin.username, "Admin account created");
    Ok(())
}

/// Rotate the password of an existing admin.
///
/// # Errors
///
/// Returns error if the admin does not exist or the database is unreachable.
pub async fn set_password(username: &str, password: &str) -> Result<(), CliError> {
    let pool = super::connect().await?;

    let repo = AdminRepository::new(&pool);
    let admin = repo
        .find_by_username(username.trim())
        .await?
        .ok_or_else(|| CliError::AdminNotFound(username.to_string()))?;

    let password_hash = hash_password(password)?;
    repo.update_password(admin.id, &password_hash).await?;

    tracing::info!(username = %admin.username, "Admin password updated");
    Ok(())
}
