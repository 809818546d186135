//! First staff account created at startup.
//!
//! Staff registration is normally closed in production, so the first
//! reviewer comes from `EP__BOOTSTRAP__STAFF_EMAIL` and
//! `EP__BOOTSTRAP__STAFF_PASSWORD`. Nothing happens once any staff
//! account exists.

use domain::models::AccountVariant;
use persistence::repositories::AccountRepository;
use tracing::{info, warn};

use crate::config::BootstrapConfig;
use crate::services::auth::{AuthError, AuthService};

const DEFAULT_STAFF_NAME: &str = "Portal Administrator";

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not create the bootstrap staff account: {0}")]
    Account(#[from] AuthError),
}

/// Creates the configured staff account if no staff account exists yet.
///
/// Returns the new account identifier, or `None` when nothing was created.
pub async fn bootstrap_staff(
    accounts: &AccountRepository,
    auth: &AuthService,
    config: &BootstrapConfig,
) -> Result<Option<String>, BootstrapError> {
    let email = match config.staff_email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email,
        _ => return Ok(None),
    };

    let password = match config.staff_password.as_deref() {
        Some(password) if !password.is_empty() => password,
        _ => {
            warn!("EP__BOOTSTRAP__STAFF_EMAIL is set but EP__BOOTSTRAP__STAFF_PASSWORD is empty - skipping bootstrap");
            return Ok(None);
        }
    };

    if accounts.count(AccountVariant::Staff).await? > 0 {
        info!("Staff account already exists - skipping bootstrap");
        return Ok(None);
    }

    let full_name = config
        .staff_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_STAFF_NAME);

    let account = auth
        .create_account(AccountVariant::Staff, full_name, email, password)
        .await?;

    info!(staff_id = %account.id, email = %account.email, "Bootstrap staff account created");
    warn!("SECURITY: Remove EP__BOOTSTRAP__STAFF_PASSWORD from the environment now that the account exists");

    Ok(Some(account.id))
}
