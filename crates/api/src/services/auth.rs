//! Registration, password check and one-time code issuance.
//!
//! Login is two-phase: a correct password starts an OTP challenge in the
//! caller's session and the code is mailed to the account's address; the
//! session only becomes authenticated once the code is verified.

use chrono::{DateTime, Utc};
use domain::models::account::{RegisterAccountRequest, RegisterAccountResponse};
use domain::models::{Account, AccountVariant, AuthenticatedIdentity, SessionData};
use domain::services::{begin_challenge, verify_challenge, OtpError, OtpPolicy};
use persistence::repositories::AccountRepository;
use shared::crypto::generate_otp_code;
use shared::password::{hash_password, verify_password, PasswordError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use validator::ValidationErrors;

use crate::middleware::metrics;
use crate::services::email::{login_code_message, Mailer};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    EmailAlreadyExists,

    #[error("Staff registration is not open")]
    RegistrationClosed,

    /// Unknown account and wrong password are deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// A started login challenge.
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub account: Account,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    accounts: AccountRepository,
    mailer: Arc<dyn Mailer>,
    otp_policy: OtpPolicy,
    school_name: String,
    staff_registration_enabled: bool,
}

impl AuthService {
    pub fn new(
        accounts: AccountRepository,
        mailer: Arc<dyn Mailer>,
        otp_policy: OtpPolicy,
        school_name: String,
        staff_registration_enabled: bool,
    ) -> Self {
        Self {
            accounts,
            mailer,
            otp_policy,
            school_name,
            staff_registration_enabled,
        }
    }

    pub fn otp_policy(&self) -> &OtpPolicy {
        &self.otp_policy
    }

    /// Registers a new account through the public endpoint.
    pub async fn register(
        &self,
        variant: AccountVariant,
        request: &RegisterAccountRequest,
    ) -> Result<RegisterAccountResponse, AuthError> {
        if variant == AccountVariant::Staff && !self.staff_registration_enabled {
            return Err(AuthError::RegistrationClosed);
        }

        request.validate_registration()?;

        let account = self
            .create_account(
                variant,
                request.normalized_name(),
                request.normalized_email(),
                &request.password,
            )
            .await?;

        metrics::record_registration(variant.as_str());

        Ok(RegisterAccountResponse {
            id: account.id,
            variant,
            full_name: account.full_name,
            email: account.email,
        })
    }

    /// Inserts an account with a freshly reserved identifier.
    ///
    /// Callers validate input first. Used by registration and bootstrap.
    pub async fn create_account(
        &self,
        variant: AccountVariant,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        if self.accounts.email_exists(variant, email).await? {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let account_id = self.accounts.next_identifier(variant).await?;

        let entity = self
            .accounts
            .create(variant, &account_id, full_name, email, &password_hash)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    AuthError::EmailAlreadyExists
                }
                _ => AuthError::DatabaseError(e),
            })?;

        info!(account_id = %entity.account_id, variant = %variant, "Account registered");
        Ok(entity.into_domain(variant))
    }

    /// Checks a password and starts a challenge in `session`.
    ///
    /// `login` matches the account's email or identifier exactly.
    pub async fn login(
        &self,
        variant: AccountVariant,
        login: &str,
        password: &str,
        session: &mut SessionData,
    ) -> Result<IssuedChallenge, AuthError> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(entity) = self.accounts.find_by_login(variant, login).await? else {
            info!(variant = %variant, "Login for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &entity.password_hash)? {
            info!(account_id = %entity.account_id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let account = entity.into_domain(variant);
        let code = generate_otp_code();
        let expires_at = begin_challenge(session, &account, &code, Utc::now(), &self.otp_policy);

        Ok(IssuedChallenge {
            account,
            code,
            expires_at,
        })
    }

    /// Mails the code. Returns whether delivery succeeded.
    ///
    /// A failed delivery is logged and leaves the challenge in place.
    pub async fn deliver_code(&self, challenge: &IssuedChallenge) -> bool {
        let message = login_code_message(
            &self.school_name,
            &challenge.account.email,
            &challenge.account.full_name,
            &challenge.code,
            self.otp_policy.ttl.num_minutes(),
        );

        let delivered = match self.mailer.send(message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    account_id = %challenge.account.id,
                    error = %e,
                    "Failed to deliver login code"
                );
                false
            }
        };
        metrics::record_otp_issued(delivered);
        delivered
    }

    /// Verifies a submitted code against the session's challenge.
    pub fn verify(
        &self,
        session: &mut SessionData,
        code: &str,
    ) -> Result<AuthenticatedIdentity, OtpError> {
        let result = verify_challenge(session, code, Utc::now(), &self.otp_policy);
        match &result {
            Ok(identity) => {
                info!(account_id = %identity.account_id, "Login verified");
                metrics::record_otp_verified();
            }
            Err(e) => metrics::record_otp_failed(otp_failure_label(e)),
        }
        result
    }
}

fn otp_failure_label(error: &OtpError) -> &'static str {
    match error {
        OtpError::NoChallenge => "no_challenge",
        OtpError::MissingCode => "missing_code",
        OtpError::Expired => "expired",
        OtpError::InvalidCode { .. } => "invalid_code",
        OtpError::TooManyAttempts => "too_many_attempts",
    }
}
