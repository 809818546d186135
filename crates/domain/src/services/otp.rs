//! One-time code gate between password check and full authentication.
//!
//! States: no challenge, challenged, verified. A challenge lives in the
//! session's `challenge` namespace; verification either promotes it to an
//! authenticated identity or discards it (expiry, too many failures).
//! A wrong code leaves the challenge in place until attempts run out.

use chrono::{DateTime, Duration, Utc};
use shared::crypto::{constant_time_eq, sha256_hex};
use thiserror::Error;

use crate::models::account::{resolve_photo, Account};
use crate::models::session::{AuthenticatedIdentity, PendingCredential, SessionData};

/// Default lifetime of a one-time code.
pub const DEFAULT_OTP_TTL_SECS: i64 = 300;

/// Default number of wrong codes before the challenge is discarded.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    pub ttl: Duration,
    pub max_attempts: u32,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_OTP_TTL_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("No active verification code. Please log in again.")]
    NoChallenge,

    #[error("Please enter the verification code")]
    MissingCode,

    #[error("The verification code has expired. Please log in again.")]
    Expired,

    #[error("Invalid verification code")]
    InvalidCode { remaining_attempts: u32 },

    #[error("Too many incorrect codes. Please log in again.")]
    TooManyAttempts,
}

/// Starts a challenge for `account`, replacing any earlier one.
///
/// Any previously authenticated identity and enrollment draft are dropped,
/// since the session is being handed to whoever completes this login.
/// Returns the expiry time.
pub fn begin_challenge(
    session: &mut SessionData,
    account: &Account,
    code: &str,
    now: DateTime<Utc>,
    policy: &OtpPolicy,
) -> DateTime<Utc> {
    let expires_at = now + policy.ttl;
    session.identity = None;
    session.draft = None;
    session.challenge = Some(PendingCredential {
        account_id: account.id.clone(),
        variant: account.variant,
        full_name: account.full_name.clone(),
        email: account.email.clone(),
        photo_path: account.photo_path.clone(),
        code_hash: sha256_hex(code),
        issued_at: now,
        expires_at,
        failed_attempts: 0,
    });
    expires_at
}

/// Checks a submitted code against the session's challenge.
///
/// On success the challenge is consumed and the identity is stored in the
/// session and returned.
pub fn verify_challenge(
    session: &mut SessionData,
    submitted: &str,
    now: DateTime<Utc>,
    policy: &OtpPolicy,
) -> Result<AuthenticatedIdentity, OtpError> {
    let challenge = session.challenge.as_mut().ok_or(OtpError::NoChallenge)?;

    let submitted = submitted.trim();
    if submitted.is_empty() {
        return Err(OtpError::MissingCode);
    }

    if challenge.is_expired(now) {
        session.challenge = None;
        return Err(OtpError::Expired);
    }

    if !constant_time_eq(&sha256_hex(submitted), &challenge.code_hash) {
        challenge.failed_attempts += 1;
        if challenge.failed_attempts >= policy.max_attempts {
            session.challenge = None;
            return Err(OtpError::TooManyAttempts);
        }
        return Err(OtpError::InvalidCode {
            remaining_attempts: policy.max_attempts - challenge.failed_attempts,
        });
    }

    let challenge = session.challenge.take().ok_or(OtpError::NoChallenge)?;
    let identity = AuthenticatedIdentity {
        photo: resolve_photo(challenge.variant, challenge.photo_path.as_deref()),
        account_id: challenge.account_id,
        variant: challenge.variant,
        full_name: challenge.full_name,
        email: challenge.email,
        authenticated_at: now,
    };
    session.identity = Some(identity.clone());

    Ok(identity)
}
