//! Password hashing for portal accounts using Argon2id.
//!
//! Staff and applicant accounts share one hashing scheme. The stored value
//! is a PHC string, so the parameters travel with the hash and older hashes
//! keep verifying after a parameter change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Minimum accepted password length, counted in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Error type for password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// OWASP 2024 baseline for Argon2id: 19 MiB, 2 passes, 1 lane.
const MEMORY_COST: u32 = 19456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

fn create_argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashError(format!("Failed to create Argon2 params: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Returns true when the password is long enough to be accepted at registration.
pub fn meets_minimum_length(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// Hashes a password with a fresh random salt.
///
/// ```
/// use shared::password::hash_password;
///
/// let hash = hash_password("secret1").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = create_argon2()?;

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored PHC hash.
///
/// `Ok(false)` means the password is wrong; `Err` means the stored hash
/// itself is unusable.
///
/// ```
/// use shared::password::{hash_password, verify_password};
///
/// let hash = hash_password("secret1").unwrap();
/// assert!(verify_password("secret1", &hash).unwrap());
/// assert!(!verify_password("secret2", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Parameters are read from the PHC string, not from the default instance.
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}
