//! Cryptographic utilities for session tokens and one-time codes.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of digits in a one-time login code.
pub const OTP_DIGITS: usize = 6;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a uniformly random 6-digit numeric code (100000..=999999).
pub fn generate_otp_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    code.to_string()
}

/// Generates an opaque session token (32 random bytes, hex encoded).
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Compares two strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_hex_different_inputs() {
        assert_ne!(sha256_hex("123456"), sha256_hex("123457"));
    }

    #[test]
    fn test_otp_code_is_six_digits() {
        for _ in 0..200 {
            let code = generate_otp_code();
            assert_eq!(code.len(), OTP_DIGITS);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }

    #[test]
    fn test_session_token_format() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(hex::decode(&token).is_ok());
    }

    #[test]
    fn test_session_token_uniqueness() {
        assert_ne!(generate_session_token(), generate_session_token());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }
}
