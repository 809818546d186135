//! Shared utilities and common types for the enrollment portal backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (hashing, one-time codes, session tokens)
//! - Password hashing with Argon2id
//! - Form field validation
//! - Offset pagination helpers

pub mod crypto;
pub mod pagination;
pub mod password;
pub mod validation;
