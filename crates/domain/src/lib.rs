//! Domain layer for the enrollment portal backend.
//!
//! This crate contains:
//! - Domain models (accounts, applications, sessions, artifacts)
//! - Business rules (curriculum, one-time code gate, review decisions)

pub mod models;
pub mod services;
