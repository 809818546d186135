//! HTTP route handlers.

pub mod account;
pub mod applicant;
pub mod auth;
pub mod chat;
pub mod files;
pub mod health;
pub mod staff;
