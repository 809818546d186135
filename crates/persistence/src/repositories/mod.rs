//! Repository implementations for database operations.

pub mod account;
pub mod application;
pub mod session;

pub use account::AccountRepository;
pub use application::{ApplicationFilter, ApplicationRepository};
pub use session::SessionRepository;

/// Builds a case-insensitive substring pattern for `ILIKE`, escaping wildcards.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
