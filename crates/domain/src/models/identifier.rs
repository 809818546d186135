//! Sequential human-readable identifiers.
//!
//! Identifiers render as a namespace prefix followed by a zero-padded
//! number (`T0001`, `S0042`, `APP0007`). The numbers come from a database
//! sequence, so they are unique and increasing but may have gaps.

use serde::{Deserialize, Serialize};

/// Minimum number of digits after the prefix. Larger numbers render wider.
pub const IDENTIFIER_WIDTH: usize = 4;

/// The independent identifier namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdNamespace {
    Staff,
    Applicant,
    Application,
}

impl IdNamespace {
    pub const fn prefix(&self) -> &'static str {
        match self {
            IdNamespace::Staff => "T",
            IdNamespace::Applicant => "S",
            IdNamespace::Application => "APP",
        }
    }

    /// Name of the Postgres sequence backing this namespace.
    pub const fn sequence_name(&self) -> &'static str {
        match self {
            IdNamespace::Staff => "staff_account_number_seq",
            IdNamespace::Applicant => "applicant_account_number_seq",
            IdNamespace::Application => "application_number_seq",
        }
    }

    /// Renders a sequence number as an identifier.
    pub fn format(&self, number: i64) -> String {
        format!("{}{:0width$}", self.prefix(), number, width = IDENTIFIER_WIDTH)
    }

    /// Extracts the sequence number from an identifier of this namespace.
    pub fn parse(&self, identifier: &str) -> Option<i64> {
        let digits = identifier.strip_prefix(self.prefix())?;
        if digits.len() < IDENTIFIER_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().filter(|n: &i64| *n > 0)
    }

    pub fn is_valid(&self, identifier: &str) -> bool {
        self.parse(identifier).is_some()
    }
}
