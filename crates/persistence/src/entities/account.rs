//! Account entity (database row mapping).
//!
//! Staff and applicant tables share a column layout, so one entity serves both.

use chrono::{DateTime, Utc};
use domain::models::{Account, AccountVariant};
use sqlx::FromRow;

/// Database row mapping for the staff_accounts and applicant_accounts tables.
#[derive(Debug, Clone, FromRow)]
pub struct AccountEntity {
    pub account_id: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountEntity {
    /// Converts to the domain model. The variant is implied by the table read.
    pub fn into_domain(self, variant: AccountVariant) -> Account {
        Account {
            id: self.account_id,
            variant,
            full_name: self.full_name,
            email: self.email,
            photo_path: self.photo_path,
            created_at: self.created_at,
        }
    }
}

/// Applicant account joined with its most recent application, if any.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicantWithLatestApplicationEntity {
    pub account_id: String,
    pub full_name: String,
    pub email: String,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub latest_application_id: Option<String>,
    pub latest_year_level: Option<super::YearLevelDb>,
    pub latest_status: Option<super::ApplicationStatusDb>,
    pub latest_submitted_at: Option<DateTime<Utc>>,
}
