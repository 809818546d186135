//! Account repository for database operations.
//!
//! Staff and applicant accounts live in separate tables with identical
//! layouts; every method takes the variant and resolves the table from it.

use domain::models::AccountVariant;
use sqlx::PgPool;

use crate::entities::{AccountEntity, ApplicantWithLatestApplicationEntity};
use crate::metrics::QueryTimer;

use super::like_pattern;

fn table(variant: AccountVariant) -> &'static str {
    match variant {
        AccountVariant::Staff => "staff_accounts",
        AccountVariant::Applicant => "applicant_accounts",
    }
}

const ACCOUNT_COLUMNS: &str =
    "account_id, full_name, email, password_hash, photo_path, created_at, updated_at";

/// Repository for account-related database operations.
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Creates a new AccountRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reserves the next identifier for a variant from its sequence.
    ///
    /// Sequence values are never handed out twice, so concurrent
    /// registrations get distinct identifiers. Failed inserts leave gaps.
    pub async fn next_identifier(&self, variant: AccountVariant) -> Result<String, sqlx::Error> {
        let namespace = variant.namespace();
        let timer = QueryTimer::new("next_account_identifier");
        let sql = format!("SELECT nextval('{}')", namespace.sequence_name());
        let result = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result.map(|n| namespace.format(n))
    }

    /// Inserts a new account.
    ///
    /// A duplicate email surfaces as a unique violation (23505).
    pub async fn create(
        &self,
        variant: AccountVariant,
        account_id: &str,
        full_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<AccountEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_account");
        let sql = format!(
            r#"
            INSERT INTO {} (account_id, full_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            table(variant),
            ACCOUNT_COLUMNS
        );
        let result = sqlx::query_as::<_, AccountEntity>(&sql)
            .bind(account_id)
            .bind(full_name)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Finds an account by exact email or identifier.
    pub async fn find_by_login(
        &self,
        variant: AccountVariant,
        login: &str,
    ) -> Result<Option<AccountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_account_by_login");
        let sql = format!(
            r#"
            SELECT {}
            FROM {}
            WHERE email = $1 OR account_id = $1
            ORDER BY (email = $1) DESC
            LIMIT 1
            "#,
            ACCOUNT_COLUMNS,
            table(variant)
        );
        let result = sqlx::query_as::<_, AccountEntity>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Finds an account by identifier.
    pub async fn find_by_id(
        &self,
        variant: AccountVariant,
        account_id: &str,
    ) -> Result<Option<AccountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_account_by_id");
        let sql = format!(
            "SELECT {} FROM {} WHERE account_id = $1",
            ACCOUNT_COLUMNS,
            table(variant)
        );
        let result = sqlx::query_as::<_, AccountEntity>(&sql)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Checks whether an email is already registered for the variant.
    pub async fn email_exists(
        &self,
        variant: AccountVariant,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("account_email_exists");
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE email = $1)",
            table(variant)
        );
        let result = sqlx::query_scalar::<_, bool>(&sql)
            .bind(email)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Counts accounts of a variant.
    pub async fn count(&self, variant: AccountVariant) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_accounts");
        let sql = format!("SELECT COUNT(*) FROM {}", table(variant));
        let result = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Stores a new profile photo reference.
    pub async fn update_photo(
        &self,
        variant: AccountVariant,
        account_id: &str,
        photo_path: &str,
    ) -> Result<Option<AccountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_account_photo");
        let sql = format!(
            r#"
            UPDATE {}
            SET photo_path = $2, updated_at = NOW()
            WHERE account_id = $1
            RETURNING {}
            "#,
            table(variant),
            ACCOUNT_COLUMNS
        );
        let result = sqlx::query_as::<_, AccountEntity>(&sql)
            .bind(account_id)
            .bind(photo_path)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Searches applicants by identifier, name or email (partial, case-insensitive).
    ///
    /// Each hit carries the applicant's most recent application.
    pub async fn search_applicants(
        &self,
        query: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ApplicantWithLatestApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("search_applicants");
        let pattern = query.map(like_pattern);
        let result = sqlx::query_as::<_, ApplicantWithLatestApplicationEntity>(
            r#"
            SELECT a.account_id, a.full_name, a.email, a.photo_path, a.created_at,
                   la.application_id AS latest_application_id,
                   la.year_level AS latest_year_level,
                   la.status AS latest_status,
                   la.submitted_at AS latest_submitted_at
            FROM applicant_accounts a
            LEFT JOIN LATERAL (
                SELECT ap.application_id, ap.year_level, ap.status, ap.submitted_at
                FROM applications ap
                WHERE ap.applicant_id = a.account_id
                ORDER BY ap.submitted_at DESC, ap.application_id DESC
                LIMIT 1
            ) la ON TRUE
            WHERE $1::text IS NULL
               OR a.account_id ILIKE $1
               OR a.full_name ILIKE $1
               OR a.email ILIKE $1
            ORDER BY a.account_id
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
