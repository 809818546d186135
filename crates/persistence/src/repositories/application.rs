//! Application repository for database operations.

use domain::models::application::{join_subjects, NewApplication};
use domain::models::{ApplicationStatus, IdNamespace};
use sqlx::PgPool;

use crate::entities::{
    ApplicationCountsEntity, ApplicationEntity, ApplicationListEntity, ApplicationStatusDb,
    ApplicationWithApplicantEntity, StreamDb, YearLevelDb,
};
use crate::metrics::QueryTimer;

use super::like_pattern;

const APPLICATION_COLUMNS: &str = r#"
    application_id, applicant_id, first_name, last_name, date_of_birth,
    guardian_name, guardian_contact, address, photo_path, year_level, stream,
    subjects, status, rejection_reason, offer_letter_path, reviewed_by,
    decided_at, submitted_at
"#;

/// Filters for the staff application listing.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub search: Option<String>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    fn pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern)
    }

    fn status(&self) -> Option<ApplicationStatusDb> {
        self.status.map(Into::into)
    }
}

/// Repository for application-related database operations.
#[derive(Clone)]
pub struct ApplicationRepository {
    pool: PgPool,
}

impl ApplicationRepository {
    /// Creates a new ApplicationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reserves the next application identifier.
    pub async fn next_identifier(&self) -> Result<String, sqlx::Error> {
        let namespace = IdNamespace::Application;
        let timer = QueryTimer::new("next_application_identifier");
        let sql = format!("SELECT nextval('{}')", namespace.sequence_name());
        let result = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result.map(|n| namespace.format(n))
    }

    /// Inserts a new pending application.
    pub async fn create(
        &self,
        application_id: &str,
        application: &NewApplication,
    ) -> Result<ApplicationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_application");
        let sql = format!(
            r#"
            INSERT INTO applications (
                application_id, applicant_id, first_name, last_name, date_of_birth,
                guardian_name, guardian_contact, address, photo_path,
                year_level, stream, subjects, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'pending')
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let details = &application.details;
        let result = sqlx::query_as::<_, ApplicationEntity>(&sql)
            .bind(application_id)
            .bind(&application.applicant_id)
            .bind(&details.first_name)
            .bind(&details.last_name)
            .bind(details.date_of_birth)
            .bind(&details.guardian_name)
            .bind(&details.guardian_contact)
            .bind(&details.address)
            .bind(details.photo_path.as_deref())
            .bind(YearLevelDb::from(application.year_level))
            .bind(application.stream.map(StreamDb::from))
            .bind(join_subjects(&application.subjects))
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find an application by identifier.
    pub async fn find_by_id(
        &self,
        application_id: &str,
    ) -> Result<Option<ApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_application_by_id");
        let sql = format!(
            "SELECT {} FROM applications WHERE application_id = $1",
            APPLICATION_COLUMNS
        );
        let result = sqlx::query_as::<_, ApplicationEntity>(&sql)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Find an application together with its applicant's name and email.
    pub async fn find_with_applicant(
        &self,
        application_id: &str,
    ) -> Result<Option<ApplicationWithApplicantEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_application_with_applicant");
        let result = sqlx::query_as::<_, ApplicationWithApplicantEntity>(
            r#"
            SELECT ap.application_id, ap.applicant_id, ap.first_name, ap.last_name,
                   ap.date_of_birth, ap.guardian_name, ap.guardian_contact, ap.address,
                   ap.photo_path, ap.year_level, ap.stream, ap.subjects, ap.status,
                   ap.rejection_reason, ap.offer_letter_path, ap.reviewed_by,
                   ap.decided_at, ap.submitted_at,
                   acc.full_name AS applicant_name,
                   acc.email AS applicant_email
            FROM applications ap
            JOIN applicant_accounts acc ON acc.account_id = ap.applicant_id
            WHERE ap.application_id = $1
            "#,
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The applicant's most recent application by submission time.
    pub async fn find_latest_for_applicant(
        &self,
        applicant_id: &str,
    ) -> Result<Option<ApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_latest_application_for_applicant");
        let sql = format!(
            r#"
            SELECT {}
            FROM applications
            WHERE applicant_id = $1
            ORDER BY submitted_at DESC, application_id DESC
            LIMIT 1
            "#,
            APPLICATION_COLUMNS
        );
        let result = sqlx::query_as::<_, ApplicationEntity>(&sql)
            .bind(applicant_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// List applications, newest first.
    pub async fn list(
        &self,
        filter: &ApplicationFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ApplicationListEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_applications");
        let result = sqlx::query_as::<_, ApplicationListEntity>(
            r#"
            SELECT application_id, applicant_id, first_name, last_name,
                   year_level, status, submitted_at
            FROM applications
            WHERE ($1::text IS NULL
                   OR application_id ILIKE $1
                   OR applicant_id ILIKE $1
                   OR first_name ILIKE $1
                   OR last_name ILIKE $1)
              AND ($2::application_status IS NULL OR status = $2)
            ORDER BY submitted_at DESC, application_id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.pattern())
        .bind(filter.status())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count applications matching a listing filter.
    pub async fn count(&self, filter: &ApplicationFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_applications");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM applications
            WHERE ($1::text IS NULL
                   OR application_id ILIKE $1
                   OR applicant_id ILIKE $1
                   OR first_name ILIKE $1
                   OR last_name ILIKE $1)
              AND ($2::application_status IS NULL OR status = $2)
            "#,
        )
        .bind(filter.pattern())
        .bind(filter.status())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Counts by status for the staff dashboard.
    pub async fn status_counts(&self) -> Result<ApplicationCountsEntity, sqlx::Error> {
        let timer = QueryTimer::new("application_status_counts");
        let result = sqlx::query_as::<_, ApplicationCountsEntity>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                   COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                   COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
            FROM applications
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Records a decision on a pending application.
    ///
    /// The status check is part of the update, so two reviewers racing on
    /// the same application cannot both succeed. Returns `None` when the
    /// application does not exist or is no longer pending.
    pub async fn decide(
        &self,
        application_id: &str,
        status: ApplicationStatus,
        reviewer_id: &str,
        rejection_reason: Option<&str>,
    ) -> Result<Option<ApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("decide_application");
        let sql = format!(
            r#"
            UPDATE applications
            SET status = $2,
                reviewed_by = $3,
                rejection_reason = $4,
                decided_at = NOW(),
                updated_at = NOW()
            WHERE application_id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let result = sqlx::query_as::<_, ApplicationEntity>(&sql)
            .bind(application_id)
            .bind(ApplicationStatusDb::from(status))
            .bind(reviewer_id)
            .bind(rejection_reason)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Stores the offer letter reference on an approved application.
    ///
    /// Returns `None` when the application does not exist or is not approved.
    pub async fn set_offer_letter(
        &self,
        application_id: &str,
        offer_letter_path: &str,
    ) -> Result<Option<ApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_application_offer_letter");
        let sql = format!(
            r#"
            UPDATE applications
            SET offer_letter_path = $2, updated_at = NOW()
            WHERE application_id = $1 AND status = 'approved'
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let result = sqlx::query_as::<_, ApplicationEntity>(&sql)
            .bind(application_id)
            .bind(offer_letter_path)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }
}
