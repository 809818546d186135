//! Staff review of applications: listing, detail, decisions and offer letters.

use domain::models::application::{
    ApplicationListItem, ApplicationListQuery, ApplicationListResponse, ApplicationResponse,
};
use domain::models::dashboard::{
    ApplicantSearchResult, ApplicationCounts, LatestApplicationSummary, StaffDashboard,
};
use domain::models::account::resolve_photo;
use domain::models::{
    AccountVariant, Application, ArtifactClass, AuthenticatedIdentity, IdNamespace,
};
use domain::services::review::{ensure_decidable, ensure_offer_letter_allowed};
use domain::services::{ReviewDecision, ReviewRuleError};
use persistence::repositories::{AccountRepository, ApplicationFilter, ApplicationRepository};
use serde::Serialize;
use shared::pagination::{PageInfo, PageRequest};
use thiserror::Error;
use tracing::info;

use crate::middleware::metrics;
use crate::services::artifacts::{ArtifactStore, UploadError, UploadedFile, OFFER_LETTER_DIR};

/// Default and maximum number of applicant search hits.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const MAX_SEARCH_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Application not found")]
    NotFound,

    #[error(transparent)]
    Rule(#[from] ReviewRuleError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Application detail with the applicant's account name and email.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub applicant_name: String,
    pub applicant_email: String,
}

#[derive(Clone)]
pub struct ReviewService {
    applications: ApplicationRepository,
    accounts: AccountRepository,
    artifacts: ArtifactStore,
}

impl ReviewService {
    pub fn new(
        applications: ApplicationRepository,
        accounts: AccountRepository,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            applications,
            accounts,
            artifacts,
        }
    }

    pub async fn dashboard(
        &self,
        identity: &AuthenticatedIdentity,
    ) -> Result<StaffDashboard, ReviewError> {
        let counts = self.applications.status_counts().await?;
        Ok(StaffDashboard {
            staff_id: identity.account_id.clone(),
            full_name: identity.full_name.clone(),
            counts: ApplicationCounts {
                total: counts.total,
                pending: counts.pending,
                approved: counts.approved,
                rejected: counts.rejected,
            },
        })
    }

    /// Paginated listing, newest first.
    pub async fn list(
        &self,
        query: &ApplicationListQuery,
    ) -> Result<ApplicationListResponse, ReviewError> {
        let page = PageRequest::new(query.page, query.per_page);
        let filter = ApplicationFilter {
            search: query.search.clone(),
            status: query.status,
        };

        let total = self.applications.count(&filter).await?;
        let data: Vec<ApplicationListItem> = self
            .applications
            .list(&filter, page.limit(), page.offset())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(ApplicationListResponse {
            data,
            pagination: PageInfo::new(page, total),
        })
    }

    pub async fn detail(&self, application_id: &str) -> Result<ApplicationDetail, ReviewError> {
        check_application_id(application_id)?;
        let row = self
            .applications
            .find_with_applicant(application_id)
            .await?
            .ok_or(ReviewError::NotFound)?;

        let application = Application::from(row.application);
        Ok(ApplicationDetail {
            application: self.respond(application).await,
            applicant_name: row.applicant_name,
            applicant_email: row.applicant_email,
        })
    }

    /// Records a decision on a pending application.
    pub async fn decide(
        &self,
        reviewer: &AuthenticatedIdentity,
        application_id: &str,
        decision: ReviewDecision,
    ) -> Result<ApplicationResponse, ReviewError> {
        check_application_id(application_id)?;
        let target = decision.target_status();
        let updated = self
            .applications
            .decide(application_id, target, &reviewer.account_id, decision.reason())
            .await?;

        let entity = match updated {
            Some(entity) => entity,
            None => {
                let current = self
                    .applications
                    .find_by_id(application_id)
                    .await?
                    .ok_or(ReviewError::NotFound)?;
                ensure_decidable(current.status.into())?;
                return Err(ReviewError::NotFound);
            }
        };

        info!(
            application_id = %application_id,
            reviewer = %reviewer.account_id,
            decision = %target,
            "Application decided"
        );
        metrics::record_review_decision(target.as_str());

        Ok(self.respond(Application::from(entity)).await)
    }

    /// Stores an offer letter and attaches it to an approved application.
    ///
    /// The file is removed again if the application cannot take it.
    pub async fn attach_offer_letter(
        &self,
        application_id: &str,
        file: UploadedFile,
    ) -> Result<ApplicationResponse, ReviewError> {
        check_application_id(application_id)?;
        let current = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(ReviewError::NotFound)?;
        ensure_offer_letter_allowed(current.status.into())?;

        let stored = self
            .artifacts
            .store(
                ArtifactClass::Document,
                OFFER_LETTER_DIR,
                application_id,
                &file.file_name,
                &file.bytes,
            )
            .await?;

        let updated = match self
            .applications
            .set_offer_letter(application_id, &stored.reference)
            .await
        {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                self.artifacts.remove(&stored.reference).await;
                return Err(ReviewError::NotFound);
            }
            Err(e) => {
                self.artifacts.remove(&stored.reference).await;
                return Err(e.into());
            }
        };

        if let Some(previous) = current.offer_letter_path.as_deref() {
            if previous != stored.reference {
                self.artifacts.remove(previous).await;
            }
        }

        info!(application_id = %application_id, file = %stored.file_name, "Offer letter attached");
        Ok(self.respond(Application::from(updated)).await)
    }

    /// Offer letter reference of any application, for staff downloads.
    pub async fn offer_letter_reference(
        &self,
        application_id: &str,
    ) -> Result<Option<String>, ReviewError> {
        check_application_id(application_id)?;
        let entity = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(ReviewError::NotFound)?;
        Ok(entity.offer_letter_path)
    }

    /// Applicants matching a name, email or identifier, each with their latest application.
    pub async fn search_applicants(
        &self,
        query: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<ApplicantSearchResult>, ReviewError> {
        let limit = search_limit(limit);
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        let rows = self
            .accounts
            .search_applicants(query, i64::from(limit))
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let latest_application = match (
                    row.latest_application_id,
                    row.latest_year_level,
                    row.latest_status,
                    row.latest_submitted_at,
                ) {
                    (Some(id), Some(year_level), Some(status), Some(submitted_at)) => {
                        Some(LatestApplicationSummary {
                            id,
                            year_level: year_level.into(),
                            status: status.into(),
                            submitted_at,
                        })
                    }
                    _ => None,
                };
                ApplicantSearchResult {
                    photo: resolve_photo(AccountVariant::Applicant, row.photo_path.as_deref()),
                    applicant_id: row.account_id,
                    full_name: row.full_name,
                    email: row.email,
                    created_at: row.created_at,
                    latest_application,
                }
            })
            .collect())
    }

    async fn respond(&self, application: Application) -> ApplicationResponse {
        let offer_letter = self
            .artifacts
            .state(application.offer_letter_path.as_deref())
            .await;
        ApplicationResponse::new(application, offer_letter)
    }
}

/// A path value that cannot name an application is reported as not found
/// without a query.
fn check_application_id(application_id: &str) -> Result<(), ReviewError> {
    if IdNamespace::Application.is_valid(application_id) {
        Ok(())
    } else {
        Err(ReviewError::NotFound)
    }
}

fn search_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT)
}
