//! Two-step enrollment workflow for applicants.
//!
//! Step A validates personal details and keeps them as a draft in the
//! session. Step B validates the subject selection against the draft's
//! year level rules and persists a pending application. Nothing reaches
//! the database until Step B succeeds (an optional Step-A photo excepted).

use chrono::{Duration, Utc};
use domain::models::application::NewApplication;
use domain::models::dashboard::{ApplicantDashboard, CurrentApplication};
use domain::models::{
    Application, ApplicationStatus, ArtifactClass, AuthenticatedIdentity, EnrollmentDraft,
    SessionData, YearLevel,
};
use domain::services::curriculum::{catalog, CurriculumCatalog};
use domain::services::review::may_start_application;
use domain::services::{
    select_subjects, ContactRule, CurriculumError, PersonalDetailsForm, SubjectSelectionRequest,
};
use persistence::repositories::{AccountRepository, ApplicationRepository};
use thiserror::Error;
use tracing::info;
use validator::ValidationErrors;

use crate::middleware::metrics;
use crate::services::artifacts::{
    ArtifactStore, UploadError, UploadedFile, APPLICATION_PHOTO_DIR,
};

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("Please complete your personal details first")]
    MissingDraft,

    #[error("You already have an application that is {0}")]
    ActiveApplication(ApplicationStatus),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Subject selection is invalid")]
    Curriculum(Vec<CurriculumError>),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct EnrollmentService {
    applications: ApplicationRepository,
    accounts: AccountRepository,
    artifacts: ArtifactStore,
    contact_rule: ContactRule,
    open_levels: Vec<YearLevel>,
    draft_ttl: Duration,
}

impl EnrollmentService {
    pub fn new(
        applications: ApplicationRepository,
        accounts: AccountRepository,
        artifacts: ArtifactStore,
        contact_rule: ContactRule,
        open_levels: Vec<YearLevel>,
        draft_ttl: Duration,
    ) -> Self {
        Self {
            applications,
            accounts,
            artifacts,
            contact_rule,
            open_levels,
            draft_ttl,
        }
    }

    /// Published curriculum with the currently open year levels marked.
    pub fn curriculum(&self) -> CurriculumCatalog {
        catalog(&self.open_levels)
    }

    /// Refuses to start a new application while the latest one is pending or approved.
    pub async fn ensure_may_apply(&self, applicant_id: &str) -> Result<(), EnrollmentError> {
        let latest = self
            .applications
            .find_latest_for_applicant(applicant_id)
            .await?
            .map(|entity| ApplicationStatus::from(entity.status));

        match latest {
            Some(status) if !may_start_application(Some(status)) => {
                Err(EnrollmentError::ActiveApplication(status))
            }
            _ => Ok(()),
        }
    }

    /// Step A: validates personal details and stores them as the session draft.
    ///
    /// The photo is only written once every field is valid.
    pub async fn save_personal_details(
        &self,
        applicant_id: &str,
        form: &PersonalDetailsForm,
        photo: Option<UploadedFile>,
        session: &mut SessionData,
    ) -> Result<EnrollmentDraft, EnrollmentError> {
        self.ensure_may_apply(applicant_id).await?;

        let mut details = form.validate(self.contact_rule)?;

        if let Some(photo) = photo {
            let stored = self
                .artifacts
                .store(
                    ArtifactClass::Photo,
                    APPLICATION_PHOTO_DIR,
                    applicant_id,
                    &photo.file_name,
                    &photo.bytes,
                )
                .await?;
            details.photo_path = Some(stored.reference);
        }

        let draft = EnrollmentDraft::new(details, Utc::now());
        replace_draft(&self.artifacts, session, draft.clone()).await;
        Ok(draft)
    }

    /// The session's draft, if present and not expired.
    ///
    /// An expired draft is dropped together with its photo.
    pub async fn current_draft(&self, session: &mut SessionData) -> Option<EnrollmentDraft> {
        if let Some(expired) = session.take_expired_draft(Utc::now(), self.draft_ttl) {
            self.artifacts.discard_draft_photo(&expired, None).await;
        }
        session.draft.clone()
    }

    /// Drops the session's draft, if any, and its photo.
    pub async fn discard_draft(&self, session: &mut SessionData) {
        if let Some(draft) = session.draft.take() {
            self.artifacts.discard_draft_photo(&draft, None).await;
        }
    }

    /// Step B: validates subjects and persists a pending application.
    ///
    /// The draft is cleared only after the insert succeeds.
    pub async fn submit_subjects(
        &self,
        applicant_id: &str,
        request: &SubjectSelectionRequest,
        session: &mut SessionData,
    ) -> Result<Application, EnrollmentError> {
        let draft = self
            .current_draft(session)
            .await
            .ok_or(EnrollmentError::MissingDraft)?;

        let selection =
            select_subjects(request, &self.open_levels).map_err(EnrollmentError::Curriculum)?;

        self.ensure_may_apply(applicant_id).await?;

        let new_application = NewApplication {
            applicant_id: applicant_id.to_string(),
            details: draft.details,
            year_level: selection.year_level,
            stream: selection.stream,
            subjects: selection.subjects,
        };

        let application_id = self.applications.next_identifier().await?;
        let entity = self
            .applications
            .create(&application_id, &new_application)
            .await
            .map_err(|e| match &e {
                // One active application per applicant is also enforced by an index.
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    EnrollmentError::ActiveApplication(ApplicationStatus::Pending)
                }
                _ => EnrollmentError::DatabaseError(e),
            })?;

        session.draft = None;

        let application = Application::from(entity);
        info!(
            application_id = %application.id,
            applicant_id = %applicant_id,
            year_level = %application.year_level.label(),
            "Application submitted"
        );
        metrics::record_application_submitted(application.year_level.label());

        Ok(application)
    }

    /// Dashboard for the signed-in applicant.
    pub async fn dashboard(
        &self,
        identity: &AuthenticatedIdentity,
    ) -> Result<ApplicantDashboard, EnrollmentError> {
        let account = self
            .accounts
            .find_by_id(identity.variant, &identity.account_id)
            .await?
            .ok_or(EnrollmentError::AccountNotFound)?
            .into_domain(identity.variant);

        let latest = self
            .applications
            .find_latest_for_applicant(&account.id)
            .await?
            .map(Application::from);

        let can_apply = may_start_application(latest.as_ref().map(|a| a.status));

        let application = match latest {
            Some(application) => Some(self.current_application(application).await),
            None => None,
        };

        Ok(ApplicantDashboard {
            photo: account.resolved_photo(),
            applicant_id: account.id,
            full_name: account.full_name,
            email: account.email,
            application,
            can_apply,
        })
    }

    /// Offer letter reference of the applicant's latest application.
    pub async fn offer_letter_reference(
        &self,
        applicant_id: &str,
    ) -> Result<Option<String>, EnrollmentError> {
        Ok(self
            .applications
            .find_latest_for_applicant(applicant_id)
            .await?
            .filter(|entity| ApplicationStatus::from(entity.status) == ApplicationStatus::Approved)
            .and_then(|entity| entity.offer_letter_path))
    }

    async fn current_application(&self, application: Application) -> CurrentApplication {
        let offer_letter = self
            .artifacts
            .state(application.offer_letter_path.as_deref())
            .await;

        CurrentApplication {
            status_text: application.status.describe(),
            id: application.id,
            year_level: application.year_level,
            subjects: application.subjects,
            status: application.status,
            rejection_reason: application.rejection_reason,
            offer_letter,
            submitted_at: application.submitted_at,
            decided_at: application.decided_at,
        }
    }
}

/// Installs `draft` in the session, removing the photo of the draft it replaces.
async fn replace_draft(
    artifacts: &ArtifactStore,
    session: &mut SessionData,
    draft: EnrollmentDraft,
) {
    let keep = draft.details.photo_path.clone();
    if let Some(previous) = session.draft.replace(draft) {
        artifacts.discard_draft_photo(&previous, keep.as_deref()).await;
    }
}
