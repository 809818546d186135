//! Applicant routes: dashboard and the two-step enrollment form.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Response,
    Json,
};
use domain::models::application::ApplicationResponse;
use domain::models::dashboard::ApplicantDashboard;
use domain::models::{AccountVariant, ArtifactState, EnrollmentDraft};
use domain::services::curriculum::CurriculumCatalog;
use domain::services::{PersonalDetailsForm, SubjectSelectionRequest};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{require_identity, ApplicantAuth, MultipartForm};
use crate::routes::account::PHOTO_FIELD;
use crate::routes::files::{file_name_of, stream_artifact};
use crate::services::enrollment::EnrollmentError;
use crate::services::sessions::{PortalSession, SessionCookie};

impl From<EnrollmentError> for ApiError {
    fn from(err: EnrollmentError) -> Self {
        match err {
            EnrollmentError::MissingDraft => ApiError::Conflict(err.to_string()),
            EnrollmentError::ActiveApplication(_) => ApiError::Conflict(err.to_string()),
            EnrollmentError::AccountNotFound => ApiError::NotFound(err.to_string()),
            EnrollmentError::Validation(errors) => ApiError::from(errors),
            EnrollmentError::Curriculum(errors) => ApiError::from(errors),
            EnrollmentError::Upload(e) => ApiError::from(e),
            EnrollmentError::DatabaseError(e) => ApiError::from(e),
        }
    }
}

/// GET /api/v1/applicant/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    ApplicantAuth(identity): ApplicantAuth,
) -> Result<Json<ApplicantDashboard>, ApiError> {
    Ok(Json(state.enrollment.dashboard(&identity).await?))
}

/// Step A: personal details with an optional photo.
///
/// POST /api/v1/applicant/application/personal
pub async fn save_personal_details(
    State(state): State<AppState>,
    mut session: PortalSession,
    multipart: Multipart,
) -> Result<(SessionCookie, Json<EnrollmentDraft>), ApiError> {
    let identity = require_identity(&session, Some(AccountVariant::Applicant))?;
    let mut form = MultipartForm::read(multipart, PHOTO_FIELD).await?;

    let details = PersonalDetailsForm {
        first_name: form.take("first_name"),
        last_name: form.take("last_name"),
        date_of_birth: form.take("date_of_birth"),
        guardian_name: form.take("guardian_name"),
        guardian_contact: form.take("guardian_contact"),
        address: form.take("address"),
    };

    let draft = state
        .enrollment
        .save_personal_details(&identity.account_id, &details, form.file.take(), &mut session.data)
        .await?;
    let cookie = state.sessions.commit(&mut session).await?;

    Ok((cookie, Json(draft)))
}

/// The saved Step-A draft, if still valid.
///
/// GET /api/v1/applicant/application/draft
pub async fn draft(
    State(state): State<AppState>,
    mut session: PortalSession,
) -> Result<(SessionCookie, Json<EnrollmentDraft>), ApiError> {
    require_identity(&session, Some(AccountVariant::Applicant))?;

    let had_draft = session.data.draft.is_some();
    let draft = state.enrollment.current_draft(&mut session.data).await;
    // An expired draft was dropped; persist that.
    let cookie = if had_draft && draft.is_none() {
        state.sessions.commit(&mut session).await?
    } else {
        SessionCookie::none()
    };

    match draft {
        Some(draft) => Ok((cookie, Json(draft))),
        None => Err(ApiError::NotFound(
            "No saved personal details. Please complete step one.".to_string(),
        )),
    }
}

/// Step B: year level and subjects. Creates the application.
///
/// POST /api/v1/applicant/application/subjects
pub async fn submit_subjects(
    State(state): State<AppState>,
    mut session: PortalSession,
    Json(request): Json<SubjectSelectionRequest>,
) -> Result<(StatusCode, SessionCookie, Json<ApplicationResponse>), ApiError> {
    let identity = require_identity(&session, Some(AccountVariant::Applicant))?;

    let application = state
        .enrollment
        .submit_subjects(&identity.account_id, &request, &mut session.data)
        .await?;
    let cookie = state.sessions.commit(&mut session).await?;

    Ok((
        StatusCode::CREATED,
        cookie,
        Json(ApplicationResponse::new(application, ArtifactState::NotUploaded)),
    ))
}

/// Offer letter of the applicant's latest, approved application.
///
/// GET /api/v1/applicant/application/offer-letter
pub async fn download_offer_letter(
    State(state): State<AppState>,
    ApplicantAuth(identity): ApplicantAuth,
) -> Result<Response, ApiError> {
    let reference = state
        .enrollment
        .offer_letter_reference(&identity.account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No offer letter is available yet".to_string()))?;

    stream_artifact(&state.artifacts, &reference, Some(file_name_of(&reference))).await
}

/// Published curriculum.
///
/// GET /api/v1/curriculum
pub async fn curriculum(State(state): State<AppState>) -> Json<CurriculumCatalog> {
    Json(state.enrollment.curriculum())
}
