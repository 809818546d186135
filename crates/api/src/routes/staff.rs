//! Staff review routes.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::Response,
    Json,
};
use domain::models::application::{
    ApplicationListQuery, ApplicationListResponse, ApplicationResponse,
};
use domain::models::dashboard::{ApplicantSearchQuery, ApplicantSearchResult, StaffDashboard};
use domain::services::review::rejection;
use domain::services::ReviewDecision;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{MultipartForm, StaffAuth};
use crate::routes::files::{file_name_of, stream_artifact};
use crate::services::review::{ApplicationDetail, ReviewError};

/// Multipart field carrying the offer letter.
pub const OFFER_LETTER_FIELD: &str = "offer_letter";

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::NotFound => ApiError::NotFound(err.to_string()),
            ReviewError::Rule(e) => ApiError::from(e),
            ReviewError::Upload(e) => ApiError::from(e),
            ReviewError::DatabaseError(e) => ApiError::from(e),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

/// GET /api/v1/staff/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    StaffAuth(identity): StaffAuth,
) -> Result<Json<StaffDashboard>, ApiError> {
    Ok(Json(state.review.dashboard(&identity).await?))
}

/// GET /api/v1/staff/applications
pub async fn list_applications(
    State(state): State<AppState>,
    StaffAuth(_identity): StaffAuth,
    Query(query): Query<ApplicationListQuery>,
) -> Result<Json<ApplicationListResponse>, ApiError> {
    Ok(Json(state.review.list(&query).await?))
}

/// GET /api/v1/staff/applications/:app_id
pub async fn get_application(
    State(state): State<AppState>,
    StaffAuth(_identity): StaffAuth,
    Path(application_id): Path<String>,
) -> Result<Json<ApplicationDetail>, ApiError> {
    Ok(Json(state.review.detail(&application_id).await?))
}

/// POST /api/v1/staff/applications/:app_id/approve
pub async fn approve(
    State(state): State<AppState>,
    StaffAuth(identity): StaffAuth,
    Path(application_id): Path<String>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let response = state
        .review
        .decide(&identity, &application_id, ReviewDecision::Approve)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/staff/applications/:app_id/reject
pub async fn reject(
    State(state): State<AppState>,
    StaffAuth(identity): StaffAuth,
    Path(application_id): Path<String>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let decision = rejection(&request.reason)?;
    let response = state
        .review
        .decide(&identity, &application_id, decision)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/staff/applications/:app_id/offer-letter
pub async fn upload_offer_letter(
    State(state): State<AppState>,
    StaffAuth(_identity): StaffAuth,
    Path(application_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let mut form = MultipartForm::read(multipart, OFFER_LETTER_FIELD).await?;
    let file = form.require_file(OFFER_LETTER_FIELD)?;

    let response = state
        .review
        .attach_offer_letter(&application_id, file)
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/staff/applications/:app_id/offer-letter
pub async fn download_offer_letter(
    State(state): State<AppState>,
    StaffAuth(_identity): StaffAuth,
    Path(application_id): Path<String>,
) -> Result<Response, ApiError> {
    let reference = state
        .review
        .offer_letter_reference(&application_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No offer letter has been uploaded".to_string()))?;

    stream_artifact(&state.artifacts, &reference, Some(file_name_of(&reference))).await
}

/// GET /api/v1/staff/applicants/search
pub async fn search_applicants(
    State(state): State<AppState>,
    StaffAuth(_identity): StaffAuth,
    Query(query): Query<ApplicantSearchQuery>,
) -> Result<Json<Vec<ApplicantSearchResult>>, ApiError> {
    let results = state
        .review
        .search_applicants(query.q.as_deref(), query.limit)
        .await?;
    Ok(Json(results))
}
