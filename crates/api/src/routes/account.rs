//! Signed-in account routes: profile, profile photo and photo downloads.

use axum::{
    extract::{Multipart, Path, State},
    response::Response,
    Json,
};
use domain::models::account::AccountResponse;
use domain::models::{AccountVariant, ArtifactClass, AuthenticatedIdentity};
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{require_identity, AccountAuth, MultipartForm};
use crate::routes::files::stream_artifact;
use crate::services::artifacts::{UploadError, APPLICATION_PHOTO_DIR};
use crate::services::sessions::{PortalSession, SessionCookie};

/// Multipart field carrying the photo.
pub const PHOTO_FIELD: &str = "photo";

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Rejected(e) => ApiError::from(e),
            UploadError::Io(e) => ApiError::Internal(format!("Upload storage error: {}", e)),
        }
    }
}

/// Returns the signed-in account.
///
/// GET /api/v1/me
pub async fn me(
    State(state): State<AppState>,
    AccountAuth(identity): AccountAuth,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .accounts
        .find_by_id(identity.variant, &identity.account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    Ok(Json(account.into_domain(identity.variant).into()))
}

/// Replaces the signed-in account's profile photo.
///
/// POST /api/v1/me/photo
pub async fn upload_photo(
    State(state): State<AppState>,
    mut session: PortalSession,
    multipart: Multipart,
) -> Result<(SessionCookie, Json<AccountResponse>), ApiError> {
    let identity = require_identity(&session, None)?;
    let mut form = MultipartForm::read(multipart, PHOTO_FIELD).await?;
    let file = form.require_file(PHOTO_FIELD)?;

    let previous = state
        .accounts
        .find_by_id(identity.variant, &identity.account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?
        .photo_path;

    let stored = state
        .artifacts
        .store(
            ArtifactClass::Photo,
            identity.variant.policy().photo_dir,
            &identity.account_id,
            &file.file_name,
            &file.bytes,
        )
        .await?;

    let updated = match state
        .accounts
        .update_photo(identity.variant, &identity.account_id, &stored.reference)
        .await
    {
        Ok(Some(entity)) => entity,
        Ok(None) => {
            state.artifacts.remove(&stored.reference).await;
            return Err(ApiError::NotFound("Account not found".to_string()));
        }
        Err(e) => {
            state.artifacts.remove(&stored.reference).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = previous.as_deref() {
        if previous != stored.reference {
            state.artifacts.remove(previous).await;
        }
    }

    let account = updated.into_domain(identity.variant);
    if let Some(session_identity) = session.data.identity.as_mut() {
        session_identity.photo = account.resolved_photo();
    }
    let cookie = state.sessions.commit(&mut session).await?;

    info!(account_id = %account.id, "Profile photo updated");
    Ok((cookie, Json(account.into())))
}

/// Photo directories reachable through the download route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoKind {
    Staff,
    Applicants,
    Applications,
}

impl PhotoKind {
    fn dir(&self) -> &'static str {
        match self {
            PhotoKind::Staff => AccountVariant::Staff.policy().photo_dir,
            PhotoKind::Applicants => AccountVariant::Applicant.policy().photo_dir,
            PhotoKind::Applications => APPLICATION_PHOTO_DIR,
        }
    }
}

/// Staff see every photo. Applicants see staff photos and their own.
fn may_view_photo(identity: &AuthenticatedIdentity, kind: PhotoKind, file_name: &str) -> bool {
    match (identity.variant, kind) {
        (AccountVariant::Staff, _) => true,
        (AccountVariant::Applicant, PhotoKind::Staff) => true,
        (AccountVariant::Applicant, _) => file_name
            .strip_prefix(identity.account_id.as_str())
            .is_some_and(|rest| rest.starts_with('_')),
    }
}

/// Streams a stored photo.
///
/// GET /api/v1/photos/:kind/:filename
pub async fn download_photo(
    State(state): State<AppState>,
    AccountAuth(identity): AccountAuth,
    Path((kind, file_name)): Path<(PhotoKind, String)>,
) -> Result<Response, ApiError> {
    if !may_view_photo(&identity, kind, &file_name) {
        return Err(ApiError::Forbidden(
            "You do not have access to this photo".to_string(),
        ));
    }

    let reference = format!("{}/{}", kind.dir(), file_name);
    stream_artifact(&state.artifacts, &reference, None).await
}
