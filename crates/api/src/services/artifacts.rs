//! Filesystem store for uploaded photos and documents.
//!
//! Files live under the configured upload root; records store the path
//! relative to that root (for example
//! `photos/applicants/S0001_1718000000000_9c1e4b7a.png`).
//! A file is first written to a hidden temporary name and then renamed, so a
//! reader never sees a partially written artifact.

use chrono::Utc;
use domain::models::artifact::{
    artifact_file_name, check_upload, is_safe_file_name, ArtifactError,
};
use domain::models::{ArtifactClass, ArtifactState, EnrollmentDraft};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::UploadsConfig;
use crate::middleware::metrics;

/// Directory for photos uploaded with the personal-details step.
pub const APPLICATION_PHOTO_DIR: &str = "photos/applications";

/// Directory for offer letters.
pub const OFFER_LETTER_DIR: &str = "documents/offer_letters";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(#[from] ArtifactError),

    #[error("Could not store the uploaded file: {0}")]
    Io(#[from] std::io::Error),
}

/// A file received in a multipart upload, not yet validated.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied name; only its extension is used.
    pub file_name: String,
    pub bytes: axum::body::Bytes,
}

/// A file that has been written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Path relative to the upload root, as stored on records.
    pub reference: String,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    max_photo_bytes: u64,
    max_document_bytes: u64,
}

impl ArtifactStore {
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root_dir),
            max_photo_bytes: config.max_photo_bytes,
            max_document_bytes: config.max_document_bytes,
        }
    }

    pub fn max_bytes(&self, class: ArtifactClass) -> u64 {
        match class {
            ArtifactClass::Photo => self.max_photo_bytes,
            ArtifactClass::Document => self.max_document_bytes,
        }
    }

    /// Validates and stores an upload under `dir`, named after `owner_id`.
    pub async fn store(
        &self,
        class: ArtifactClass,
        dir: &str,
        owner_id: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredArtifact, UploadError> {
        let extension = check_upload(class, original_name, bytes.len() as u64, self.max_bytes(class))?;
        if !is_safe_file_name(owner_id) {
            return Err(ArtifactError::InvalidName.into());
        }

        let nonce = Uuid::new_v4().simple().to_string();
        let file_name = artifact_file_name(owner_id, Utc::now(), &nonce[..8], &extension);
        let dir_path = self.root.join(dir);
        fs::create_dir_all(&dir_path).await?;

        let final_path = dir_path.join(&file_name);
        let temp_path = dir_path.join(format!(".{}.part", file_name));

        fs::write(&temp_path, bytes).await?;
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(path = %final_path.display(), size = bytes.len(), "Stored artifact");
        metrics::record_upload(match class {
            ArtifactClass::Photo => "photo",
            ArtifactClass::Document => "document",
        });

        Ok(StoredArtifact {
            reference: format!("{}/{}", dir, file_name),
            file_name,
        })
    }

    /// Maps a stored reference to a path under the root.
    ///
    /// Returns `None` for anything that is not a plain relative path made of
    /// safe segments.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        let mut segments = 0;
        for segment in reference.split('/') {
            if !is_safe_file_name(segment) {
                return None;
            }
            path.push(segment);
            segments += 1;
        }
        (segments > 0).then_some(path)
    }

    pub async fn exists(&self, reference: &str) -> bool {
        match self.resolve(reference) {
            Some(path) => is_file(&path).await,
            None => false,
        }
    }

    /// Reported state of an optional stored reference.
    pub async fn state(&self, reference: Option<&str>) -> ArtifactState {
        let exists = match reference {
            Some(r) => self.exists(r).await,
            None => false,
        };
        ArtifactState::from_reference(reference, |_| exists)
    }

    /// Best-effort removal of a file no record will point at.
    pub async fn remove(&self, reference: &str) {
        if let Some(path) = self.resolve(reference) {
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove artifact");
            }
        }
    }

    /// Removes the Step-A photo of a draft that is being replaced or dropped.
    /// `keep` names a photo still in use, typically the replacing draft's.
    pub async fn discard_draft_photo(&self, draft: &EnrollmentDraft, keep: Option<&str>) {
        if let Some(photo) = draft.details.photo_path.as_deref() {
            if keep != Some(photo) {
                debug!(photo, "Discarding draft photo");
                self.remove(photo).await;
            }
        }
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
