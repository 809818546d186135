//! Uploaded artifact rules: allow-lists, naming and reported state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of uploaded file. Each class has its own extension allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactClass {
    Photo,
    Document,
}

const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];

impl ArtifactClass {
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            ArtifactClass::Photo => PHOTO_EXTENSIONS,
            ArtifactClass::Document => DOCUMENT_EXTENSIONS,
        }
    }

    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions().contains(&extension)
    }
}

/// Rejection reasons for an uploaded file. These are safe to show to users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("No file was uploaded")]
    Empty,

    #[error("The file has no extension")]
    MissingExtension,

    #[error("Files of type .{extension} are not allowed (allowed: {allowed})")]
    DisallowedExtension { extension: String, allowed: String },

    #[error("The file is too large (maximum {max_bytes} bytes)")]
    TooLarge { max_bytes: u64 },

    #[error("Invalid file name")]
    InvalidName,
}

/// Checks an uploaded file's original name and size against the class rules.
///
/// Returns the normalized (lowercase) extension.
pub fn check_upload(
    class: ArtifactClass,
    original_name: &str,
    size: u64,
    max_bytes: u64,
) -> Result<String, ArtifactError> {
    if size == 0 {
        return Err(ArtifactError::Empty);
    }
    if size > max_bytes {
        return Err(ArtifactError::TooLarge { max_bytes });
    }

    let extension = extension_of(original_name).ok_or(ArtifactError::MissingExtension)?;
    if !class.allows(&extension) {
        return Err(ArtifactError::DisallowedExtension {
            extension,
            allowed: class.allowed_extensions().join(", "),
        });
    }

    Ok(extension)
}

/// Lowercased extension of a client-supplied file name.
pub fn extension_of(original_name: &str) -> Option<String> {
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or(original_name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Generated storage name: owner identifier, millisecond timestamp, a
/// caller-chosen `nonce` separating uploads within one millisecond, extension.
pub fn artifact_file_name(
    owner_id: &str,
    at: DateTime<Utc>,
    nonce: &str,
    extension: &str,
) -> String {
    format!("{}_{}_{}.{}", owner_id, at.timestamp_millis(), nonce, extension)
}

/// True when `name` is a bare file name safe to join onto a storage directory.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// What the portal reports about a referenced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ArtifactState {
    /// No reference is stored.
    NotUploaded,
    /// A reference is stored and the file exists.
    Available { path: String },
    /// A reference is stored but the file is gone.
    Missing { path: String },
}

impl ArtifactState {
    /// Builds the state from a stored reference and an existence check.
    pub fn from_reference(reference: Option<&str>, exists: impl FnOnce(&str) -> bool) -> Self {
        match reference.filter(|r| !r.trim().is_empty()) {
            None => ArtifactState::NotUploaded,
            Some(path) if exists(path) => ArtifactState::Available {
                path: path.to_string(),
            },
            Some(path) => ArtifactState::Missing {
                path: path.to_string(),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ArtifactState::Available { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MAX: u64 = 2 * 1024 * 1024;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.JPG"), Some("jpg".to_string()));
        assert_eq!(extension_of("letter.final.pdf"), Some("pdf".to_string()));
        assert_eq!(extension_of("C:\\Users\\me\\scan.PNG"), Some("png".to_string()));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".bashrc"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_check_upload_photo_allow_list() {
        assert_eq!(
            check_upload(ArtifactClass::Photo, "me.jpeg", 10, MAX),
            Ok("jpeg".to_string())
        );
        assert!(matches!(
            check_upload(ArtifactClass::Photo, "me.pdf", 10, MAX),
            Err(ArtifactError::DisallowedExtension { .. })
        ));
        assert!(matches!(
            check_upload(ArtifactClass::Photo, "me.gif", 10, MAX),
            Err(ArtifactError::DisallowedExtension { .. })
        ));
    }

    #[test]
    fn test_check_upload_document_allow_list() {
        for name in ["a.pdf", "a.doc", "a.docx", "a.jpg", "a.jpeg", "a.png"] {
            assert!(check_upload(ArtifactClass::Document, name, 10, MAX).is_ok(), "{}", name);
        }
        assert!(check_upload(ArtifactClass::Document, "a.exe", 10, MAX).is_err());
    }

    #[test]
    fn test_check_upload_size_limits() {
        assert_eq!(
            check_upload(ArtifactClass::Photo, "me.png", 0, MAX),
            Err(ArtifactError::Empty)
        );
        assert_eq!(
            check_upload(ArtifactClass::Photo, "me.png", MAX + 1, MAX),
            Err(ArtifactError::TooLarge { max_bytes: MAX })
        );
        assert!(check_upload(ArtifactClass::Photo, "me.png", MAX, MAX).is_ok());
    }

    #[test]
    fn test_artifact_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let name = artifact_file_name("APP0001", at, "3f9a1c02", "pdf");
        assert_eq!(name, format!("APP0001_{}_3f9a1c02.pdf", at.timestamp_millis()));
        assert!(name.starts_with("APP0001_"));
        assert!(is_safe_file_name(&name));
        assert_ne!(name, artifact_file_name("APP0001", at, "77b0e4d1", "pdf"));
    }

    #[test]
    fn test_is_safe_file_name() {
        assert!(is_safe_file_name("S0001_1700000000000.png"));
        assert!(!is_safe_file_name(""));
        assert!(!is_safe_file_name(".."));
        assert!(!is_safe_file_name("../etc/passwd"));
        assert!(!is_safe_file_name("a/b.png"));
        assert!(!is_safe_file_name("a\\b.png"));
        assert!(!is_safe_file_name(".hidden"));
    }

    #[test]
    fn test_artifact_state_distinguishes_missing_from_never_uploaded() {
        assert_eq!(
            ArtifactState::from_reference(None, |_| true),
            ArtifactState::NotUploaded
        );
        assert_eq!(
            ArtifactState::from_reference(Some("letters/APP0001_1.pdf"), |_| true),
            ArtifactState::Available {
                path: "letters/APP0001_1.pdf".to_string()
            }
        );
        assert_eq!(
            ArtifactState::from_reference(Some("letters/APP0001_1.pdf"), |_| false),
            ArtifactState::Missing {
                path: "letters/APP0001_1.pdf".to_string()
            }
        );
    }

    #[test]
    fn test_artifact_state_serializes_tagged() {
        let json = serde_json::to_value(ArtifactState::NotUploaded).unwrap();
        assert_eq!(json["state"], "not_uploaded");
    }
}
