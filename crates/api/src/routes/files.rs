//! Streaming of stored artifacts.

use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::warn;

use crate::error::ApiError;
use crate::services::ArtifactStore;

/// Streams the file behind `reference` with a guessed content type.
///
/// When `download_name` is set the response asks the client to save the
/// file under that name.
pub async fn stream_artifact(
    artifacts: &ArtifactStore,
    reference: &str,
    download_name: Option<&str>,
) -> Result<Response, ApiError> {
    let path = artifacts
        .resolve(reference)
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(reference = %reference, "Stored file is missing");
            return Err(ApiError::NotFound("File not found".to_string()));
        }
        Err(e) => return Err(ApiError::Internal(format!("Failed to open artifact: {}", e))),
    };
    let length = file.metadata().await.ok().map(|m| m.len());

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(mime.essence_str()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    if let Some(name) = download_name {
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name)) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    Ok(response)
}

/// Last path segment of a stored reference.
pub fn file_name_of(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadsConfig;
    use axum::http::StatusCode;

    fn store(root: &std::path::Path) -> ArtifactStore {
        ArtifactStore::new(&UploadsConfig {
            root_dir: root.to_string_lossy().to_string(),
            ..UploadsConfig::default()
        })
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of("documents/offer_letters/APP0001_1.pdf"), "APP0001_1.pdf");
        assert_eq!(file_name_of("plain.pdf"), "plain.pdf");
    }

    #[tokio::test]
    async fn test_streams_existing_file_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("documents")).unwrap();
        std::fs::write(dir.path().join("documents/APP0001_1.pdf"), b"%PDF-1.4").unwrap();

        let response = stream_artifact(
            &store(dir.path()),
            "documents/APP0001_1.pdf",
            Some("APP0001_1.pdf"),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "8");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"APP0001_1.pdf\""
        );
    }

    #[tokio::test]
    async fn test_missing_or_unsafe_reference_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = store(dir.path());

        let result = stream_artifact(&artifacts, "documents/none.pdf", None).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        let result = stream_artifact(&artifacts, "../etc/passwd", None).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
