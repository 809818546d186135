//! Multipart form reading for upload endpoints.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::services::artifacts::UploadedFile;

/// Text fields plus at most one file from a multipart body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    /// Reads every part. Only the part named `file_field` is kept as a file;
    /// a file part with no name and no content counts as "no file chosen".
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Upload(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == file_field {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Upload(e.body_text()))?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.file = Some(UploadedFile { file_name, bytes });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Takes a text field, defaulting to an empty string so validation reports it.
    pub fn take(&mut self, name: &str) -> String {
        self.fields.remove(name).unwrap_or_default()
    }

    /// The file, or a field error naming `file_field`.
    pub fn require_file(&mut self, file_field: &str) -> Result<UploadedFile, ApiError> {
        self.file
            .take()
            .ok_or_else(|| ApiError::field(file_field, "Please choose a file to upload"))
    }
}
