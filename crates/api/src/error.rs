use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::artifact::ArtifactError;
use domain::services::{CurriculumError, OtpError, ReviewRuleError};
use serde::Serialize;
use thiserror::Error;

/// Message shown for every internal failure. Details go to the log only.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<ValidationDetail>,
    },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    /// Validation failure without field-level details.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Validation failure attached to one form field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::Validation {
            details: vec![ValidationDetail {
                field: field.into(),
                message: message.clone(),
            }],
            message,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                (!details.is_empty()).then_some(details),
            ),
            ApiError::InvalidTransition(msg) => {
                (StatusCode::CONFLICT, "invalid_transition", msg, None)
            }
            ApiError::Upload(msg) => (StatusCode::BAD_REQUEST, "upload_error", msg, None),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
                None,
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    GENERIC_FAILURE_MESSAGE.into(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation { message, details }
    }
}

impl From<Vec<CurriculumError>> for ApiError {
    fn from(errors: Vec<CurriculumError>) -> Self {
        let details: Vec<ValidationDetail> = errors
            .iter()
            .map(|e| ValidationDetail {
                field: e.field().to_string(),
                message: e.to_string(),
            })
            .collect();

        let message = match details.as_slice() {
            [only] => only.message.clone(),
            _ => format!("{} validation errors", details.len()),
        };

        ApiError::Validation { message, details }
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::MissingCode => ApiError::field("code", err.to_string()),
            OtpError::InvalidCode { remaining_attempts } => ApiError::Unauthorized(format!(
                "{} ({} attempt{} remaining)",
                err,
                remaining_attempts,
                if remaining_attempts == 1 { "" } else { "s" }
            )),
            OtpError::NoChallenge | OtpError::Expired | OtpError::TooManyAttempts => {
                ApiError::Unauthorized(err.to_string())
            }
        }
    }
}

impl From<ReviewRuleError> for ApiError {
    fn from(err: ReviewRuleError) -> Self {
        match err {
            ReviewRuleError::MissingReason => ApiError::field("reason", err.to_string()),
            ReviewRuleError::AlreadyDecided { .. } | ReviewRuleError::OfferLetterNotAllowed { .. } => {
                ApiError::InvalidTransition(err.to_string())
            }
        }
    }
}

impl From<ArtifactError> for ApiError {
    fn from(err: ArtifactError) -> Self {
        ApiError::Upload(err.to_string())
    }
}
