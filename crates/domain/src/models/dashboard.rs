//! Dashboard and search summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::application::{ApplicationStatus, YearLevel};
use super::artifact::ArtifactState;

/// Application counts shown on the staff dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicationCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// Staff dashboard payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StaffDashboard {
    pub staff_id: String,
    pub full_name: String,
    pub counts: ApplicationCounts,
}

/// The applicant's most recent application, as shown on their dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CurrentApplication {
    pub id: String,
    pub year_level: YearLevel,
    pub subjects: Vec<String>,
    pub status: ApplicationStatus,
    pub status_text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub offer_letter: ArtifactState,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

/// Applicant dashboard payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicantDashboard {
    pub applicant_id: String,
    pub full_name: String,
    pub email: String,
    pub photo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<CurrentApplication>,
    pub can_apply: bool,
}

/// Latest application summary attached to an applicant search hit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LatestApplicationSummary {
    pub id: String,
    pub year_level: YearLevel,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
}

/// One applicant search hit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicantSearchResult {
    pub applicant_id: String,
    pub full_name: String,
    pub email: String,
    pub photo: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_application: Option<LatestApplicationSummary>,
}

/// Query for the applicant search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicantSearchQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}
