//! Enrollment application domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::artifact::ArtifactState;

/// Separator used when flattening subject lists for storage.
pub const SUBJECT_SEPARATOR: &str = ", ";

/// Review status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    /// Status line shown to the applicant.
    pub fn describe(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Your application is being reviewed.",
            ApplicationStatus::Approved => "Congratulations! Your application has been approved.",
            ApplicationStatus::Rejected => {
                "Your application was not successful. You may submit a new application."
            }
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("Unknown application status: {}", other)),
        }
    }
}

/// Year levels offered by the school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum YearLevel {
    #[serde(rename = "Year 9")]
    Year9,
    #[serde(rename = "Year 10")]
    Year10,
    #[serde(rename = "Year 11")]
    Year11,
    #[serde(rename = "Year 12")]
    Year12,
    #[serde(rename = "Year 13")]
    Year13,
}

/// Curriculum band a year level belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearBand {
    /// Fixed core plus two electives.
    Lower,
    /// Two core subjects plus a stream with three options.
    Upper,
}

impl YearLevel {
    pub const ALL: [YearLevel; 5] = [
        YearLevel::Year9,
        YearLevel::Year10,
        YearLevel::Year11,
        YearLevel::Year12,
        YearLevel::Year13,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            YearLevel::Year9 => "Year 9",
            YearLevel::Year10 => "Year 10",
            YearLevel::Year11 => "Year 11",
            YearLevel::Year12 => "Year 12",
            YearLevel::Year13 => "Year 13",
        }
    }

    pub fn band(&self) -> YearBand {
        match self {
            YearLevel::Year9 | YearLevel::Year10 => YearBand::Lower,
            _ => YearBand::Upper,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|y| y.label() == label)
    }
}

impl std::fmt::Display for YearLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Senior-school stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stream {
    Arts,
    Science,
}

impl Stream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Arts => "Arts",
            Stream::Science => "Science",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Arts" => Some(Stream::Arts),
            "Science" => Some(Stream::Science),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Personal details captured in the first enrollment step.
///
/// These are copied onto the application at submission, so later
/// account edits do not change what was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PersonalDetails {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub guardian_name: String,
    pub guardian_contact: String,
    pub address: String,
    /// Relative path of a photo uploaded with the form.
    pub photo_path: Option<String>,
}

/// A persisted enrollment application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Application {
    pub id: String,
    pub applicant_id: String,
    pub details: PersonalDetails,
    pub year_level: YearLevel,
    pub stream: Option<Stream>,
    pub subjects: Vec<String>,
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    pub offer_letter_path: Option<String>,
    pub reviewed_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

/// Values needed to insert a new application row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub applicant_id: String,
    pub details: PersonalDetails,
    pub year_level: YearLevel,
    pub stream: Option<Stream>,
    pub subjects: Vec<String>,
}

pub fn join_subjects(subjects: &[String]) -> String {
    subjects.join(SUBJECT_SEPARATOR)
}

/// Splits a stored subject string back into its ordered entries.
pub fn split_subjects(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Full application view returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicationResponse {
    pub id: String,
    pub applicant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub guardian_name: String,
    pub guardian_contact: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    pub year_level: YearLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<Stream>,
    pub subjects: Vec<String>,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub offer_letter: ArtifactState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

impl ApplicationResponse {
    pub fn new(application: Application, offer_letter: ArtifactState) -> Self {
        let Application {
            id,
            applicant_id,
            details,
            year_level,
            stream,
            subjects,
            status,
            rejection_reason,
            reviewed_by,
            decided_at,
            submitted_at,
            ..
        } = application;

        Self {
            id,
            applicant_id,
            first_name: details.first_name,
            last_name: details.last_name,
            date_of_birth: details.date_of_birth,
            guardian_name: details.guardian_name,
            guardian_contact: details.guardian_contact,
            address: details.address,
            photo_path: details.photo_path,
            year_level,
            stream,
            subjects,
            status,
            rejection_reason,
            offer_letter,
            reviewed_by,
            decided_at,
            submitted_at,
        }
    }
}

/// Row in the staff application listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicationListItem {
    pub id: String,
    pub applicant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub year_level: YearLevel,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
}

/// Listing filters supplied by staff.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicationListQuery {
    pub search: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Response for the staff application listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicationListResponse {
    pub data: Vec<ApplicationListItem>,
    pub pagination: shared::pagination::PageInfo,
}
