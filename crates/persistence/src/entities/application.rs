//! Application entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::application::{split_subjects, ApplicationListItem};
use domain::models::{Application, ApplicationStatus, PersonalDetails, Stream, YearLevel};
use sqlx::FromRow;

/// Database enum for application status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
pub enum ApplicationStatusDb {
    Pending,
    Approved,
    Rejected,
}

impl From<ApplicationStatusDb> for ApplicationStatus {
    fn from(status: ApplicationStatusDb) -> Self {
        match status {
            ApplicationStatusDb::Pending => ApplicationStatus::Pending,
            ApplicationStatusDb::Approved => ApplicationStatus::Approved,
            ApplicationStatusDb::Rejected => ApplicationStatus::Rejected,
        }
    }
}

impl From<ApplicationStatus> for ApplicationStatusDb {
    fn from(status: ApplicationStatus) -> Self {
        match status {
            ApplicationStatus::Pending => ApplicationStatusDb::Pending,
            ApplicationStatus::Approved => ApplicationStatusDb::Approved,
            ApplicationStatus::Rejected => ApplicationStatusDb::Rejected,
        }
    }
}

/// Database enum for year levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "year_level")]
pub enum YearLevelDb {
    #[sqlx(rename = "Year 9")]
    Year9,
    #[sqlx(rename = "Year 10")]
    Year10,
    #[sqlx(rename = "Year 11")]
    Year11,
    #[sqlx(rename = "Year 12")]
    Year12,
    #[sqlx(rename = "Year 13")]
    Year13,
}

impl From<YearLevelDb> for YearLevel {
    fn from(level: YearLevelDb) -> Self {
        match level {
            YearLevelDb::Year9 => YearLevel::Year9,
            YearLevelDb::Year10 => YearLevel::Year10,
            YearLevelDb::Year11 => YearLevel::Year11,
            YearLevelDb::Year12 => YearLevel::Year12,
            YearLevelDb::Year13 => YearLevel::Year13,
        }
    }
}

impl From<YearLevel> for YearLevelDb {
    fn from(level: YearLevel) -> Self {
        match level {
            YearLevel::Year9 => YearLevelDb::Year9,
            YearLevel::Year10 => YearLevelDb::Year10,
            YearLevel::Year11 => YearLevelDb::Year11,
            YearLevel::Year12 => YearLevelDb::Year12,
            YearLevel::Year13 => YearLevelDb::Year13,
        }
    }
}

/// Database enum for senior streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "application_stream")]
pub enum StreamDb {
    Arts,
    Science,
}

impl From<StreamDb> for Stream {
    fn from(stream: StreamDb) -> Self {
        match stream {
            StreamDb::Arts => Stream::Arts,
            StreamDb::Science => Stream::Science,
        }
    }
}

impl From<Stream> for StreamDb {
    fn from(stream: Stream) -> Self {
        match stream {
            Stream::Arts => StreamDb::Arts,
            Stream::Science => StreamDb::Science,
        }
    }
}

/// Database row mapping for the applications table.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationEntity {
    pub application_id: String,
    pub applicant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub guardian_name: String,
    pub guardian_contact: String,
    pub address: String,
    pub photo_path: Option<String>,
    pub year_level: YearLevelDb,
    pub stream: Option<StreamDb>,
    pub subjects: String,
    pub status: ApplicationStatusDb,
    pub rejection_reason: Option<String>,
    pub offer_letter_path: Option<String>,
    pub reviewed_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

impl From<ApplicationEntity> for Application {
    fn from(entity: ApplicationEntity) -> Self {
        Self {
            id: entity.application_id,
            applicant_id: entity.applicant_id,
            details: PersonalDetails {
                first_name: entity.first_name,
                last_name: entity.last_name,
                date_of_birth: entity.date_of_birth,
                guardian_name: entity.guardian_name,
                guardian_contact: entity.guardian_contact,
                address: entity.address,
                photo_path: entity.photo_path,
            },
            year_level: entity.year_level.into(),
            stream: entity.stream.map(Into::into),
            subjects: split_subjects(&entity.subjects),
            status: entity.status.into(),
            rejection_reason: entity.rejection_reason,
            offer_letter_path: entity.offer_letter_path,
            reviewed_by: entity.reviewed_by,
            decided_at: entity.decided_at,
            submitted_at: entity.submitted_at,
        }
    }
}

/// Application joined with the owning applicant account.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationWithApplicantEntity {
    #[sqlx(flatten)]
    pub application: ApplicationEntity,
    pub applicant_name: String,
    pub applicant_email: String,
}

/// Row for the staff application listing.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationListEntity {
    pub application_id: String,
    pub applicant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub year_level: YearLevelDb,
    pub status: ApplicationStatusDb,
    pub submitted_at: DateTime<Utc>,
}

impl From<ApplicationListEntity> for ApplicationListItem {
    fn from(entity: ApplicationListEntity) -> Self {
        Self {
            id: entity.application_id,
            applicant_id: entity.applicant_id,
            first_name: entity.first_name,
            last_name: entity.last_name,
            year_level: entity.year_level.into(),
            status: entity.status.into(),
            submitted_at: entity.submitted_at,
        }
    }
}

/// Aggregated status counts.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ApplicationCountsEntity {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}
