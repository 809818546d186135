//! Server-side session payload.
//!
//! A session carries three independent namespaces: the authenticated
//! identity, an in-flight login challenge and the enrollment draft. Each
//! one is set and cleared on its own.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::account::AccountVariant;
use super::application::PersonalDetails;

/// A fully authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthenticatedIdentity {
    pub account_id: String,
    pub variant: AccountVariant,
    pub full_name: String,
    pub email: String,
    /// Stored photo or the variant default.
    pub photo: String,
    pub authenticated_at: DateTime<Utc>,
}

/// One-time code issued after a successful password check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PendingCredential {
    pub account_id: String,
    pub variant: AccountVariant,
    pub full_name: String,
    pub email: String,
    pub photo_path: Option<String>,
    /// SHA-256 of the code; the code itself is never stored.
    pub code_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub failed_attempts: u32,
}

impl PendingCredential {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Step-A bundle held between the two enrollment steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnrollmentDraft {
    pub details: PersonalDetails,
    pub saved_at: DateTime<Utc>,
}

impl EnrollmentDraft {
    pub fn new(details: PersonalDetails, now: DateTime<Utc>) -> Self {
        Self {
            details,
            saved_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now > self.saved_at + ttl
    }
}

/// Everything stored for one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<AuthenticatedIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<PendingCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<EnrollmentDraft>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self.identity.is_none() && self.challenge.is_none() && self.draft.is_none()
    }

    /// Returns the draft if it is still within its lifetime, dropping it otherwise.
    pub fn current_draft(&mut self, now: DateTime<Utc>, ttl: Duration) -> Option<&EnrollmentDraft> {
        self.take_expired_draft(now, ttl);
        self.draft.as_ref()
    }

    /// Removes and returns the draft if it has outlived `ttl`.
    pub fn take_expired_draft(
        &mut self,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Option<EnrollmentDraft> {
        if self.draft.as_ref().is_some_and(|d| d.is_expired(now, ttl)) {
            self.draft.take()
        } else {
            None
        }
    }

    /// Drops every namespace.
    pub fn clear(&mut self) {
        *self = SessionData::default();
    }

    pub fn status(&self) -> SessionStatus {
        if self.identity.is_some() {
            SessionStatus::Authenticated
        } else if self.challenge.is_some() {
            SessionStatus::Challenged
        } else {
            SessionStatus::Anonymous
        }
    }
}

/// Coarse login state reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Anonymous,
    Challenged,
    Authenticated,
}

/// Response for the session status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionStatusResponse {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<AuthenticatedIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_expires_at: Option<DateTime<Utc>>,
    pub has_draft: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn details() -> PersonalDetails {
        PersonalDetails {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2012, 5, 3).unwrap(),
            guardian_name: "John Doe".to_string(),
            guardian_contact: "9876543".to_string(),
            address: "1 Main Street".to_string(),
            photo_path: None,
        }
    }

    #[test]
    fn test_empty_session_is_anonymous() {
        let data = SessionData::default();
        assert!(data.is_empty());
        assert_eq!(data.status(), SessionStatus::Anonymous);
    }

    #[test]
    fn test_empty_session_serializes_to_empty_object() {
        let json = serde_json::to_string(&SessionData::default()).unwrap();
        assert_eq!(json, "{}");
        let parsed: SessionData = serde_json::from_str("{}").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_draft_expires_independently() {
        let now = Utc::now();
        let mut data = SessionData {
            draft: Some(EnrollmentDraft::new(details(), now - Duration::minutes(90))),
            ..Default::default()
        };

        assert!(data.current_draft(now, Duration::hours(2)).is_some());
        assert!(data.current_draft(now, Duration::hours(1)).is_none());
        assert!(data.draft.is_none());
    }

    #[test]
    fn test_take_expired_draft_hands_back_the_dropped_draft() {
        let now = Utc::now();
        let mut photographed = details();
        photographed.photo_path = Some("photos/applications/S0001_1_ab12cd34.png".to_string());
        let mut data = SessionData {
            draft: Some(EnrollmentDraft::new(photographed, now - Duration::minutes(90))),
            ..Default::default()
        };

        assert!(data.take_expired_draft(now, Duration::hours(2)).is_none());
        assert!(data.draft.is_some());

        let expired = data.take_expired_draft(now, Duration::hours(1)).unwrap();
        assert_eq!(
            expired.details.photo_path.as_deref(),
            Some("photos/applications/S0001_1_ab12cd34.png")
        );
        assert!(data.draft.is_none());
    }

    #[test]
    fn test_clear_drops_all_namespaces() {
        let now = Utc::now();
        let mut data = SessionData {
            draft: Some(EnrollmentDraft::new(details(), now)),
            identity: Some(AuthenticatedIdentity {
                account_id: "S0001".to_string(),
                variant: AccountVariant::Applicant,
                full_name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                photo: "assets/images/student_default.png".to_string(),
                authenticated_at: now,
            }),
            challenge: None,
        };
        assert_eq!(data.status(), SessionStatus::Authenticated);
        data.clear();
        assert!(data.is_empty());
    }
}
