//! Review decisions on applications.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::application::ApplicationStatus;

/// A reviewer's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
}

impl ReviewDecision {
    pub fn target_status(&self) -> ApplicationStatus {
        match self {
            ReviewDecision::Approve => ApplicationStatus::Approved,
            ReviewDecision::Reject { .. } => ApplicationStatus::Rejected,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ReviewDecision::Approve => None,
            ReviewDecision::Reject { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewRuleError {
    #[error("A reason is required to reject an application")]
    MissingReason,

    #[error("Application is already {current}")]
    AlreadyDecided { current: ApplicationStatus },

    #[error("An offer letter can only be attached to an approved application (current status: {current})")]
    OfferLetterNotAllowed { current: ApplicationStatus },
}

/// Builds a rejection, trimming the reason and refusing a blank one.
pub fn rejection(reason: &str) -> Result<ReviewDecision, ReviewRuleError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ReviewRuleError::MissingReason);
    }
    Ok(ReviewDecision::Reject {
        reason: reason.to_string(),
    })
}

/// Only pending applications accept a decision.
pub fn ensure_decidable(current: ApplicationStatus) -> Result<(), ReviewRuleError> {
    match current {
        ApplicationStatus::Pending => Ok(()),
        current => Err(ReviewRuleError::AlreadyDecided { current }),
    }
}

/// Offer letters are only attached to approved applications.
pub fn ensure_offer_letter_allowed(current: ApplicationStatus) -> Result<(), ReviewRuleError> {
    match current {
        ApplicationStatus::Approved => Ok(()),
        current => Err(ReviewRuleError::OfferLetterNotAllowed { current }),
    }
}

/// Whether an applicant whose latest application has `latest` may start a new one.
pub fn may_start_application(latest: Option<ApplicationStatus>) -> bool {
    matches!(latest, None | Some(ApplicationStatus::Rejected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_requires_reason() {
        assert_eq!(rejection(""), Err(ReviewRuleError::MissingReason));
        assert_eq!(rejection("   "), Err(ReviewRuleError::MissingReason));
        assert_eq!(
            rejection("  Incomplete documents "),
            Ok(ReviewDecision::Reject {
                reason: "Incomplete documents".to_string()
            })
        );
    }

    #[test]
    fn test_decision_targets() {
        assert_eq!(
            ReviewDecision::Approve.target_status(),
            ApplicationStatus::Approved
        );
        assert_eq!(ReviewDecision::Approve.reason(), None);
        let reject = rejection("No space").unwrap();
        assert_eq!(reject.target_status(), ApplicationStatus::Rejected);
        assert_eq!(reject.reason(), Some("No space"));
    }

    #[test]
    fn test_only_pending_is_decidable() {
        assert!(ensure_decidable(ApplicationStatus::Pending).is_ok());
        assert_eq!(
            ensure_decidable(ApplicationStatus::Approved),
            Err(ReviewRuleError::AlreadyDecided {
                current: ApplicationStatus::Approved
            })
        );
        assert!(ensure_decidable(ApplicationStatus::Rejected).is_err());
    }

    #[test]
    fn test_offer_letter_needs_approval() {
        assert!(ensure_offer_letter_allowed(ApplicationStatus::Approved).is_ok());
        assert!(ensure_offer_letter_allowed(ApplicationStatus::Pending).is_err());
        assert!(ensure_offer_letter_allowed(ApplicationStatus::Rejected).is_err());
    }

    #[test]
    fn test_may_start_application() {
        assert!(may_start_application(None));
        assert!(may_start_application(Some(ApplicationStatus::Rejected)));
        assert!(!may_start_application(Some(ApplicationStatus::Pending)));
        assert!(!may_start_application(Some(ApplicationStatus::Approved)));
    }
}
