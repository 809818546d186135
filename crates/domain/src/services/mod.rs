//! Domain services for the enrollment portal.
//!
//! Services contain the rules that operate on domain models. None of them
//! perform I/O.

pub mod curriculum;
pub mod enrollment;
pub mod otp;
pub mod review;

pub use curriculum::{select_subjects, CurriculumError, SubjectSelection, SubjectSelectionRequest};
pub use enrollment::{ContactRule, PersonalDetailsForm};
pub use otp::{begin_challenge, verify_challenge, OtpError, OtpPolicy};
pub use review::{ReviewDecision, ReviewRuleError};
