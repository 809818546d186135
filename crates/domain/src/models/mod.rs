//! Domain models for the enrollment portal.

pub mod account;
pub mod application;
pub mod artifact;
pub mod dashboard;
pub mod identifier;
pub mod session;

pub use account::{Account, AccountVariant};
pub use application::{Application, ApplicationStatus, PersonalDetails, Stream, YearLevel};
pub use artifact::{ArtifactClass, ArtifactState};
pub use identifier::IdNamespace;
pub use session::{AuthenticatedIdentity, EnrollmentDraft, PendingCredential, SessionData};
