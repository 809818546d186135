//! Custom Axum extractors.

pub mod multipart;
pub mod session;

pub use multipart::MultipartForm;
pub use session::{require_identity, AccountAuth, ApplicantAuth, StaffAuth};
