//! Database entity definitions.

pub mod account;
pub mod application;
pub mod session;

pub use account::{AccountEntity, ApplicantWithLatestApplicationEntity};
pub use application::{
    ApplicationCountsEntity, ApplicationEntity, ApplicationListEntity, ApplicationStatusDb,
    ApplicationWithApplicantEntity, StreamDb, YearLevelDb,
};
pub use session::SessionEntity;
