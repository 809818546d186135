//! Application services and external integrations.

pub mod artifacts;
pub mod auth;
pub mod bootstrap;
pub mod chat;
pub mod cookies;
pub mod email;
pub mod enrollment;
pub mod review;
pub mod sessions;
pub mod weather;

pub use artifacts::ArtifactStore;
pub use auth::AuthService;
pub use chat::ChatService;
pub use enrollment::EnrollmentService;
pub use review::ReviewService;
pub use sessions::SessionStore;
pub use weather::WeatherService;
