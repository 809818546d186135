use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{ContactRule, OtpPolicy};
use persistence::repositories::{AccountRepository, ApplicationRepository, SessionRepository};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{account, applicant, auth, chat, health, staff};
use crate::services::email::Mailer;
use crate::services::{
    ArtifactStore, AuthService, ChatService, EnrollmentService, ReviewService, SessionStore,
    WeatherService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub accounts: AccountRepository,
    pub sessions: SessionStore,
    pub artifacts: ArtifactStore,
    pub auth: AuthService,
    pub enrollment: EnrollmentService,
    pub review: ReviewService,
    pub chat: ChatService,
    pub weather: WeatherService,
}

impl AppState {
    /// Wires every service from configuration, delivering mail through `mailer`.
    pub fn new(config: Config, pool: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        let config = Arc::new(config);

        let accounts = AccountRepository::new(pool.clone());
        let applications = ApplicationRepository::new(pool.clone());
        let sessions = SessionStore::new(SessionRepository::new(pool.clone()), &config.session);
        let artifacts = ArtifactStore::new(&config.uploads);

        let auth = AuthService::new(
            accounts.clone(),
            mailer,
            OtpPolicy {
                ttl: chrono::Duration::seconds(config.otp.ttl_secs),
                max_attempts: config.otp.max_attempts,
            },
            config.email.school_name.clone(),
            config.registration.staff_registration_enabled,
        );

        let enrollment = EnrollmentService::new(
            applications.clone(),
            accounts.clone(),
            artifacts.clone(),
            ContactRule {
                min_digits: config.enrollment.guardian_contact_min_digits,
                max_digits: config.enrollment.guardian_contact_max_digits,
            },
            config.enrollment.open_levels(),
            sessions.draft_ttl(),
        );

        let review = ReviewService::new(applications, accounts.clone(), artifacts.clone());

        Self {
            rate_limiter: RateLimiterState::new(
                config.security.auth_rate_limit_per_minute,
                config.security.trust_forwarded_for,
            )
            .map(Arc::new),
            chat: ChatService::new(&config.chat),
            weather: WeatherService::new(config.weather.clone()),
            pool,
            accounts,
            sessions,
            artifacts,
            auth,
            enrollment,
            review,
            config,
        }
    }
}

/// Builds the router with a caller-supplied mailer.
pub fn create_app_with_mailer(config: Config, pool: PgPool, mailer: Arc<dyn Mailer>) -> Router {
    create_app_with_state(AppState::new(config, pool, mailer))
}

pub fn create_app_with_state(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Cookies need an explicit origin list.
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    // Password and code checks are rate limited per client.
    let credential_routes = Router::new()
        .route("/api/v1/auth/:variant/login", post(auth::login))
        .route("/api/v1/auth/verify", post(auth::verify))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let auth_routes = Router::new()
        .route("/api/v1/auth/:variant/register", post(auth::register))
        .route("/api/v1/auth/session", get(auth::session_status))
        .route("/api/v1/auth/logout", post(auth::logout))
        .merge(credential_routes);

    let account_routes = Router::new()
        .route("/api/v1/me", get(account::me))
        .route("/api/v1/me/photo", post(account::upload_photo))
        .route(
            "/api/v1/photos/:kind/:filename",
            get(account::download_photo),
        );

    let applicant_routes = Router::new()
        .route("/api/v1/applicant/dashboard", get(applicant::dashboard))
        .route(
            "/api/v1/applicant/application/personal",
            post(applicant::save_personal_details),
        )
        .route("/api/v1/applicant/application/draft", get(applicant::draft))
        .route(
            "/api/v1/applicant/application/subjects",
            post(applicant::submit_subjects),
        )
        .route(
            "/api/v1/applicant/application/offer-letter",
            get(applicant::download_offer_letter),
        )
        .route("/api/v1/curriculum", get(applicant::curriculum));

    let staff_routes = Router::new()
        .route("/api/v1/staff/dashboard", get(staff::dashboard))
        .route("/api/v1/staff/applications", get(staff::list_applications))
        .route(
            "/api/v1/staff/applications/:app_id",
            get(staff::get_application),
        )
        .route(
            "/api/v1/staff/applications/:app_id/approve",
            post(staff::approve),
        )
        .route(
            "/api/v1/staff/applications/:app_id/reject",
            post(staff::reject),
        )
        .route(
            "/api/v1/staff/applications/:app_id/offer-letter",
            post(staff::upload_offer_letter).get(staff::download_offer_letter),
        )
        .route(
            "/api/v1/staff/applicants/search",
            get(staff::search_applicants),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/chat", post(chat::chat))
        .route("/api/v1/weather/today", get(chat::weather_today));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(account_routes)
        .merge(applicant_routes)
        .merge(staff_routes)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            config.security.hsts_enabled,
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
