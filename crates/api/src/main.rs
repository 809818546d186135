use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use enrollment_portal_api::app::{create_app_with_state, AppState};
use enrollment_portal_api::config::Config;
use enrollment_portal_api::jobs::{JobScheduler, PoolMetricsJob, SessionCleanupJob};
use enrollment_portal_api::middleware;
use enrollment_portal_api::services::bootstrap::bootstrap_staff;
use enrollment_portal_api::services::email::{EmailService, Mailer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics()?;

    info!("Starting enrollment portal v{}", env!("CARGO_PKG_VERSION"));

    let db_config = persistence::db::DatabaseConfig::from(&config.database);
    let pool = persistence::db::create_pool(&db_config).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let addr = config.socket_addr()?;
    let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(config.email.clone()));
    let bootstrap = config.bootstrap.clone();
    let state = AppState::new(config, pool.clone(), mailer);

    if let Err(e) = bootstrap_staff(&state.accounts, &state.auth, &bootstrap).await {
        warn!(error = %e, "Staff bootstrap failed");
    }

    let mut scheduler = JobScheduler::new();
    scheduler.register(SessionCleanupJob::new(
        state.sessions.clone(),
        state.artifacts.clone(),
        state.rate_limiter.clone(),
    ));
    scheduler.register(PoolMetricsJob::new(pool));
    scheduler.start();

    let app = create_app_with_state(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler.shutdown();
    scheduler
        .wait_for_shutdown(Duration::from_secs(10))
        .await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
