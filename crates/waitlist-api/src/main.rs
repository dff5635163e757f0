//! Waitlist draw service API server entry point.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use waitlist_api::config::AppConfig;
use waitlist_api::error::AppError;
use waitlist_api::state::AppState;
use waitlist_core::event::{SystemClock, TracingNotifier};
use waitlist_core::retry::RetryingGateway;
use waitlist_core::rng::SystemRng;
use waitlist_store::PgPersistenceGateway;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting waitlist draw API server");

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    let store = PgPersistenceGateway::new(pool);
    store.ensure_schema().await?;
    let gateway = Arc::new(RetryingGateway::new(store, config.retry_policy()));
    let app_state = AppState::new(
        gateway,
        Arc::new(SystemClock),
        Arc::new(Mutex::new(SystemRng::from_os_entropy())),
        Arc::new(TracingNotifier),
    );

    // TODO: Replace CorsLayer::permissive() with the organizer console origin once it is deployed.
    let app = waitlist_api::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
