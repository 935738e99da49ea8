//! Director Core - live multi-camera program director
//!
//! Main entry point.

use director_core::{
    command_channel::CommandPublisher,
    director::Director,
    event_log::InMemoryEventLog,
    session_store::{SessionRepository, SessionStore},
    state::{AppConfig, AppState},
    web_api,
};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "director_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting director core v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        host = %config.host,
        port = config.port,
        batch_cap = config.batch_cap,
        min_cut_interval_ms = config.min_cut_interval_ms,
        persistence = config.database_url.is_some(),
        "Configuration loaded"
    );

    // Session store, with an optional MySQL snapshot mirror
    let sessions = match &config.database_url {
        Some(url) => {
            let pool = MySqlPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(10))
                .connect(url)
                .await?;
            tracing::info!("Session persistence connected");
            Arc::new(SessionStore::with_persistence(Arc::new(
                SessionRepository::new(pool),
            )))
        }
        None => {
            tracing::info!("Session persistence disabled (DATABASE_URL not set)");
            Arc::new(SessionStore::new())
        }
    };

    // Initialize components
    let event_log = Arc::new(InMemoryEventLog::new());
    let publisher = Arc::new(CommandPublisher::new());
    let director = Arc::new(Director::new(
        event_log.clone(),
        sessions.clone(),
        publisher.clone(),
        config.director_config(),
    ));
    tracing::info!("Director initialized - ticks are externally driven");

    // Create application state
    let state = AppState {
        config,
        event_log,
        sessions,
        publisher,
        director,
    };

    let app = web_api::create_router(state.clone())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
