//! WebAPI - HTTP Boundary of the Director Core
//!
//! ## Responsibilities
//!
//! - Preference upsert and session state views
//! - The externally driven tick endpoint
//! - Event append boundary for the embedded log
//! - WebSocket subscription to per-session control channels
//!
//! Camera/destination/recording administration is a separate collaborator;
//! nothing here validates camera ids against an inventory.

mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_sessions: state.sessions.session_count().await,
        persistence_enabled: state.config.database_url.is_some(),
    };

    Json(response)
}
