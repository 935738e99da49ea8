//! Application state
//!
//! Holds all shared components and configuration

use crate::command_channel::{CommandPublisher, DEFAULT_MIN_DURATION_MS};
use crate::director::{Director, DirectorConfig, DEFAULT_BATCH_CAP};
use crate::event_log::InMemoryEventLog;
use crate::session_store::SessionStore;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Optional MySQL mirror for session snapshots
    pub database_url: Option<String>,
    /// Max events consumed per tick
    pub batch_cap: usize,
    /// Debounce window between switches
    pub min_cut_interval_ms: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_url: std::env::var("DATABASE_URL").ok(),
            batch_cap: std::env::var("BATCH_CAP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BATCH_CAP),
            min_cut_interval_ms: std::env::var("MIN_CUT_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MIN_DURATION_MS),
        }
    }
}

impl AppConfig {
    /// Decision loop tunables derived from this config
    pub fn director_config(&self) -> DirectorConfig {
        DirectorConfig {
            batch_cap: self.batch_cap,
            min_cut_interval_ms: self.min_cut_interval_ms,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Embedded append-only sensor event log
    pub event_log: Arc<InMemoryEventLog>,
    /// Keyed session state store
    pub sessions: Arc<SessionStore>,
    /// Session-scoped control channels
    pub publisher: Arc<CommandPublisher>,
    /// Decision loop
    pub director: Arc<Director>,
}
