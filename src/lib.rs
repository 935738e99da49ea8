//! Director Core
//!
//! Real-time program director for live multi-camera production sessions.
//!
//! ## Architecture (5 Components)
//!
//! 1. Scoring - weighted desirability of sensor events
//! 2. EventLog - append-only per-session sensor log with cursor reads
//! 3. SessionStore - per-session state, one exclusive lock per session
//! 4. Director - per-tick decision loop with switch debounce
//! 5. CommandChannel - session-scoped switch command distribution
//!
//! ## Design Principles
//!
//! - Ticks are externally driven; the core owns no scheduler loop
//! - Ticks for one session serialize; distinct sessions never contend
//! - Events are consumed at most once per session (cursor is monotonic)

pub mod command_channel;
pub mod director;
pub mod error;
pub mod event_log;
pub mod models;
pub mod scoring;
pub mod session_store;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
