//! Director - Per-Tick Camera Selection
//!
//! ## Responsibilities
//!
//! - Drain new events from the session log in bounded batches
//! - Score candidates and pick the winner
//! - Debounce switches so the program output does not flap
//! - Emit switch commands on the session's control channel
//!
//! There is no scheduler here: an external driver invokes [`Director::tick`]
//! per session at its own cadence (fixed interval, on log append, or replay).

use crate::command_channel::{CommandPublisher, SwitchCommand, DEFAULT_MIN_DURATION_MS};
use crate::error::Result;
use crate::event_log::EventLog;
use crate::scoring;
use crate::session_store::SessionStore;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Default bound on events consumed per tick
pub const DEFAULT_BATCH_CAP: usize = 50;

/// Decision loop tunables
#[derive(Debug, Clone, Copy)]
pub struct DirectorConfig {
    /// Max events consumed per tick
    pub batch_cap: usize,
    /// Minimum time on program before the output may switch again
    pub min_cut_interval_ms: i64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            batch_cap: DEFAULT_BATCH_CAP,
            min_cut_interval_ms: DEFAULT_MIN_DURATION_MS,
        }
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// No new events, or the winner is already on program
    Idle,
    /// A switch command was emitted
    Switched { camera_id: i64 },
    /// A different winner lost to the debounce window
    Suppressed,
}

/// Decision loop over log, session store, and control channel
pub struct Director {
    log: Arc<dyn EventLog>,
    sessions: Arc<SessionStore>,
    publisher: Arc<CommandPublisher>,
    config: DirectorConfig,
}

impl Director {
    /// Create new director
    pub fn new(
        log: Arc<dyn EventLog>,
        sessions: Arc<SessionStore>,
        publisher: Arc<CommandPublisher>,
        config: DirectorConfig,
    ) -> Self {
        Self {
            log,
            sessions,
            publisher,
            config,
        }
    }

    /// Run one decision tick for a session.
    ///
    /// The whole tick runs under the session's exclusive lock, so
    /// concurrent ticks for one session serialize while distinct sessions
    /// proceed independently. All state mutations happen with no await in
    /// between: a tick aborted mid-flight has either committed everything
    /// or nothing.
    pub async fn tick(&self, session_id: &str) -> Result<TickOutcome> {
        let entry = self.sessions.entry(session_id).await?;
        let mut state = entry.lock().await;

        let batch = self
            .log
            .read_new(session_id, state.cursor, self.config.batch_cap)
            .await?;

        if batch.events.is_empty() {
            tracing::trace!(session_id = %session_id, "Tick idle - no new events");
            return Ok(TickOutcome::Idle);
        }

        // Winner: strictly greatest score. Strict comparison keeps the
        // earliest event of the batch in the lead on ties.
        let mut best: Option<(i64, f64)> = None;
        for event in &batch.events {
            let event_score = scoring::score(&state.profile, event);
            if best.map_or(true, |(_, best_score)| event_score > best_score) {
                best = Some((event.camera_id, event_score));
            }
        }
        let Some((best_camera, best_score)) = best else {
            return Ok(TickOutcome::Idle);
        };

        // Events are consumed even when no switch results; they are never
        // re-scored on a later tick.
        state.cursor = batch.cursor;
        state.updated_at = Utc::now();

        let now_ms = Utc::now().timestamp_millis();

        if let Some(current) = state.current_camera {
            if best_camera == current {
                self.sessions.save(&state).await;
                tracing::debug!(
                    session_id = %session_id,
                    camera_id = current,
                    "Winner already on program"
                );
                return Ok(TickOutcome::Idle);
            }

            if now_ms - state.last_switch_at_ms < self.config.min_cut_interval_ms {
                self.sessions.save(&state).await;
                tracing::debug!(
                    session_id = %session_id,
                    current_camera = current,
                    candidate_camera = best_camera,
                    "Switch suppressed - debounce window still open"
                );
                return Ok(TickOutcome::Suppressed);
            }
        }

        state.current_camera = Some(best_camera);
        state.last_switch_at_ms = now_ms;
        self.sessions.save(&state).await;

        let command = SwitchCommand::cut(now_ms, best_camera, self.config.min_cut_interval_ms);
        if let Err(e) = self.publisher.publish(session_id, command).await {
            // state is committed; the decision stands and redelivery is a
            // downstream concern
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                "Switch command publish failed"
            );
        }

        tracing::info!(
            session_id = %session_id,
            camera_id = best_camera,
            score = best_score,
            "Program switched"
        );

        Ok(TickOutcome::Switched {
            camera_id: best_camera,
        })
    }
}
