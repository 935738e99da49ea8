//! EventLog - Append-Only Per-Session Sensor Log
//!
//! ## Responsibilities
//!
//! - SensorEvent shape (scores clamped at this boundary)
//! - Pull-based cursor contract for bounded forward reads
//! - InMemoryEventLog: embedded per-session append-only store
//!
//! The decision loop only reads through the [`EventLog`] trait, so the
//! backing transport can be polled, pushed, or replayed in tests.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Log position marker; `Cursor::start()` is before the first event.
///
/// Monotonically non-decreasing per session once handed to the decision
/// loop: events at or before the cursor are never delivered again.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cursor(pub u64);

impl Cursor {
    /// Position before the first event of any session log.
    pub fn start() -> Self {
        Self(0)
    }
}

/// Optional sub-signal carried by a sensor event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    #[serde(default)]
    pub score: f64,
}

/// One scored observation from an upstream capture process.
///
/// Immutable once appended. `sequence_id` is assigned by the log and is
/// strictly increasing within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorEvent {
    pub sequence_id: u64,
    pub camera_id: i64,
    pub motion_score: f64,
    pub sound_score: f64,
    pub gaze: Option<SignalScore>,
    pub gesture: Option<SignalScore>,
    pub recorded_at: DateTime<Utc>,
}

/// Append-side payload. Sensor producers are untrusted: missing fields
/// score 0, negative or non-finite scores are clamped on append.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub camera_id: i64,
    #[serde(default)]
    pub motion_score: f64,
    #[serde(default)]
    pub sound_score: f64,
    #[serde(default)]
    pub gaze: Option<SignalScore>,
    #[serde(default)]
    pub gesture: Option<SignalScore>,
}

/// Bounded forward read result.
#[derive(Debug, Clone)]
pub struct LogBatch {
    /// Events strictly after the requested cursor, in log order.
    pub events: Vec<SensorEvent>,
    /// Position after the last returned event; equals the requested
    /// cursor when no new events exist.
    pub cursor: Cursor,
}

/// Pull-based cursor contract over an ordered, append-only session log.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Read up to `max_count` events strictly after `cursor`, in log order.
    ///
    /// An empty read is a normal, frequent outcome, not an error. Transport
    /// failure surfaces as [`crate::Error::LogUnavailable`] and is never
    /// retried here.
    async fn read_new(
        &self,
        session_id: &str,
        cursor: Cursor,
        max_count: usize,
    ) -> Result<LogBatch>;
}

/// Per-session append-only storage
struct SessionLog {
    events: Vec<SensorEvent>,
    next_seq: u64,
}

impl SessionLog {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            next_seq: 1,
        }
    }
}

/// Embedded in-memory event log.
///
/// `append` is the boundary upstream capture processes push into when the
/// log lives in-process.
pub struct InMemoryEventLog {
    sessions: RwLock<HashMap<String, SessionLog>>,
}

impl InMemoryEventLog {
    /// Create new empty log
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Append one event, assigning its sequence id.
    pub async fn append(&self, session_id: &str, payload: EventPayload) -> u64 {
        let mut sessions = self.sessions.write().await;
        let log = sessions
            .entry(session_id.to_string())
            .or_insert_with(SessionLog::new);

        let sequence_id = log.next_seq;
        log.next_seq += 1;

        log.events.push(SensorEvent {
            sequence_id,
            camera_id: payload.camera_id,
            motion_score: clamp_score(payload.motion_score),
            sound_score: clamp_score(payload.sound_score),
            gaze: payload.gaze.map(|g| SignalScore {
                score: clamp_score(g.score),
            }),
            gesture: payload.gesture.map(|g| SignalScore {
                score: clamp_score(g.score),
            }),
            recorded_at: Utc::now(),
        });

        tracing::debug!(
            session_id = %session_id,
            sequence_id = sequence_id,
            camera_id = payload.camera_id,
            "Sensor event appended"
        );

        sequence_id
    }

    /// Number of events appended for a session
    pub async fn len(&self, session_id: &str) -> usize {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|log| log.events.len())
            .unwrap_or(0)
    }

    /// Number of sessions with at least one appended event
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn read_new(
        &self,
        session_id: &str,
        cursor: Cursor,
        max_count: usize,
    ) -> Result<LogBatch> {
        let sessions = self.sessions.read().await;
        let Some(log) = sessions.get(session_id) else {
            return Ok(LogBatch {
                events: Vec::new(),
                cursor,
            });
        };

        // events is in sequence order; skip everything already consumed
        let start = log.events.partition_point(|e| e.sequence_id <= cursor.0);
        let events: Vec<SensorEvent> = log.events[start..]
            .iter()
            .take(max_count)
            .cloned()
            .collect();

        let cursor = events
            .last()
            .map(|e| Cursor(e.sequence_id))
            .unwrap_or(cursor);

        Ok(LogBatch { events, cursor })
    }
}

/// Clamp an untrusted score to a non-negative finite value
fn clamp_score(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}
