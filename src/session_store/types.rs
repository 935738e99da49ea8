//! Session state types

use crate::event_log::Cursor;
use crate::scoring::PreferenceProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-session director state.
///
/// Created on first profile-set or first tick for an unseen session id and
/// never deleted by this core (session teardown belongs to the
/// administration collaborator). Mutated only under the session's
/// exclusive lock.
///
/// Invariants: `cursor` and `last_switch_at_ms` are non-decreasing;
/// `current_camera` stays `None` until the first successful switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub profile: PreferenceProfile,
    /// Position of the last consumed log event
    pub cursor: Cursor,
    pub current_camera: Option<i64>,
    /// Milliseconds since the epoch of the last emitted switch; 0 before
    /// the first switch
    pub last_switch_at_ms: i64,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    /// Fresh state for a previously unseen session id
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            profile: PreferenceProfile::default(),
            cursor: Cursor::start(),
            current_camera: None,
            last_switch_at_ms: 0,
            updated_at: Utc::now(),
        }
    }
}
