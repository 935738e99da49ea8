//! SessionStore - Keyed Session State
//!
//! ## Responsibilities
//!
//! - Per-session state records (profile, cursor, current camera)
//! - One exclusive lock per session id: ticks for the same session
//!   serialize, unrelated sessions never contend
//! - Optional persistence mirror behind [`SessionPersistence`]

mod repository;
mod types;

pub use repository::{SessionPersistence, SessionRepository};
pub use types::SessionState;

use crate::error::{Error, Result};
use crate::scoring::PreferenceProfile;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Keyed, independently lockable session state store
pub struct SessionStore {
    entries: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
    persistence: Option<Arc<dyn SessionPersistence>>,
}

impl SessionStore {
    /// Create new in-memory store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            persistence: None,
        }
    }

    /// Create store with a persistence mirror
    pub fn with_persistence(persistence: Arc<dyn SessionPersistence>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            persistence: Some(persistence),
        }
    }

    /// Get the lockable entry for a session, creating it on first use.
    ///
    /// A previously unseen id starts from the default profile and the log
    /// start, unless a persisted snapshot exists.
    pub async fn entry(&self, session_id: &str) -> Result<Arc<Mutex<SessionState>>> {
        // fast path under the read lock
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(session_id) {
                return Ok(entry.clone());
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(session_id) {
            return Ok(entry.clone());
        }

        let state = match &self.persistence {
            Some(persistence) => match persistence.load(session_id).await {
                Ok(Some(state)) => {
                    tracing::info!(
                        session_id = %session_id,
                        cursor = state.cursor.0,
                        "Session state restored from persistence"
                    );
                    state
                }
                Ok(None) => SessionState::new(session_id),
                Err(e) => {
                    tracing::error!(
                        session_id = %session_id,
                        error = %e,
                        "Session snapshot load failed, starting fresh"
                    );
                    SessionState::new(session_id)
                }
            },
            None => SessionState::new(session_id),
        };

        let entry = Arc::new(Mutex::new(state));
        entries.insert(session_id.to_string(), entry.clone());
        Ok(entry)
    }

    /// Idempotent profile upsert; creates the session if absent.
    ///
    /// The new profile becomes visible on the session's next tick. An
    /// in-flight tick holding the session lock finishes with the old
    /// profile first (last write wins).
    pub async fn set_profile(
        &self,
        session_id: &str,
        profile: PreferenceProfile,
    ) -> Result<SessionState> {
        if session_id.is_empty() || session_id.len() > 64 {
            return Err(Error::Validation(
                "session_id must be 1-64 characters".to_string(),
            ));
        }

        let entry = self.entry(session_id).await?;
        let mut state = entry.lock().await;
        state.profile = profile.sanitized();
        state.updated_at = Utc::now();
        let snapshot = state.clone();
        drop(state);

        self.save(&snapshot).await;
        tracing::info!(session_id = %session_id, "Preference profile updated");
        Ok(snapshot)
    }

    /// Snapshot of one session's state, if the session is known
    pub async fn get(&self, session_id: &str) -> Option<SessionState> {
        let entry = {
            let entries = self.entries.read().await;
            entries.get(session_id)?.clone()
        };
        let state = entry.lock().await;
        Some(state.clone())
    }

    /// Number of known sessions
    pub async fn session_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Mirror a committed state to the persistence backing, if configured.
    ///
    /// The in-memory record is authoritative; a failed save is logged and
    /// never fails the tick that produced it.
    pub async fn save(&self, state: &SessionState) {
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save(state).await {
                tracing::error!(
                    session_id = %state.session_id,
                    error = %e,
                    "Session snapshot save failed"
                );
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
