//! Session snapshot persistence
//!
//! Optional MySQL mirror of session state. The in-memory store stays
//! authoritative; rows are snapshots used to pick sessions back up after a
//! restart.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE director_sessions (
//!     session_id        VARCHAR(64) PRIMARY KEY,
//!     profile_json      TEXT        NOT NULL,
//!     cursor            BIGINT      NOT NULL DEFAULT 0,
//!     current_camera    BIGINT      NULL,
//!     last_switch_at_ms BIGINT      NOT NULL DEFAULT 0,
//!     updated_at        DATETIME(3) NOT NULL
//! );
//! ```

use super::types::SessionState;
use crate::error::Result;
use crate::event_log::Cursor;
use crate::scoring::PreferenceProfile;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};

/// Load/save contract for session snapshots
#[async_trait]
pub trait SessionPersistence: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>>;
    async fn save(&self, state: &SessionState) -> Result<()>;
}

/// MySQL-backed snapshot repository
#[derive(Clone)]
pub struct SessionRepository {
    pool: MySqlPool,
}

impl SessionRepository {
    /// Create new repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionPersistence for SessionRepository {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        let row = sqlx::query(
            "SELECT session_id, profile_json, cursor, current_camera, last_switch_at_ms, updated_at \
             FROM director_sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let profile_json: String = row.get("profile_json");
        let profile: PreferenceProfile = serde_json::from_str(&profile_json)?;

        let cursor: i64 = row.get("cursor");
        let current_camera: Option<i64> = row.get("current_camera");
        let last_switch_at_ms: i64 = row.get("last_switch_at_ms");
        let updated_at: DateTime<Utc> = row.get("updated_at");

        Ok(Some(SessionState {
            session_id: row.get("session_id"),
            profile: profile.sanitized(),
            cursor: Cursor(cursor.max(0) as u64),
            current_camera,
            last_switch_at_ms,
            updated_at,
        }))
    }

    async fn save(&self, state: &SessionState) -> Result<()> {
        let profile_json = serde_json::to_string(&state.profile)?;

        sqlx::query(
            r#"
            INSERT INTO director_sessions
                (session_id, profile_json, cursor, current_camera, last_switch_at_ms, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                profile_json = VALUES(profile_json),
                cursor = VALUES(cursor),
                current_camera = VALUES(current_camera),
                last_switch_at_ms = VALUES(last_switch_at_ms),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(&state.session_id)
        .bind(&profile_json)
        .bind(state.cursor.0 as i64)
        .bind(state.current_camera)
        .bind(state.last_switch_at_ms)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
