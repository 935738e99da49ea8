//! CommandChannel - Switch Command Distribution
//!
//! ## Responsibilities
//!
//! - SwitchCommand / ControlMessage wire shapes
//! - Per-session subscriber registry with fan-out
//!
//! Delivery is fire-and-forget: a decision is authoritative once its state
//! change is committed, so publish failures are reported but never undo
//! the switch. Redelivery is a downstream concern.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Floor for time-on-program before the output may switch again
pub const DEFAULT_MIN_DURATION_MS: i64 = 1500;

/// Program transition applied by the downstream media engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    Cut,
    Fade,
}

/// Switch decision emitted at most once per triggering tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCommand {
    pub timestamp_ms: i64,
    pub target_camera_id: i64,
    #[serde(default)]
    pub transition: Transition,
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: i64,
}

fn default_min_duration_ms() -> i64 {
    DEFAULT_MIN_DURATION_MS
}

impl SwitchCommand {
    /// Hard cut to a camera
    pub fn cut(timestamp_ms: i64, target_camera_id: i64, min_duration_ms: i64) -> Self {
        Self {
            timestamp_ms,
            target_camera_id,
            transition: Transition::Cut,
            min_duration_ms,
        }
    }
}

/// Control channel message envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    SwitchToCamera(SwitchCommand),
}

/// Session-scoped broadcast of serialized control messages.
///
/// Subscribers receive each command as one JSON string. A session with no
/// subscribers is a normal state, not an error.
pub struct CommandPublisher {
    topics: RwLock<HashMap<String, HashMap<Uuid, mpsc::UnboundedSender<String>>>>,
}

impl CommandPublisher {
    /// Create new publisher
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to a session's control channel
    pub async fn subscribe(&self, session_id: &str) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut topics = self.topics.write().await;
        topics
            .entry(session_id.to_string())
            .or_default()
            .insert(id, tx);

        tracing::info!(
            session_id = %session_id,
            subscriber_id = %id,
            "Control channel subscriber added"
        );

        (id, rx)
    }

    /// Remove a subscriber from a session's control channel
    pub async fn unsubscribe(&self, session_id: &str, id: &Uuid) {
        let mut topics = self.topics.write().await;
        if let Some(subscribers) = topics.get_mut(session_id) {
            if subscribers.remove(id).is_some() {
                tracing::info!(
                    session_id = %session_id,
                    subscriber_id = %id,
                    "Control channel subscriber removed"
                );
            }
            if subscribers.is_empty() {
                topics.remove(session_id);
            }
        }
    }

    /// Publish a switch command on a session's channel.
    ///
    /// Returns the number of subscribers the command was delivered to.
    /// Subscribers whose receiver is gone are pruned on the way.
    pub async fn publish(&self, session_id: &str, command: SwitchCommand) -> Result<usize> {
        let message = ControlMessage::SwitchToCamera(command);
        let json =
            serde_json::to_string(&message).map_err(|e| Error::PublishFailed(e.to_string()))?;

        let mut topics = self.topics.write().await;
        let Some(subscribers) = topics.get_mut(session_id) else {
            tracing::debug!(session_id = %session_id, "No control channel subscribers");
            return Ok(0);
        };

        let mut delivered = 0;
        subscribers.retain(|id, tx| match tx.send(json.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                tracing::warn!(
                    session_id = %session_id,
                    subscriber_id = %id,
                    "Dropping closed control channel subscriber"
                );
                false
            }
        });

        tracing::debug!(
            session_id = %session_id,
            delivered = delivered,
            "Switch command published"
        );

        Ok(delivered)
    }

    /// Number of live subscribers on a session's channel
    pub async fn subscriber_count(&self, session_id: &str) -> usize {
        self.topics
            .read()
            .await
            .get(session_id)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}

impl Default for CommandPublisher {
    fn default() -> Self {
        Self::new()
    }
}
