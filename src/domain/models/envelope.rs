//! Inter-agent message envelopes.
//!
//! The seven envelope kinds are the only message vocabulary between the
//! engine and its collaborators. Envelopes are append-only once emitted;
//! the stream per task is owned by the `LifecycleTracker`, which assigns
//! the sequence numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task_state::TaskState;

/// Message type vocabulary. Unknown kinds are rejected at decode, not
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvelopeKind {
    TaskRequest,
    TaskResponse,
    StatusUpdate,
    Error,
    Ack,
    RollbackRequest,
    Cancel,
}

impl EnvelopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskRequest => "TASK_REQUEST",
            Self::TaskResponse => "TASK_RESPONSE",
            Self::StatusUpdate => "STATUS_UPDATE",
            Self::Error => "ERROR",
            Self::Ack => "ACK",
            Self::RollbackRequest => "ROLLBACK_REQUEST",
            Self::Cancel => "CANCEL",
        }
    }
}

/// A single inter-agent message, immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: EnvelopeKind,
    /// Task this envelope belongs to.
    pub task_id: Uuid,
    /// Correlates request/response pairs across agents.
    pub correlation_id: Uuid,
    /// Assigned by the lifecycle tracker; 0 until emitted.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(kind: EnvelopeKind, task_id: Uuid, payload: serde_json::Value) -> Self {
        Self {
            kind,
            task_id,
            correlation_id: Uuid::new_v4(),
            sequence: 0,
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Status-update envelope for a state transition.
    pub fn status_update(task_id: Uuid, state: TaskState) -> Self {
        Self::new(
            EnvelopeKind::StatusUpdate,
            task_id,
            serde_json::json!({ "state": state.as_str() }),
        )
    }

    /// Error envelope with a structured failure payload.
    pub fn error(task_id: Uuid, kind: &str, message: &str) -> Self {
        Self::new(
            EnvelopeKind::Error,
            task_id,
            serde_json::json!({ "kind": kind, "message": message }),
        )
    }

    /// Whether this envelope records a terminal state for the task.
    pub fn terminal_state(&self) -> Option<TaskState> {
        if self.kind != EnvelopeKind::StatusUpdate {
            return None;
        }
        let state = self.payload.get("state")?.as_str()?;
        let state: TaskState = serde_json::from_value(serde_json::Value::String(
            state.to_string(),
        ))
        .ok()?;
        state.is_terminal().then_some(state)
    }

    /// Decode an envelope from JSON, rejecting unknown message types.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
