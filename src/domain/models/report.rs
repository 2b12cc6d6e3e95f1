//! Execution report domain model.
//!
//! The report is the ordered record of per-action outcomes plus the overall
//! task outcome. Rows always appear in topological plan order, even when
//! wall-clock completion order differed due to concurrency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::capability::CapabilityId;
use super::graph::ActionId;
use super::task_state::TaskState;

/// Outcome of a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Action committed successfully.
    Completed,
    /// Action ran and failed (includes timeout).
    Failed,
    /// Action was never dispatched.
    NotStarted,
}

/// One row of the execution report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action_id: ActionId,
    pub capability_id: CapabilityId,
    pub status: ActionStatus,
    pub duration_ms: u64,
    /// True once this action's undo descriptor was invoked during rollback.
    pub undo_applied: bool,
    /// Error classification and message for failed actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ordered log of per-action outcomes plus the overall task outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub task_id: Uuid,
    pub final_state: TaskState,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Rows in topological plan order.
    pub actions: Vec<ActionRecord>,
}

impl ExecutionReport {
    pub fn record(&self, action_id: ActionId) -> Option<&ActionRecord> {
        self.actions.iter().find(|r| r.action_id == action_id)
    }

    pub fn completed_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|r| r.status == ActionStatus::Completed)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|r| r.status == ActionStatus::Failed)
            .count()
    }
}
