//! Task lifecycle state machine.
//!
//! ```text
//! Created -> Validated -> Queued -> InProgress -> {Completed, Failed}
//! Failed -> {RolledBack, RollbackFailed}
//! {Completed, RolledBack, RollbackFailed} -> Archived
//! ```
//!
//! `RolledBack` means the task failed and every committed action was undone.
//! `RollbackFailed` means the undo itself failed; that state is fatal and
//! requires external intervention.

use serde::{Deserialize, Serialize};

/// State of a task in the orchestration pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Contract submitted, not yet validated.
    Created,
    /// Contract passed validation.
    Validated,
    /// A non-empty execution graph exists.
    Queued,
    /// The scheduler is executing the graph.
    InProgress,
    /// Every action succeeded.
    Completed,
    /// An action failed (or the task was canceled); rollback pending.
    Failed,
    /// Failed, and rollback undid every committed action.
    RolledBack,
    /// Failed, and rollback itself failed. Fatal.
    RollbackFailed,
    /// Report persisted. Final and immutable.
    Archived,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Validated => "validated",
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::RolledBack => "rolled_back",
            Self::RollbackFailed => "rollback_failed",
            Self::Archived => "archived",
        }
    }

    /// Valid transitions from this state.
    pub fn valid_transitions(&self) -> &'static [TaskState] {
        match self {
            Self::Created => &[Self::Validated],
            Self::Validated => &[Self::Queued],
            Self::Queued => &[Self::InProgress],
            Self::InProgress => &[Self::Completed, Self::Failed],
            Self::Failed => &[Self::RolledBack, Self::RollbackFailed],
            Self::Completed | Self::RolledBack | Self::RollbackFailed => &[Self::Archived],
            Self::Archived => &[],
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Terminal states, before archival.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::RolledBack | Self::RollbackFailed | Self::Archived
        )
    }

    /// Whether the task ended without full success.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::RolledBack | Self::RollbackFailed)
    }
}
