//! Envelope persistence port.
//!
//! The lifecycle tracker persists each task's envelope stream and final
//! report through this seam; the storage technology is a collaborator
//! decision, not part of the engine.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::{Envelope, ExecutionReport};

/// Append-only persistence for envelope streams and reports.
#[async_trait]
pub trait EnvelopeStore: Send + Sync {
    /// Append one envelope to its task's stream.
    async fn append(&self, envelope: &Envelope) -> anyhow::Result<()>;

    /// Full stream for a task, in sequence order.
    async fn stream(&self, task_id: Uuid) -> anyhow::Result<Vec<Envelope>>;

    /// Persist the final execution report for a task.
    async fn persist_report(&self, report: &ExecutionReport) -> anyhow::Result<()>;

    /// Fetch a persisted report, if any.
    async fn report(&self, task_id: Uuid) -> anyhow::Result<Option<ExecutionReport>>;
}
