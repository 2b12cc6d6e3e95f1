//! Lifecycle tracker.
//!
//! Owns the per-task state machine records and the append-only envelope
//! stream. Every envelope leaving the engine passes through here, picking
//! up its per-task sequence number on the way; subscribers observe the same
//! stream over a broadcast channel. Terminal status envelopes are emitted
//! exactly once; asking for the same terminal transition again is a no-op.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{OrchestrationError, OrchestrationResult};
use crate::domain::models::{Envelope, EnvelopeKind, ExecutionReport, TaskState};
use crate::domain::ports::EnvelopeStore;

const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug)]
struct TaskRecord {
    state: TaskState,
    next_sequence: u64,
}

/// Tracks task state transitions and emits the envelope stream.
pub struct LifecycleTracker {
    store: Arc<dyn EnvelopeStore>,
    tasks: RwLock<HashMap<Uuid, TaskRecord>>,
    sender: broadcast::Sender<Envelope>,
}

impl LifecycleTracker {
    pub fn new(store: Arc<dyn EnvelopeStore>) -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            store,
            tasks: RwLock::new(HashMap::new()),
            sender,
        }
    }

    /// Register a new task in `Created` and emit its TASK_REQUEST envelope.
    pub async fn register(&self, task_id: Uuid, payload: serde_json::Value) -> anyhow::Result<()> {
        self.tasks.write().await.insert(
            task_id,
            TaskRecord {
                state: TaskState::Created,
                next_sequence: 1,
            },
        );
        self.emit(Envelope::new(EnvelopeKind::TaskRequest, task_id, payload))
            .await
    }

    /// Current state, if the task is registered.
    pub async fn state(&self, task_id: Uuid) -> Option<TaskState> {
        self.tasks.read().await.get(&task_id).map(|r| r.state)
    }

    /// Subscribe to every envelope emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Move the task to `next`, emitting one STATUS_UPDATE envelope.
    ///
    /// Re-requesting the terminal state the task is already in succeeds
    /// without emitting a second terminal envelope. Any other repeat or
    /// out-of-table transition is an error.
    pub async fn transition(&self, task_id: Uuid, next: TaskState) -> OrchestrationResult<()> {
        let current = {
            let mut tasks = self.tasks.write().await;
            let record = tasks.get_mut(&task_id).ok_or_else(|| {
                OrchestrationError::Internal(format!("unregistered task {task_id}"))
            })?;

            if record.state == next && next.is_terminal() {
                return Ok(());
            }
            if !record.state.can_transition_to(next) {
                return Err(OrchestrationError::InvalidStateTransition {
                    from: record.state.as_str().to_string(),
                    to: next.as_str().to_string(),
                });
            }
            let previous = record.state;
            record.state = next;
            previous
        };

        info!(
            %task_id,
            from = current.as_str(),
            to = next.as_str(),
            "task state transition"
        );

        self.emit(Envelope::status_update(task_id, next))
            .await
            .map_err(|e| OrchestrationError::Internal(e.to_string()))
    }

    /// Emit an ERROR envelope carrying the structured failure payload.
    pub async fn emit_error(&self, task_id: Uuid, error: &OrchestrationError) -> anyhow::Result<()> {
        self.emit(Envelope::new(
            EnvelopeKind::Error,
            task_id,
            error.to_payload(),
        ))
        .await
    }

    /// Assign the next sequence number, persist, then broadcast.
    pub async fn emit(&self, mut envelope: Envelope) -> anyhow::Result<()> {
        {
            let mut tasks = self.tasks.write().await;
            let record = tasks.entry(envelope.task_id).or_insert_with(|| TaskRecord {
                state: TaskState::Created,
                next_sequence: 1,
            });
            envelope.sequence = record.next_sequence;
            record.next_sequence += 1;
        }

        self.store.append(&envelope).await?;
        // a send error only means nobody is subscribed right now
        if self.sender.send(envelope.clone()).is_err() {
            warn!(task_id = %envelope.task_id, "envelope emitted with no subscribers");
        }
        Ok(())
    }

    /// Full envelope stream for a task, in sequence order.
    pub async fn stream(&self, task_id: Uuid) -> anyhow::Result<Vec<Envelope>> {
        self.store.stream(task_id).await
    }

    /// Persist the final report and archive the task.
    pub async fn archive(&self, report: &ExecutionReport) -> OrchestrationResult<()> {
        self.store
            .persist_report(report)
            .await
            .map_err(|e| OrchestrationError::Internal(e.to_string()))?;
        self.transition(report.task_id, TaskState::Archived).await
    }

    /// Fetch a previously archived report.
    pub async fn report(&self, task_id: Uuid) -> anyhow::Result<Option<ExecutionReport>> {
        self.store.report(task_id).await
    }
}
