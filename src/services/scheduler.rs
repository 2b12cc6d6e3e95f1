//! Wave-based graph scheduler.
//!
//! Executes one `ExecutionGraph` with all-or-nothing semantics. Each wave
//! is the largest plan-order prefix of ready actions with pairwise-disjoint
//! target resources; a wave runs concurrently under the configured
//! semaphore and is fully drained before the next wave is formed. Any
//! action failure (including timeout and the pre-dispatch scope re-check)
//! stops dispatch and rolls back every committed action in reverse commit
//! order, each undo applied exactly once.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::errors::OrchestrationError;
use crate::domain::models::{
    Action, ActionId, ActionRecord, ActionStatus, ExecutionGraph, ExecutionReport, TaskState,
};
use crate::domain::ports::{SkillCall, SkillOutcome, SkillRouter, UndoDescriptor};
use crate::services::governance::{GovernanceGuard, ScopeSnapshot};

/// Cooperative cancellation flag. Cancel stops new dispatch; in-flight
/// actions are drained, then the committed prefix is rolled back.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

/// Result of one graph execution: the plan-ordered report plus the error
/// that stopped it, when one did.
#[derive(Debug)]
pub struct SchedulerOutcome {
    pub report: ExecutionReport,
    pub error: Option<OrchestrationError>,
}

struct ActionResult {
    action_id: ActionId,
    duration_ms: u64,
    result: Result<SkillOutcome, OrchestrationError>,
}

/// Executes graphs against routed skills.
pub struct Scheduler {
    router: Arc<dyn SkillRouter>,
    guard: GovernanceGuard,
    max_concurrency: usize,
}

impl Scheduler {
    pub fn new(router: Arc<dyn SkillRouter>, max_concurrency: usize) -> Self {
        Self {
            router,
            guard: GovernanceGuard::new(),
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Run the graph to completion or rollback. The returned report lists
    /// every node in plan order regardless of completion order.
    pub async fn execute(
        &self,
        task_id: Uuid,
        graph: &ExecutionGraph,
        scope: &ScopeSnapshot,
        cancel: &CancelToken,
    ) -> SchedulerOutcome {
        let started_at = Utc::now();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        // committed undo descriptors in commit order
        let undo_log: Arc<Mutex<Vec<UndoDescriptor>>> = Arc::new(Mutex::new(Vec::new()));

        let mut completed: BTreeSet<ActionId> = BTreeSet::new();
        let mut records: BTreeMap<ActionId, ActionRecord> = BTreeMap::new();
        let mut failure: Option<OrchestrationError> = None;

        while completed.len() < graph.len() && failure.is_none() {
            if cancel.is_canceled() {
                info!(%task_id, "cancel observed, stopping dispatch");
                failure = Some(OrchestrationError::CancelRequested);
                break;
            }

            let wave = next_wave(graph, &completed);
            if wave.is_empty() {
                failure = Some(OrchestrationError::Internal(
                    "ready set empty before graph completion".to_string(),
                ));
                break;
            }

            // scope re-check for the whole wave before anything dispatches
            let mut denied = None;
            for action in &wave {
                if let Err(reason) = self.guard.authorize(action, scope) {
                    denied = Some(OrchestrationError::ScopeExpansion {
                        action: action.id,
                        reason,
                    });
                    break;
                }
            }
            if let Some(err) = denied {
                failure = Some(err);
                break;
            }

            let handles: Vec<_> = wave
                .iter()
                .map(|action| {
                    let action = (*action).clone();
                    let router = self.router.clone();
                    let semaphore = semaphore.clone();
                    let undo_log = undo_log.clone();
                    tokio::spawn(async move {
                        run_action(action, router, semaphore, undo_log).await
                    })
                })
                .collect();

            for handle in handles {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(join) => {
                        failure.get_or_insert(OrchestrationError::Internal(format!(
                            "action task panicked: {join}"
                        )));
                        continue;
                    }
                };

                match result.result {
                    Ok(_) => {
                        completed.insert(result.action_id);
                        records.insert(
                            result.action_id,
                            record(graph, result.action_id, ActionStatus::Completed, result.duration_ms, None),
                        );
                    }
                    Err(err) => {
                        records.insert(
                            result.action_id,
                            record(
                                graph,
                                result.action_id,
                                ActionStatus::Failed,
                                result.duration_ms,
                                Some(err.to_string()),
                            ),
                        );
                        warn!(%task_id, action = %result.action_id, error = %err, "action failed");
                        failure.get_or_insert(err);
                    }
                }
            }
        }

        let final_state = match &failure {
            None => TaskState::Completed,
            Some(_) => {
                let undos = {
                    let mut log = undo_log
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    std::mem::take(&mut *log)
                };
                match self.rollback(task_id, undos, &mut records, graph).await {
                    Ok(()) => TaskState::RolledBack,
                    Err(err) => {
                        failure = Some(err);
                        TaskState::RollbackFailed
                    }
                }
            }
        };

        let actions = graph
            .topo_order
            .iter()
            .map(|id| {
                records
                    .remove(id)
                    .unwrap_or_else(|| record(graph, *id, ActionStatus::NotStarted, 0, None))
            })
            .collect();

        SchedulerOutcome {
            report: ExecutionReport {
                task_id,
                final_state,
                started_at,
                ended_at: Utc::now(),
                actions,
            },
            error: failure,
        }
    }

    /// Undo committed actions in reverse commit order. Stops at the first
    /// undo failure; the task is then inconsistent and needs intervention.
    async fn rollback(
        &self,
        task_id: Uuid,
        undos: Vec<UndoDescriptor>,
        records: &mut BTreeMap<ActionId, ActionRecord>,
        graph: &ExecutionGraph,
    ) -> Result<(), OrchestrationError> {
        for undo in undos.into_iter().rev() {
            let skill = self.router.route(&undo.capability).ok_or_else(|| {
                OrchestrationError::RollbackFailure {
                    action: undo.action_id,
                    message: format!("no skill routed for capability '{}'", undo.capability),
                }
            })?;

            skill.undo(&undo).await.map_err(|e| {
                error!(%task_id, action = %undo.action_id, error = %e, "rollback failed");
                OrchestrationError::RollbackFailure {
                    action: undo.action_id,
                    message: e.to_string(),
                }
            })?;

            records
                .entry(undo.action_id)
                .or_insert_with(|| record(graph, undo.action_id, ActionStatus::Completed, 0, None))
                .undo_applied = true;
        }
        Ok(())
    }
}

/// Largest plan-order prefix of ready actions with pairwise-disjoint
/// target resources. Ready means every predecessor already completed.
fn next_wave<'a>(graph: &'a ExecutionGraph, completed: &BTreeSet<ActionId>) -> Vec<&'a Action> {
    let mut wave: Vec<&Action> = Vec::new();
    for action in graph.actions_in_order() {
        if completed.contains(&action.id) {
            continue;
        }
        if !action.depends_on.iter().all(|d| completed.contains(d)) {
            continue;
        }
        if wave.iter().any(|w| w.shares_resources_with(action)) {
            continue;
        }
        wave.push(action);
    }
    wave
}

async fn run_action(
    action: Action,
    router: Arc<dyn SkillRouter>,
    semaphore: Arc<Semaphore>,
    undo_log: Arc<Mutex<Vec<UndoDescriptor>>>,
) -> ActionResult {
    let _permit = semaphore.acquire_owned().await;
    let start = Instant::now();

    let result = match router.route(&action.capability) {
        None => Err(OrchestrationError::ActionFailure {
            action: action.id,
            class: "routing".to_string(),
            message: format!("no skill routed for capability '{}'", action.capability),
        }),
        Some(skill) => {
            let call = SkillCall {
                action_id: action.id,
                capability: action.capability.clone(),
                parameters: action.parameters.clone(),
            };
            match tokio::time::timeout(action.timeout, skill.invoke(call)).await {
                Err(_) => Err(OrchestrationError::ActionFailure {
                    action: action.id,
                    class: "timeout".to_string(),
                    message: format!("exceeded {}s", action.timeout.as_secs()),
                }),
                Ok(Err(e)) => Err(OrchestrationError::ActionFailure {
                    action: action.id,
                    class: e.class,
                    message: e.message,
                }),
                Ok(Ok(outcome)) => {
                    undo_log
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .push(outcome.undo.clone());
                    Ok(outcome)
                }
            }
        }
    };

    ActionResult {
        action_id: action.id,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        result,
    }
}

fn record(
    graph: &ExecutionGraph,
    action_id: ActionId,
    status: ActionStatus,
    duration_ms: u64,
    error: Option<String>,
) -> ActionRecord {
    let capability_id = graph
        .get(action_id)
        .map(|a| a.capability.clone())
        .unwrap_or_else(|| crate::domain::models::CapabilityId::new("<unknown>"));
    ActionRecord {
        action_id,
        capability_id,
        status,
        duration_ms,
        undo_applied: false,
        error,
    }
}
