//! Orchestrator facade.
//!
//! Wires the pipeline end to end: admit a draft (validation + lifecycle
//! registration), derive the profile grant and trigger shortlist, hand out
//! a plan builder bound to the task's frozen scope, and run the resulting
//! graph under the scope ledger with full lifecycle reporting.
//!
//! Execution only accepts a `TaskContract`, and only the validator can
//! construct one, so a task that starts executing has passed validation by
//! construction.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::errors::{OrchestrationError, OrchestrationResult};
use crate::domain::models::{
    CapabilityRegistry, Config, ContractDraft, Envelope, EnvelopeKind, ExecutionGraph,
    ExecutionReport, TaskContract, TaskState,
};
use crate::domain::ports::{EnvelopeStore, SkillRouter};
use crate::services::contract_validator::ContractValidator;
use crate::services::governance::ScopeSnapshot;
use crate::services::lifecycle::LifecycleTracker;
use crate::services::plan_builder::PlanBuilder;
use crate::services::profile_resolver::{ProfileGrant, ProfileResolver};
use crate::services::scheduler::{CancelToken, Scheduler};
use crate::services::scope_ledger::ScopeLedger;
use crate::services::trigger_engine::{ShortlistEntry, TriggerEngine, TriggerSignals};

pub struct Orchestrator {
    validator: ContractValidator,
    resolver: ProfileResolver,
    triggers: TriggerEngine,
    scheduler: Scheduler,
    registry: Arc<CapabilityRegistry>,
    ledger: Arc<ScopeLedger>,
    lifecycle: Arc<LifecycleTracker>,
    config: Config,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        router: Arc<dyn SkillRouter>,
        store: Arc<dyn EnvelopeStore>,
        config: Config,
    ) -> Self {
        Self {
            validator: ContractValidator::new(),
            resolver: ProfileResolver::new(registry.clone()),
            triggers: TriggerEngine::new(registry.clone()),
            scheduler: Scheduler::new(router, config.executor.max_concurrency),
            registry,
            ledger: Arc::new(ScopeLedger::new()),
            lifecycle: Arc::new(LifecycleTracker::new(store)),
            config,
        }
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleTracker> {
        &self.lifecycle
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Validate a draft and register the task. A rejected draft registers
    /// nothing; validation errors carry every offending field at once.
    pub async fn admit(&self, draft: &ContractDraft) -> OrchestrationResult<TaskContract> {
        let contract = self.validator.validate(draft)?;

        self.lifecycle
            .register(contract.id, serde_json::to_value(&contract).unwrap_or_default())
            .await
            .map_err(|e| OrchestrationError::Internal(e.to_string()))?;
        self.lifecycle
            .transition(contract.id, TaskState::Validated)
            .await?;

        info!(task_id = %contract.id, objective = %contract.objective, "task admitted");
        Ok(contract)
    }

    /// Resolved capability grant for a contract's profile.
    pub fn grant_for(&self, contract: &TaskContract) -> ProfileGrant {
        self.resolver.resolve(contract.profile)
    }

    /// Deterministic capability shortlist from the contract's own signals:
    /// scoped-resource extensions, phase, and objective keywords.
    pub fn shortlist_for(&self, contract: &TaskContract) -> Vec<ShortlistEntry> {
        let mut signals = TriggerSignals::new().in_phase(contract.phase);
        for resource in &contract.scoped_resources {
            if let Some((_, ext)) = resource.rsplit_once('.') {
                if !ext.contains('/') {
                    signals = signals.with_extension(ext);
                }
            }
        }
        for word in contract.objective.split_whitespace() {
            signals = signals.with_keyword(word);
        }
        self.triggers.shortlist(&signals, &self.grant_for(contract))
    }

    /// Plan builder bound to this task's grant and frozen scope snapshot.
    pub fn planner(&self, contract: &TaskContract) -> PlanBuilder {
        let scope = ScopeSnapshot::for_contract(contract, &self.config.governance.blacklist);
        PlanBuilder::new(
            self.registry.clone(),
            self.grant_for(contract),
            scope,
            std::time::Duration::from_secs(self.config.executor.default_action_timeout_secs),
        )
    }

    /// Request cancellation of a task by appending a CANCEL envelope to its
    /// stream. A run in progress (or about to start) observes the envelope
    /// and stops dispatching further actions.
    pub async fn cancel(&self, task_id: Uuid) -> OrchestrationResult<()> {
        self.lifecycle
            .emit(Envelope::new(
                EnvelopeKind::Cancel,
                task_id,
                serde_json::Value::Null,
            ))
            .await
            .map_err(|e| OrchestrationError::Internal(e.to_string()))
    }

    /// Execute a built graph for an admitted contract: queue it, wait for
    /// scope admission, run the waves, emit the lifecycle trail, persist
    /// the report, and archive. The report's final state says how it ended.
    #[instrument(skip_all, fields(task_id = %contract.id))]
    pub async fn run(
        &self,
        contract: &TaskContract,
        graph: &ExecutionGraph,
        cancel: &CancelToken,
    ) -> OrchestrationResult<ExecutionReport> {
        let task_id = contract.id;
        if graph.is_empty() {
            return Err(OrchestrationError::EmptyGraph);
        }
        self.lifecycle.transition(task_id, TaskState::Queued).await?;

        self.ledger.acquire(task_id, &contract.scoped_resources).await;
        // every exit below this point must give the scope back
        let result = self.run_admitted(contract, graph, cancel).await;
        self.ledger.release(task_id);
        result
    }

    /// Body of `run` between scope acquisition and release.
    async fn run_admitted(
        &self,
        contract: &TaskContract,
        graph: &ExecutionGraph,
        cancel: &CancelToken,
    ) -> OrchestrationResult<ExecutionReport> {
        let task_id = contract.id;
        self.lifecycle
            .transition(task_id, TaskState::InProgress)
            .await?;

        // honor a CANCEL envelope already on the stream, then watch for
        // ones arriving while the graph runs
        let already_canceled = self
            .lifecycle
            .stream(task_id)
            .await
            .map_err(|e| OrchestrationError::Internal(e.to_string()))?
            .iter()
            .any(|e| e.kind == EnvelopeKind::Cancel);
        if already_canceled {
            cancel.cancel();
        }
        let watcher = {
            let mut rx = self.lifecycle.subscribe();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(envelope) => {
                            if envelope.task_id == task_id
                                && envelope.kind == EnvelopeKind::Cancel
                            {
                                cancel.cancel();
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            })
        };

        let scope = ScopeSnapshot::for_contract(contract, &self.config.governance.blacklist);
        let outcome = self.scheduler.execute(task_id, graph, &scope, cancel).await;
        watcher.abort();

        if let Some(error) = &outcome.error {
            self.lifecycle.transition(task_id, TaskState::Failed).await?;
            self.lifecycle
                .emit_error(task_id, error)
                .await
                .map_err(|e| OrchestrationError::Internal(e.to_string()))?;
            if matches!(error, OrchestrationError::CancelRequested) {
                self.lifecycle
                    .emit(Envelope::new(
                        EnvelopeKind::Ack,
                        task_id,
                        serde_json::json!({ "acknowledges": EnvelopeKind::Cancel.as_str() }),
                    ))
                    .await
                    .map_err(|e| OrchestrationError::Internal(e.to_string()))?;
            }
            self.lifecycle
                .emit(Envelope::new(
                    EnvelopeKind::RollbackRequest,
                    task_id,
                    serde_json::json!({ "reason": error.kind() }),
                ))
                .await
                .map_err(|e| OrchestrationError::Internal(e.to_string()))?;
        }

        self.lifecycle
            .transition(task_id, outcome.report.final_state)
            .await?;
        self.lifecycle
            .emit(Envelope::new(
                EnvelopeKind::TaskResponse,
                task_id,
                serde_json::to_value(&outcome.report).unwrap_or_default(),
            ))
            .await
            .map_err(|e| OrchestrationError::Internal(e.to_string()))?;
        self.lifecycle.archive(&outcome.report).await?;

        info!(
            final_state = outcome.report.final_state.as_str(),
            completed = outcome.report.completed_count(),
            failed = outcome.report.failed_count(),
            "task finished"
        );
        Ok(outcome.report)
    }
}
