//! Core pipeline services: validation, resolution, planning, execution.

pub mod contract_validator;
pub mod governance;
pub mod lifecycle;
pub mod orchestrator;
pub mod plan_builder;
pub mod profile_resolver;
pub mod scheduler;
pub mod scope_ledger;
pub mod trigger_engine;

pub use contract_validator::ContractValidator;
pub use governance::{GovernanceGuard, ScopeSnapshot};
pub use lifecycle::LifecycleTracker;
pub use orchestrator::Orchestrator;
pub use plan_builder::PlanBuilder;
pub use profile_resolver::{ActivationPolicy, ProfileGrant, ProfileResolver};
pub use scheduler::{CancelToken, Scheduler, SchedulerOutcome};
pub use scope_ledger::ScopeLedger;
pub use trigger_engine::{ShortlistEntry, TriggerEngine, TriggerSignals};
