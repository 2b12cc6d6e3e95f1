//! Praetor - Policy-Gated Task Orchestration Engine
//!
//! Praetor turns declarative task contracts into governed, reversible
//! execution: contracts are validated against a closed schema and a
//! role/mode compatibility table, capabilities are resolved through tiered
//! profiles and deterministic trigger rules, and the resulting action graph
//! runs wave-by-wave with all-or-nothing commit semantics and reverse-order
//! rollback on failure.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure business logic, models, and ports
//! - **Service Layer** (`services`): The validation → resolution → execution pipeline
//! - **Adapters** (`adapters`): In-process implementations of the ports
//! - **Infrastructure Layer** (`infrastructure`): Config, logging, registry loading
//!
//! # Example
//!
//! ```ignore
//! use praetor::{ContractDraft, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Build an orchestrator, admit a contract, plan, and run
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::{InMemoryEnvelopeStore, ScriptedSkill, SkillRecorder, StaticSkillRouter};
pub use domain::errors::{
    DenialReason, FieldError, OrchestrationError, OrchestrationResult, PlanError, ValidationError,
};
pub use domain::models::{
    Action, ActionId, ActionRecord, ActionSpec, ActionStatus, ActivationTier, CapabilityDescriptor,
    CapabilityId, CapabilityRegistry, Config, ContractDraft, Envelope, EnvelopeKind,
    ExecutionGraph, ExecutionReport, ExecutorSettings, GovernanceConfig, LoggingConfig, Mode,
    ParameterKind, ParameterSpec, Phase, Profile, RiskTolerance, Role, TaskContract, TaskState,
    TriggerPredicate, ValidationStatus,
};
pub use domain::ports::{
    EnvelopeStore, Skill, SkillCall, SkillError, SkillOutcome, SkillRouter, UndoDescriptor,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::{load_registry, parse_registry, Logger};
pub use services::{
    ActivationPolicy, CancelToken, ContractValidator, GovernanceGuard, LifecycleTracker,
    Orchestrator, PlanBuilder, ProfileGrant, ProfileResolver, Scheduler, ScopeLedger,
    ScopeSnapshot, ShortlistEntry, TriggerEngine, TriggerSignals,
};
