//! Domain models for the orchestration engine.

pub mod capability;
pub mod config;
pub mod contract;
pub mod envelope;
pub mod graph;
pub mod report;
pub mod task_state;

pub use capability::{
    ActivationTier, CapabilityDescriptor, CapabilityId, CapabilityRegistry, ParameterKind,
    ParameterSpec, TriggerPredicate,
};
pub use config::{Config, ExecutorSettings, GovernanceConfig, LoggingConfig};
pub use contract::{
    ContractDraft, Mode, Phase, Profile, RiskTolerance, Role, TaskContract, ValidationStatus,
};
pub use envelope::{Envelope, EnvelopeKind};
pub use graph::{Action, ActionId, ActionSpec, ExecutionGraph};
pub use report::{ActionRecord, ActionStatus, ExecutionReport};
pub use task_state::TaskState;
