//! Domain errors for the orchestration engine.
//!
//! Contract-shaped errors (schema, role/mode, phase gate, unknown profile,
//! cyclic plan) stop processing before any side effect and are reported
//! verbatim to the caller; they are never retried automatically. Action
//! failures are recovered locally by the scheduler via rollback. Rollback
//! failure is the only fatal condition.

use thiserror::Error;

use crate::domain::models::{ActionId, CapabilityId, Mode, Phase, Role, ValidationStatus};

/// Format an action-id set as a readable list.
fn format_node_set(nodes: &[ActionId]) -> String {
    nodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single missing or malformed contract field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub problem: String,
}

impl FieldError {
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            problem: "missing".to_string(),
        }
    }

    pub fn malformed(field: &'static str, problem: impl Into<String>) -> Self {
        Self {
            field,
            problem: problem.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

fn format_field_errors(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why the governance guard denied an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenialReason {
    #[error("resource '{resource}' is outside the declared scope")]
    OutOfScope { resource: String },

    #[error("resource '{resource}' matches blacklist pattern '{pattern}'")]
    Blacklisted { resource: String, pattern: String },
}

/// Errors raised by contract validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Every missing or malformed field, not just the first.
    #[error("contract schema invalid: {}", format_field_errors(.0))]
    Schema(Vec<FieldError>),

    #[error("role {role:?} may not declare mode {mode:?}")]
    RoleModeConflict { role: Role, mode: Mode },

    /// The caller must stop, not retry: a contract claiming phase
    /// B_EXECUTION must already carry a PASSED validation status.
    #[error("phase gate failed: phase {phase:?} requires validation status PASSED, found {status:?}")]
    PhaseGate {
        phase: Phase,
        status: ValidationStatus,
    },
}

/// Errors raised while building an execution plan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("plan contains a cycle through nodes: {}", format_node_set(.0))]
    CyclicPlan(Vec<ActionId>),

    #[error("action {action} references unknown predecessor {dependency}")]
    UnknownDependency {
        action: ActionId,
        dependency: ActionId,
    },

    #[error("capability '{0}' is not registered")]
    UnknownCapability(CapabilityId),

    #[error("action {action} uses capability '{capability}' outside the resolved profile grant")]
    CapabilityNotGranted {
        action: ActionId,
        capability: CapabilityId,
    },

    #[error("action {action} missing required parameter '{parameter}' for capability '{capability}'")]
    MissingParameter {
        action: ActionId,
        capability: CapabilityId,
        parameter: String,
    },

    #[error("action {action} denied: {reason}")]
    Denied {
        action: ActionId,
        #[source]
        reason: DenialReason,
    },
}

/// Top-level error taxonomy for the engine.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Never a silent fallback to a default profile.
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    #[error(transparent)]
    Plan(#[from] PlanError),

    /// A validated contract may only queue once a non-empty graph exists.
    #[error("execution graph contains no actions")]
    EmptyGraph,

    /// An already-frozen scope was exceeded at execution time.
    #[error("action {action} attempted to exceed the frozen scope: {reason}")]
    ScopeExpansion {
        action: ActionId,
        #[source]
        reason: DenialReason,
    },

    /// Wraps a capability-reported failure; recovered locally via rollback.
    #[error("action {action} failed: [{class}] {message}")]
    ActionFailure {
        action: ActionId,
        class: String,
        message: String,
    },

    /// Fatal. The task is left flagged inconsistent for manual intervention.
    #[error("rollback failed for action {action}: {message}")]
    RollbackFailure { action: ActionId, message: String },

    #[error("cancel requested for task")]
    CancelRequested,

    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("scheduler invariant violated: {0}")]
    Internal(String),
}

impl OrchestrationError {
    /// Stable classification string for structured failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::Schema(_)) => "SchemaError",
            Self::Validation(ValidationError::RoleModeConflict { .. }) => "RoleModeConflict",
            Self::Validation(ValidationError::PhaseGate { .. }) => "PhaseGateError",
            Self::UnknownProfile(_) => "UnknownProfile",
            Self::Plan(PlanError::CyclicPlan(_)) => "CyclicPlanError",
            Self::Plan(PlanError::Denied { .. }) => "Denied",
            Self::Plan(_) => "PlanError",
            Self::EmptyGraph => "EmptyGraph",
            Self::ScopeExpansion { .. } => "ScopeExpansionError",
            Self::ActionFailure { .. } => "ActionFailure",
            Self::RollbackFailure { .. } => "RollbackFailure",
            Self::CancelRequested => "CancelRequested",
            Self::InvalidStateTransition { .. } => "InvalidStateTransition",
            Self::Internal(_) => "Internal",
        }
    }

    /// Structured payload for callers: kind, message, offending id when
    /// known. Never a bare stack trace.
    pub fn to_payload(&self) -> serde_json::Value {
        let action = match self {
            Self::ScopeExpansion { action, .. }
            | Self::ActionFailure { action, .. }
            | Self::RollbackFailure { action, .. } => Some(action.to_string()),
            Self::Plan(PlanError::Denied { action, .. })
            | Self::Plan(PlanError::UnknownDependency { action, .. })
            | Self::Plan(PlanError::CapabilityNotGranted { action, .. })
            | Self::Plan(PlanError::MissingParameter { action, .. }) => Some(action.to_string()),
            _ => None,
        };
        serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
            "action_id": action,
        })
    }
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
