//! Task contract domain model.
//!
//! A contract is the declarative task request an external caller submits.
//! It is validated exactly once by the `ContractValidator`; the validated
//! form is immutable. Re-validation requires a new contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Capability role declared by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Senior,
    Executor,
    Inspector,
    Junior,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Senior => "senior",
            Self::Executor => "executor",
            Self::Inspector => "inspector",
            Self::Junior => "junior",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "senior" => Some(Self::Senior),
            "executor" => Some(Self::Executor),
            "inspector" => Some(Self::Inspector),
            "junior" => Some(Self::Junior),
            _ => None,
        }
    }

    /// Modes a role may declare. New roles extend this table, not branching
    /// logic elsewhere.
    pub fn allowed_modes(&self) -> &'static [Mode] {
        match self {
            Self::Senior => &[
                Mode::AnalyzeOnly,
                Mode::AnalyzeAndImplement,
                Mode::ImplementOnly,
            ],
            Self::Executor => &[Mode::AnalyzeAndImplement, Mode::ImplementOnly],
            Self::Inspector => &[Mode::AnalyzeOnly],
            Self::Junior => &[Mode::ImplementOnly],
        }
    }

    pub fn allows_mode(&self, mode: Mode) -> bool {
        self.allowed_modes().contains(&mode)
    }
}

/// Execution mode declared by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    AnalyzeOnly,
    AnalyzeAndImplement,
    ImplementOnly,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnalyzeOnly => "ANALYZE_ONLY",
            Self::AnalyzeAndImplement => "ANALYZE_AND_IMPLEMENT",
            Self::ImplementOnly => "IMPLEMENT_ONLY",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ANALYZE_ONLY" => Some(Self::AnalyzeOnly),
            "ANALYZE_AND_IMPLEMENT" => Some(Self::AnalyzeAndImplement),
            "IMPLEMENT_ONLY" => Some(Self::ImplementOnly),
            _ => None,
        }
    }
}

/// Tiered capability profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Profile {
    Lite,
    Standard,
    Full,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lite => "LITE",
            Self::Standard => "STANDARD",
            Self::Full => "FULL",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LITE" => Some(Self::Lite),
            "STANDARD" => Some(Self::Standard),
            "FULL" => Some(Self::Full),
            _ => None,
        }
    }
}

/// Declared risk tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

impl RiskTolerance {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }
}

/// Execution phase the contract claims to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "A_CONTRACT_VALIDATION")]
    ContractValidation,
    #[serde(rename = "B_EXECUTION")]
    Execution,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContractValidation => "A_CONTRACT_VALIDATION",
            Self::Execution => "B_EXECUTION",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "A_CONTRACT_VALIDATION" => Some(Self::ContractValidation),
            "B_EXECUTION" => Some(Self::Execution),
            _ => None,
        }
    }
}

/// Validation status recorded on the contract itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Pending,
    Passed,
    Failed,
}

impl ValidationStatus {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "PASSED" => Some(Self::Passed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Raw contract as submitted by a caller, before validation.
///
/// Every field is optional on purpose: the validator reports *all* missing
/// or malformed fields, it never infers or defaults any of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractDraft {
    pub objective: Option<String>,
    pub role: Option<String>,
    pub mode: Option<String>,
    pub profile: Option<String>,
    #[serde(default)]
    pub scoped_resources: Vec<String>,
    #[serde(default)]
    pub config_sources: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub risk_tolerance: Option<String>,
    pub phase: Option<String>,
    pub validation_status: Option<String>,
}

impl ContractDraft {
    /// Start an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = Some(objective.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn scoped_resource(mut self, resource: impl Into<String>) -> Self {
        self.scoped_resources.push(resource.into());
        self
    }

    pub fn config_source(mut self, source: impl Into<String>) -> Self {
        self.config_sources.push(source.into());
        self
    }

    pub fn constraint(mut self, rule: impl Into<String>) -> Self {
        self.constraints.push(rule.into());
        self
    }

    pub fn risk_tolerance(mut self, tolerance: impl Into<String>) -> Self {
        self.risk_tolerance = Some(tolerance.into());
        self
    }

    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    pub fn validation_status(mut self, status: impl Into<String>) -> Self {
        self.validation_status = Some(status.into());
        self
    }
}

/// A validated, immutable task contract.
///
/// Only the `ContractValidator` constructs this type, so holding a
/// `TaskContract` is proof the schema, role/mode, and phase-gate checks
/// all passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContract {
    pub id: Uuid,
    pub objective: String,
    pub role: Role,
    pub mode: Mode,
    pub profile: Profile,
    /// Frozen set of resources this task may touch. Never empty.
    pub scoped_resources: BTreeSet<String>,
    pub config_sources: Vec<String>,
    pub constraints: Vec<String>,
    pub risk_tolerance: RiskTolerance,
    pub phase: Phase,
    pub validation_status: ValidationStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_mode_table() {
        assert!(Role::Senior.allows_mode(Mode::AnalyzeOnly));
        assert!(Role::Senior.allows_mode(Mode::ImplementOnly));
        assert!(Role::Executor.allows_mode(Mode::ImplementOnly));
        assert!(!Role::Executor.allows_mode(Mode::AnalyzeOnly));
        assert!(Role::Inspector.allows_mode(Mode::AnalyzeOnly));
        assert!(!Role::Inspector.allows_mode(Mode::ImplementOnly));
        assert!(Role::Junior.allows_mode(Mode::ImplementOnly));
        assert!(!Role::Junior.allows_mode(Mode::AnalyzeOnly));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(Role::from_str("Junior"), Some(Role::Junior));
        assert_eq!(Mode::from_str("analyze_only"), Some(Mode::AnalyzeOnly));
        assert_eq!(Profile::from_str("lite"), Some(Profile::Lite));
        assert_eq!(Phase::from_str("B_EXECUTION"), Some(Phase::Execution));
        assert_eq!(
            ValidationStatus::from_str("passed"),
            Some(ValidationStatus::Passed)
        );
        assert_eq!(Role::from_str("intern"), None);
        assert_eq!(Profile::from_str("MAXIMAL"), None);
    }

    #[test]
    fn test_phase_serde_tags() {
        let json = serde_json::to_string(&Phase::Execution).unwrap();
        assert_eq!(json, "\"B_EXECUTION\"");
        let parsed: Phase = serde_json::from_str("\"A_CONTRACT_VALIDATION\"").unwrap();
        assert_eq!(parsed, Phase::ContractValidation);
    }

    #[test]
    fn test_draft_builder() {
        let draft = ContractDraft::new()
            .objective("refactor parser")
            .role("executor")
            .mode("IMPLEMENT_ONLY")
            .profile("STANDARD")
            .scoped_resource("src/parser.rs")
            .risk_tolerance("LOW")
            .phase("A_CONTRACT_VALIDATION")
            .validation_status("PENDING");

        assert_eq!(draft.objective.as_deref(), Some("refactor parser"));
        assert_eq!(draft.scoped_resources.len(), 1);
        assert!(draft.constraints.is_empty());
    }
}
