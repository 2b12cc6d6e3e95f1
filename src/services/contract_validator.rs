//! Contract validator.
//!
//! Pure function over a submitted draft. Checks run in order: schema
//! completeness (reporting every missing or malformed field), role/mode
//! compatibility, then the phase gate. No field is ever defaulted or
//! inferred; absence is always an error.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{FieldError, ValidationError};
use crate::domain::models::{
    ContractDraft, Mode, Phase, Profile, RiskTolerance, Role, TaskContract, ValidationStatus,
};

/// Validates contract drafts into immutable `TaskContract`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractValidator;

impl ContractValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a draft. On success the returned contract carries
    /// `ValidationStatus::Passed` and is immutable from here on.
    pub fn validate(&self, draft: &ContractDraft) -> Result<TaskContract, ValidationError> {
        let mut fields = Vec::new();

        let objective = match draft.objective.as_deref().map(str::trim) {
            None => {
                fields.push(FieldError::missing("objective"));
                None
            }
            Some("") => {
                fields.push(FieldError::malformed("objective", "must not be empty"));
                None
            }
            Some(text) => Some(text.to_string()),
        };

        let role = Self::parse_field(&mut fields, "role", draft.role.as_deref(), Role::from_str);
        let mode = Self::parse_field(&mut fields, "mode", draft.mode.as_deref(), Mode::from_str);
        let profile = Self::parse_field(
            &mut fields,
            "profile",
            draft.profile.as_deref(),
            Profile::from_str,
        );
        let risk_tolerance = Self::parse_field(
            &mut fields,
            "risk_tolerance",
            draft.risk_tolerance.as_deref(),
            RiskTolerance::from_str,
        );
        let phase = Self::parse_field(&mut fields, "phase", draft.phase.as_deref(), Phase::from_str);
        let validation_status = Self::parse_field(
            &mut fields,
            "validation_status",
            draft.validation_status.as_deref(),
            ValidationStatus::from_str,
        );

        if draft.scoped_resources.is_empty() {
            fields.push(FieldError::malformed(
                "scoped_resources",
                "must contain at least one resource",
            ));
        }
        if draft.scoped_resources.iter().any(|r| r.trim().is_empty()) {
            fields.push(FieldError::malformed(
                "scoped_resources",
                "entries must not be empty",
            ));
        }

        if !fields.is_empty() {
            return Err(ValidationError::Schema(fields));
        }

        // Schema passed; the unwraps below are upheld by the checks above.
        let (objective, role, mode, profile, risk_tolerance, phase, declared_status) = (
            objective.expect("checked"),
            role.expect("checked"),
            mode.expect("checked"),
            profile.expect("checked"),
            risk_tolerance.expect("checked"),
            phase.expect("checked"),
            validation_status.expect("checked"),
        );

        if !role.allows_mode(mode) {
            return Err(ValidationError::RoleModeConflict { role, mode });
        }

        if phase == Phase::Execution && declared_status != ValidationStatus::Passed {
            return Err(ValidationError::PhaseGate {
                phase,
                status: declared_status,
            });
        }

        debug!(role = role.as_str(), mode = mode.as_str(), "contract validated");

        Ok(TaskContract {
            id: Uuid::new_v4(),
            objective,
            role,
            mode,
            profile,
            scoped_resources: draft.scoped_resources.iter().cloned().collect(),
            config_sources: draft.config_sources.clone(),
            constraints: draft.constraints.clone(),
            risk_tolerance,
            phase,
            validation_status: ValidationStatus::Passed,
            created_at: Utc::now(),
        })
    }

    fn parse_field<T>(
        fields: &mut Vec<FieldError>,
        name: &'static str,
        raw: Option<&str>,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        match raw {
            None => {
                fields.push(FieldError::missing(name));
                None
            }
            Some(value) => match parse(value) {
                Some(parsed) => Some(parsed),
                None => {
                    fields.push(FieldError::malformed(
                        name,
                        format!("unrecognized value '{value}'"),
                    ));
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> ContractDraft {
        ContractDraft::new()
            .objective("lint and format the parser module")
            .role("executor")
            .mode("IMPLEMENT_ONLY")
            .profile("STANDARD")
            .scoped_resource("src/parser.rs")
            .risk_tolerance("LOW")
            .phase("A_CONTRACT_VALIDATION")
            .validation_status("PENDING")
    }

    #[test]
    fn test_valid_draft_passes() {
        let contract = ContractValidator::new().validate(&valid_draft()).unwrap();
        assert_eq!(contract.role, Role::Executor);
        assert_eq!(contract.validation_status, ValidationStatus::Passed);
        assert!(contract.scoped_resources.contains("src/parser.rs"));
    }

    #[test]
    fn test_schema_error_collects_all_fields() {
        let draft = ContractDraft::new().role("intern").phase("B_EXECUTION");

        let err = ContractValidator::new().validate(&draft).unwrap_err();
        let ValidationError::Schema(fields) = err else {
            panic!("expected Schema error, got {err:?}");
        };

        let named: Vec<&str> = fields.iter().map(|f| f.field).collect();
        assert!(named.contains(&"objective"));
        assert!(named.contains(&"role"));
        assert!(named.contains(&"mode"));
        assert!(named.contains(&"profile"));
        assert!(named.contains(&"risk_tolerance"));
        assert!(named.contains(&"validation_status"));
        assert!(named.contains(&"scoped_resources"));
        // phase was present and well-formed, so it must not be reported
        assert!(!named.contains(&"phase"));
    }

    #[test]
    fn test_empty_objective_is_malformed() {
        let mut draft = valid_draft();
        draft.objective = Some("   ".to_string());
        let err = ContractValidator::new().validate(&draft).unwrap_err();
        assert!(matches!(err, ValidationError::Schema(_)));
    }

    #[test]
    fn test_junior_analyze_only_is_role_mode_conflict() {
        let draft = valid_draft().role("junior").mode("ANALYZE_ONLY");

        let err = ContractValidator::new().validate(&draft).unwrap_err();
        assert_eq!(
            err,
            ValidationError::RoleModeConflict {
                role: Role::Junior,
                mode: Mode::AnalyzeOnly,
            }
        );
    }

    #[test]
    fn test_phase_gate_rejects_unpassed_execution_contract() {
        let mut draft = valid_draft();
        draft.phase = Some("B_EXECUTION".to_string());
        draft.validation_status = Some("PENDING".to_string());

        let err = ContractValidator::new().validate(&draft).unwrap_err();
        assert_eq!(
            err,
            ValidationError::PhaseGate {
                phase: Phase::Execution,
                status: ValidationStatus::Pending,
            }
        );
    }

    #[test]
    fn test_phase_gate_accepts_passed_execution_contract() {
        let mut draft = valid_draft();
        draft.phase = Some("B_EXECUTION".to_string());
        draft.validation_status = Some("PASSED".to_string());

        let contract = ContractValidator::new().validate(&draft).unwrap();
        assert_eq!(contract.phase, Phase::Execution);
    }

    #[test]
    fn test_role_mode_checked_before_phase_gate() {
        // Both violations present; the role/mode conflict must surface first.
        let mut draft = valid_draft();
        draft.role = Some("junior".to_string());
        draft.mode = Some("ANALYZE_ONLY".to_string());
        draft.phase = Some("B_EXECUTION".to_string());
        draft.validation_status = Some("PENDING".to_string());

        let err = ContractValidator::new().validate(&draft).unwrap_err();
        assert!(matches!(err, ValidationError::RoleModeConflict { .. }));
    }
}
