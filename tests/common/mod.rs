//! Shared fixtures for the integration suites.

use std::sync::Arc;

use praetor::{
    ActivationTier, CapabilityDescriptor, CapabilityRegistry, Config, ContractDraft, Orchestrator,
    ParameterKind, ParameterSpec, Phase, Profile, ScriptedSkill, SkillRecorder, StaticSkillRouter,
    TriggerPredicate,
};

/// Registry with a spread of tiers, triggers, and profile allowlists.
pub fn sample_registry() -> Arc<CapabilityRegistry> {
    Arc::new(CapabilityRegistry::from_descriptors(vec![
        CapabilityDescriptor::new("rust-lint", ActivationTier::Core)
            .with_trigger(TriggerPredicate::Extension {
                ext: "rs".to_string(),
            })
            .with_parameter(ParameterSpec::optional(
                "fix",
                ParameterKind::Boolean,
                serde_json::json!(false),
            ))
            .allowed_in(Profile::Lite)
            .allowed_in(Profile::Standard)
            .allowed_in(Profile::Full),
        CapabilityDescriptor::new("rust-format", ActivationTier::Core)
            .with_trigger(TriggerPredicate::ExtensionInPhase {
                ext: "rs".to_string(),
                phase: Phase::Execution,
            })
            .allowed_in(Profile::Standard)
            .allowed_in(Profile::Full),
        CapabilityDescriptor::new("compile", ActivationTier::Core)
            .with_parameter(ParameterSpec::required("target", ParameterKind::Path))
            .allowed_in(Profile::Standard)
            .allowed_in(Profile::Full),
        CapabilityDescriptor::new("refactor-hint", ActivationTier::Suggested)
            .with_trigger(TriggerPredicate::Keyword {
                word: "refactor".to_string(),
            })
            .allowed_in(Profile::Lite)
            .allowed_in(Profile::Full),
    ]))
}

/// Orchestrator over scripted skills: `boom` fails, everything else
/// succeeds, and every invoke/undo lands in the returned recorder.
pub fn orchestrator_with_recorder() -> (Orchestrator, SkillRecorder) {
    let recorder = SkillRecorder::new();
    let router = Arc::new(
        StaticSkillRouter::new()
            .with_skill(Arc::new(ScriptedSkill::succeeding(
                "rust-lint",
                recorder.clone(),
            )))
            .with_skill(Arc::new(ScriptedSkill::succeeding(
                "rust-format",
                recorder.clone(),
            )))
            .with_skill(Arc::new(ScriptedSkill::succeeding(
                "compile",
                recorder.clone(),
            )))
            .with_skill(Arc::new(ScriptedSkill::failing(
                "boom",
                "io",
                "scripted failure",
                recorder.clone(),
            ))),
    );

    let registry = {
        let mut descriptors: Vec<CapabilityDescriptor> =
            sample_registry().iter().cloned().collect();
        descriptors.push(
            CapabilityDescriptor::new("boom", ActivationTier::Core)
                .allowed_in(Profile::Standard)
                .allowed_in(Profile::Full),
        );
        Arc::new(CapabilityRegistry::from_descriptors(descriptors))
    };

    let orchestrator = Orchestrator::new(
        registry,
        router,
        Arc::new(praetor::InMemoryEnvelopeStore::new()),
        Config::default(),
    );
    (orchestrator, recorder)
}

/// A draft that passes validation under the STANDARD profile.
pub fn standard_draft() -> ContractDraft {
    ContractDraft::new()
        .objective("lint and compile the parser module")
        .role("executor")
        .mode("IMPLEMENT_ONLY")
        .profile("STANDARD")
        .scoped_resource("src")
        .risk_tolerance("LOW")
        .phase("A_CONTRACT_VALIDATION")
        .validation_status("PENDING")
}
