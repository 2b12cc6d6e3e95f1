//! Trigger engine.
//!
//! Pure shortlist computation: given the contextual signals of a task and
//! the profile grant, rank the capabilities whose trigger predicates match.
//! Same signals, same registry, same grant always yield the same shortlist
//! in the same order.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::domain::models::{
    ActivationTier, CapabilityId, CapabilityRegistry, Phase, TriggerPredicate,
};
use crate::services::profile_resolver::{ActivationPolicy, ProfileGrant};

/// Contextual signals observed for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSignals {
    /// File extensions (without dots) of the scoped resources.
    pub extensions: BTreeSet<String>,
    pub phase: Option<Phase>,
    /// Lowercased keyword hits from the objective text.
    pub keywords: BTreeSet<String>,
    /// Classification of the most recent error, if any.
    pub error_class: Option<String>,
}

impl TriggerSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.insert(ext.into());
        self
    }

    pub fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_keyword(mut self, word: impl Into<String>) -> Self {
        self.keywords.insert(word.into().to_lowercase());
        self
    }

    pub fn with_error_class(mut self, class: impl Into<String>) -> Self {
        self.error_class = Some(class.into());
        self
    }

    fn matches(&self, predicate: &TriggerPredicate) -> bool {
        match predicate {
            TriggerPredicate::Extension { ext } => self.extensions.contains(ext),
            TriggerPredicate::Phase { phase } => self.phase == Some(*phase),
            TriggerPredicate::Keyword { word } => self.keywords.contains(&word.to_lowercase()),
            TriggerPredicate::ErrorClass { class } => self.error_class.as_deref() == Some(class),
            TriggerPredicate::ExtensionInPhase { ext, phase } => {
                self.extensions.contains(ext) && self.phase == Some(*phase)
            }
        }
    }
}

/// One ranked shortlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortlistEntry {
    pub capability: CapabilityId,
    pub tier: ActivationTier,
    /// Highest specificity among the matching predicates.
    pub specificity: u8,
}

/// Computes deterministic capability shortlists.
#[derive(Debug, Clone)]
pub struct TriggerEngine {
    registry: Arc<CapabilityRegistry>,
}

impl TriggerEngine {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// Rank matching, grant-permitted capabilities: core tier before
    /// suggested, higher specificity first, then id for a stable order.
    pub fn shortlist(&self, signals: &TriggerSignals, grant: &ProfileGrant) -> Vec<ShortlistEntry> {
        let mut entries: Vec<ShortlistEntry> = self
            .registry
            .iter()
            .filter(|d| grant.permits(&d.id))
            .filter(|d| {
                // Suggested-tier capabilities only surface when the grant
                // permits suggestions at all.
                d.tier == ActivationTier::Core
                    || grant.activation == ActivationPolicy::SuggestOnly
            })
            .filter_map(|d| {
                d.triggers
                    .iter()
                    .filter(|p| signals.matches(p))
                    .map(TriggerPredicate::specificity)
                    .max()
                    .map(|specificity| ShortlistEntry {
                        capability: d.id.clone(),
                        tier: d.tier,
                        specificity,
                    })
            })
            .collect();

        entries.sort_by(|a, b| {
            a.tier
                .cmp(&b.tier)
                .then(b.specificity.cmp(&a.specificity))
                .then(a.capability.cmp(&b.capability))
        });

        debug!(matched = entries.len(), "trigger shortlist computed");
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CapabilityDescriptor, Profile};
    use crate::services::profile_resolver::ProfileResolver;

    fn registry() -> Arc<CapabilityRegistry> {
        Arc::new(CapabilityRegistry::from_descriptors(vec![
            CapabilityDescriptor::new("rust-lint", ActivationTier::Core)
                .with_trigger(TriggerPredicate::Extension {
                    ext: "rs".to_string(),
                })
                .allowed_in(Profile::Lite)
                .allowed_in(Profile::Standard)
                .allowed_in(Profile::Full),
            CapabilityDescriptor::new("rust-exec-fix", ActivationTier::Core)
                .with_trigger(TriggerPredicate::ExtensionInPhase {
                    ext: "rs".to_string(),
                    phase: Phase::Execution,
                })
                .allowed_in(Profile::Standard)
                .allowed_in(Profile::Full),
            CapabilityDescriptor::new("any-phase-audit", ActivationTier::Core)
                .with_trigger(TriggerPredicate::Phase {
                    phase: Phase::Execution,
                })
                .allowed_in(Profile::Standard)
                .allowed_in(Profile::Full),
            CapabilityDescriptor::new("refactor-hint", ActivationTier::Suggested)
                .with_trigger(TriggerPredicate::Keyword {
                    word: "refactor".to_string(),
                })
                .allowed_in(Profile::Standard)
                .allowed_in(Profile::Full),
        ]))
    }

    fn signals() -> TriggerSignals {
        TriggerSignals::new()
            .with_extension("rs")
            .in_phase(Phase::Execution)
            .with_keyword("refactor")
    }

    #[test]
    fn test_ordering_tier_then_specificity_then_id() {
        let registry = registry();
        let grant = ProfileResolver::new(registry.clone()).resolve(Profile::Full);
        let shortlist = TriggerEngine::new(registry).shortlist(&signals(), &grant);

        let ids: Vec<&str> = shortlist.iter().map(|e| e.capability.as_str()).collect();
        // core first; within core, specificity 3 > 2 > 1; suggested last
        assert_eq!(
            ids,
            vec!["rust-exec-fix", "rust-lint", "any-phase-audit", "refactor-hint"]
        );
    }

    #[test]
    fn test_shortlist_is_deterministic() {
        let registry = registry();
        let grant = ProfileResolver::new(registry.clone()).resolve(Profile::Full);
        let engine = TriggerEngine::new(registry);

        let first = engine.shortlist(&signals(), &grant);
        for _ in 0..5 {
            assert_eq!(engine.shortlist(&signals(), &grant), first);
        }
    }

    #[test]
    fn test_standard_grant_hides_suggested_tier() {
        let registry = registry();
        let grant = ProfileResolver::new(registry.clone()).resolve(Profile::Standard);
        let shortlist = TriggerEngine::new(registry).shortlist(&signals(), &grant);

        assert!(shortlist
            .iter()
            .all(|e| e.tier == ActivationTier::Core));
    }

    #[test]
    fn test_unmatched_signals_produce_empty_shortlist() {
        let registry = registry();
        let grant = ProfileResolver::new(registry.clone()).resolve(Profile::Full);
        let shortlist = TriggerEngine::new(registry)
            .shortlist(&TriggerSignals::new().with_extension("py"), &grant);
        assert!(shortlist.is_empty());
    }

    #[test]
    fn test_grant_filters_unpermitted_capabilities() {
        let registry = registry();
        let grant = ProfileResolver::new(registry.clone()).resolve(Profile::Lite);
        let shortlist = TriggerEngine::new(registry).shortlist(&signals(), &grant);

        let ids: Vec<&str> = shortlist.iter().map(|e| e.capability.as_str()).collect();
        assert_eq!(ids, vec!["rust-lint"]);
    }
}
