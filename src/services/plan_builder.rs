//! Plan builder.
//!
//! Turns staged action specs into an `ExecutionGraph`, or fails without
//! producing any graph at all. Checks run per node in staging order:
//! capability lookup, grant membership, parameter resolution against
//! declared defaults, dependency resolution, then the whole-graph cycle
//! check and a governance pass over every node.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::PlanError;
use crate::domain::models::{
    Action, ActionId, ActionSpec, CapabilityId, CapabilityRegistry, ExecutionGraph,
};
use crate::services::governance::{GovernanceGuard, ScopeSnapshot};
use crate::services::profile_resolver::ProfileGrant;

/// Builds one execution graph for one task, then is consumed.
pub struct PlanBuilder {
    registry: Arc<CapabilityRegistry>,
    grant: ProfileGrant,
    scope: ScopeSnapshot,
    guard: GovernanceGuard,
    default_timeout: Duration,
    staged: Vec<(ActionId, ActionSpec)>,
}

impl PlanBuilder {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        grant: ProfileGrant,
        scope: ScopeSnapshot,
        default_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            grant,
            scope,
            guard: GovernanceGuard::new(),
            default_timeout,
            staged: Vec::new(),
        }
    }

    /// Stage a spec and hand back the id later specs can depend on.
    pub fn stage(&mut self, spec: ActionSpec) -> ActionId {
        let id = ActionId::new();
        self.staged.push((id, spec));
        id
    }

    /// Validate everything staged and produce the graph. Any failure means
    /// no graph: partially-valid plans are never returned.
    pub fn build(self) -> Result<ExecutionGraph, PlanError> {
        let known: BTreeSet<ActionId> = self.staged.iter().map(|(id, _)| *id).collect();
        let mut nodes: BTreeMap<ActionId, Action> = BTreeMap::new();
        let mut staging_order = Vec::with_capacity(self.staged.len());

        for (id, spec) in &self.staged {
            let capability = spec
                .capability
                .clone()
                .ok_or_else(|| PlanError::UnknownCapability(CapabilityId::new("<unspecified>")))?;

            let descriptor = self
                .registry
                .get(&capability)
                .ok_or_else(|| PlanError::UnknownCapability(capability.clone()))?;

            if !self.grant.permits(&capability) {
                return Err(PlanError::CapabilityNotGranted {
                    action: *id,
                    capability,
                });
            }

            let mut parameters = spec.parameters.clone();
            for declared in &descriptor.parameters {
                if parameters.contains_key(&declared.name) {
                    continue;
                }
                match &declared.default {
                    Some(default) => {
                        parameters.insert(declared.name.clone(), default.clone());
                    }
                    None if declared.required => {
                        return Err(PlanError::MissingParameter {
                            action: *id,
                            capability,
                            parameter: declared.name.clone(),
                        });
                    }
                    None => {}
                }
            }

            for dep in &spec.depends_on {
                if !known.contains(dep) {
                    return Err(PlanError::UnknownDependency {
                        action: *id,
                        dependency: *dep,
                    });
                }
            }

            staging_order.push(*id);
            nodes.insert(
                *id,
                Action {
                    id: *id,
                    capability,
                    parameters,
                    depends_on: spec.depends_on.clone(),
                    reads: spec.reads.clone(),
                    writes: spec.writes.clone(),
                    timeout: Duration::from_secs(
                        spec.timeout_secs
                            .unwrap_or(self.default_timeout.as_secs()),
                    ),
                },
            );
        }

        let topo_order = topological_order(&nodes, &staging_order)?;

        for id in &topo_order {
            let action = &nodes[id];
            self.guard
                .authorize(action, &self.scope)
                .map_err(|reason| PlanError::Denied {
                    action: *id,
                    reason,
                })?;
        }

        debug!(actions = nodes.len(), "execution graph built");
        Ok(ExecutionGraph { nodes, topo_order })
    }
}

/// Kahn's algorithm, breaking ties by staging order so the plan order is
/// reproducible. Leftover nodes after the queue drains form the cycle,
/// reported as a set.
fn topological_order(
    nodes: &BTreeMap<ActionId, Action>,
    staging_order: &[ActionId],
) -> Result<Vec<ActionId>, PlanError> {
    // unique predecessors only, so a repeated dependency cannot wedge a node
    let mut in_degree: BTreeMap<ActionId, usize> = nodes
        .iter()
        .map(|(id, action)| {
            let unique: BTreeSet<&ActionId> = action.depends_on.iter().collect();
            (*id, unique.len())
        })
        .collect();

    let mut queue: VecDeque<ActionId> = staging_order
        .iter()
        .filter(|id| in_degree[id] == 0)
        .copied()
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(id) = queue.pop_front() {
        order.push(id);
        // staging_order keeps dependent release deterministic
        for next in staging_order {
            if nodes[next].depends_on.contains(&id) {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*next);
                    }
                }
            }
        }
    }

    if order.len() < nodes.len() {
        let mut cycle: Vec<ActionId> = in_degree
            .into_iter()
            .filter(|(id, _)| !order.contains(id))
            .map(|(id, _)| id)
            .collect();
        cycle.sort();
        return Err(PlanError::CyclicPlan(cycle));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        ActivationTier, CapabilityDescriptor, ParameterKind, ParameterSpec, Profile,
    };
    use crate::services::profile_resolver::ProfileResolver;

    fn registry() -> Arc<CapabilityRegistry> {
        Arc::new(CapabilityRegistry::from_descriptors(vec![
            CapabilityDescriptor::new("lint", ActivationTier::Core)
                .with_parameter(ParameterSpec::optional(
                    "fix",
                    ParameterKind::Boolean,
                    serde_json::json!(false),
                ))
                .allowed_in(Profile::Standard)
                .allowed_in(Profile::Full),
            CapabilityDescriptor::new("compile", ActivationTier::Core)
                .with_parameter(ParameterSpec::required("target", ParameterKind::Path))
                .allowed_in(Profile::Standard)
                .allowed_in(Profile::Full),
            CapabilityDescriptor::new("refactor-hint", ActivationTier::Suggested)
                .allowed_in(Profile::Full),
        ]))
    }

    fn builder(scope_entries: &[&str]) -> PlanBuilder {
        let registry = registry();
        let grant = ProfileResolver::new(registry.clone()).resolve(Profile::Standard);
        let scope = ScopeSnapshot::new(
            scope_entries.iter().map(|s| (*s).to_string()),
            vec!["*.key".to_string()],
        );
        PlanBuilder::new(registry, grant, scope, Duration::from_secs(600))
    }

    #[test]
    fn test_linear_plan_builds_in_order() {
        let mut b = builder(&["src"]);
        let first = b.stage(ActionSpec::for_capability("lint").writing("src/a.rs"));
        let second = b.stage(
            ActionSpec::for_capability("compile")
                .with_parameter("target", serde_json::json!("src/a.rs"))
                .reading("src/a.rs")
                .after(first),
        );

        let graph = b.build().unwrap();
        assert_eq!(graph.topo_order, vec![first, second]);
    }

    #[test]
    fn test_default_parameter_is_filled_in() {
        let mut b = builder(&["src"]);
        let id = b.stage(ActionSpec::for_capability("lint").writing("src/a.rs"));
        let graph = b.build().unwrap();
        assert_eq!(
            graph.get(id).unwrap().parameters.get("fix"),
            Some(&serde_json::json!(false))
        );
    }

    #[test]
    fn test_missing_required_parameter_fails_the_plan() {
        let mut b = builder(&["src"]);
        b.stage(ActionSpec::for_capability("compile").reading("src/a.rs"));
        let err = b.build().unwrap_err();
        assert!(
            matches!(err, PlanError::MissingParameter { parameter, .. } if parameter == "target")
        );
    }

    #[test]
    fn test_unknown_capability_fails_the_plan() {
        let mut b = builder(&["src"]);
        b.stage(ActionSpec::for_capability("teleport").writing("src/a.rs"));
        assert!(matches!(b.build().unwrap_err(), PlanError::UnknownCapability(_)));
    }

    #[test]
    fn test_ungranted_capability_fails_the_plan() {
        // refactor-hint is registered but only granted under FULL
        let mut b = builder(&["src"]);
        b.stage(ActionSpec::for_capability("refactor-hint").reading("src/a.rs"));
        assert!(matches!(
            b.build().unwrap_err(),
            PlanError::CapabilityNotGranted { .. }
        ));
    }

    #[test]
    fn test_unknown_dependency_fails_the_plan() {
        let mut b = builder(&["src"]);
        b.stage(ActionSpec::for_capability("lint").writing("src/a.rs").after(ActionId::new()));
        assert!(matches!(
            b.build().unwrap_err(),
            PlanError::UnknownDependency { .. }
        ));
    }

    #[test]
    fn test_cycle_names_the_offending_nodes() {
        let mut b = builder(&["src"]);
        // wire a 2-cycle by staging with forged ids
        let a = ActionId::new();
        let c = ActionId::new();
        b.staged.push((
            a,
            ActionSpec::for_capability("lint").writing("src/a.rs").after(c),
        ));
        b.staged.push((
            c,
            ActionSpec::for_capability("lint").writing("src/b.rs").after(a),
        ));

        let err = b.build().unwrap_err();
        let PlanError::CyclicPlan(mut named) = err else {
            panic!("expected CyclicPlan, got {err:?}");
        };
        named.sort();
        let mut expected = vec![a, c];
        expected.sort();
        assert_eq!(named, expected);
    }

    #[test]
    fn test_out_of_scope_action_is_denied_at_build() {
        let mut b = builder(&["src"]);
        b.stage(ActionSpec::for_capability("lint").writing("/etc/passwd"));
        assert!(matches!(b.build().unwrap_err(), PlanError::Denied { .. }));
    }

    #[test]
    fn test_blacklisted_action_is_denied_at_build() {
        let mut b = builder(&["src", "deploy.key"]);
        b.stage(ActionSpec::for_capability("lint").reading("deploy.key"));
        let err = b.build().unwrap_err();
        assert!(matches!(err, PlanError::Denied { .. }));
    }

    #[test]
    fn test_failed_build_returns_no_partial_graph() {
        let mut b = builder(&["src"]);
        b.stage(ActionSpec::for_capability("lint").writing("src/a.rs"));
        b.stage(ActionSpec::for_capability("teleport").writing("src/b.rs"));
        // Result is Err; the valid first action is not observable anywhere.
        assert!(b.build().is_err());
    }

    #[test]
    fn test_timeout_falls_back_to_default() {
        let mut b = builder(&["src"]);
        let quick = b.stage(
            ActionSpec::for_capability("lint")
                .writing("src/a.rs")
                .with_timeout_secs(5),
        );
        let slow = b.stage(ActionSpec::for_capability("lint").writing("src/b.rs"));

        let graph = b.build().unwrap();
        assert_eq!(graph.get(quick).unwrap().timeout, Duration::from_secs(5));
        assert_eq!(graph.get(slow).unwrap().timeout, Duration::from_secs(600));
    }
}
