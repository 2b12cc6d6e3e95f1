//! Execution graph domain models.
//!
//! An `ExecutionGraph` is a DAG of actions built per validated contract and
//! discarded after the report is persisted. Graphs are only constructed by
//! the `PlanBuilder`, which guarantees the acyclicity and referential
//! invariants; code holding an `ExecutionGraph` may rely on them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use uuid::Uuid;

use super::capability::CapabilityId;

/// Unique identifier of an action node within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(pub Uuid);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One node in the execution graph, bound to exactly one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub capability: CapabilityId,
    /// Parameters resolved against the capability's declared defaults.
    pub parameters: BTreeMap<String, serde_json::Value>,
    /// Predecessor actions whose output this action consumes.
    pub depends_on: Vec<ActionId>,
    /// Resources this action reads.
    pub reads: BTreeSet<String>,
    /// Resources this action writes.
    pub writes: BTreeSet<String>,
    /// Caller-supplied maximum duration. Exceeding it is an action failure.
    pub timeout: Duration,
}

impl Action {
    /// All resources this action targets, read or write.
    pub fn target_resources(&self) -> BTreeSet<String> {
        self.reads.union(&self.writes).cloned().collect()
    }

    /// Whether two actions touch any common resource.
    pub fn shares_resources_with(&self, other: &Action) -> bool {
        let mine = self.target_resources();
        other.target_resources().iter().any(|r| mine.contains(r))
    }
}

/// Caller-authored request for an action, consumed by the plan builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionSpec {
    pub capability: Option<CapabilityId>,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub depends_on: Vec<ActionId>,
    #[serde(default)]
    pub reads: BTreeSet<String>,
    #[serde(default)]
    pub writes: BTreeSet<String>,
    /// Seconds; the builder falls back to the configured default when absent.
    pub timeout_secs: Option<u64>,
}

impl ActionSpec {
    pub fn for_capability(capability: impl Into<String>) -> Self {
        Self {
            capability: Some(CapabilityId::new(capability)),
            ..Self::default()
        }
    }

    pub fn reading(mut self, resource: impl Into<String>) -> Self {
        self.reads.insert(resource.into());
        self
    }

    pub fn writing(mut self, resource: impl Into<String>) -> Self {
        self.writes.insert(resource.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn after(mut self, action: ActionId) -> Self {
        self.depends_on.push(action);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// A dependency-ordered DAG of actions.
///
/// `topo_order` lists every node with dependencies before dependents; it is
/// also the canonical order for the execution report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionGraph {
    pub nodes: BTreeMap<ActionId, Action>,
    pub topo_order: Vec<ActionId>,
}

impl ExecutionGraph {
    pub fn get(&self, id: ActionId) -> Option<&Action> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Actions in topological order.
    pub fn actions_in_order(&self) -> impl Iterator<Item = &Action> {
        self.topo_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Actions that depend on `id` directly.
    pub fn dependents_of(&self, id: ActionId) -> Vec<ActionId> {
        self.nodes
            .values()
            .filter(|a| a.depends_on.contains(&id))
            .map(|a| a.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(reads: &[&str], writes: &[&str]) -> Action {
        Action {
            id: ActionId::new(),
            capability: CapabilityId::new("test"),
            parameters: BTreeMap::new(),
            depends_on: vec![],
            reads: reads.iter().map(|s| (*s).to_string()).collect(),
            writes: writes.iter().map(|s| (*s).to_string()).collect(),
            timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_target_resources_union() {
        let a = action(&["a.txt"], &["b.txt"]);
        let targets = a.target_resources();
        assert!(targets.contains("a.txt"));
        assert!(targets.contains("b.txt"));
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn test_shared_resources() {
        let a = action(&["a.txt"], &[]);
        let b = action(&[], &["a.txt"]);
        let c = action(&["c.txt"], &[]);

        assert!(a.shares_resources_with(&b));
        assert!(!a.shares_resources_with(&c));
    }

    #[test]
    fn test_dependents_lookup() {
        let root = action(&[], &["out.txt"]);
        let mut child = action(&["out.txt"], &[]);
        child.depends_on.push(root.id);

        let graph = ExecutionGraph {
            topo_order: vec![root.id, child.id],
            nodes: [(root.id, root.clone()), (child.id, child.clone())]
                .into_iter()
                .collect(),
        };

        assert_eq!(graph.dependents_of(root.id), vec![child.id]);
        assert!(graph.dependents_of(child.id).is_empty());
    }
}
