//! Governance guard.
//!
//! Authorizes each action's target resources against a scope snapshot
//! frozen at validation time. The guard runs twice per action: once while
//! the plan is built (deny means the plan fails) and once immediately
//! before dispatch (deny means the task failed by scope expansion). Both
//! checks use the same snapshot, so a plan-time pass implies a
//! dispatch-time pass unless the action itself changed.

use std::collections::BTreeSet;
use tracing::warn;

use crate::domain::errors::DenialReason;
use crate::domain::models::{Action, TaskContract};

/// Frozen view of what a task may touch. Built once per task and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSnapshot {
    scoped_resources: BTreeSet<String>,
    blacklist: Vec<String>,
}

impl ScopeSnapshot {
    pub fn new(
        scoped_resources: impl IntoIterator<Item = String>,
        blacklist: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            scoped_resources: scoped_resources.into_iter().collect(),
            blacklist: blacklist.into_iter().collect(),
        }
    }

    /// Snapshot a contract's declared scope together with the configured
    /// blacklist patterns.
    pub fn for_contract(contract: &TaskContract, blacklist: &[String]) -> Self {
        Self {
            scoped_resources: contract.scoped_resources.clone(),
            blacklist: blacklist.to_vec(),
        }
    }

    /// Whether a resource falls inside the declared scope. A scope entry
    /// covers the resource exactly, as a declared glob, or as a directory
    /// prefix. A bare filename entry never reaches into other directories;
    /// the basename suffix match is reserved for blacklist patterns.
    fn covers(&self, resource: &str) -> bool {
        self.scoped_resources.iter().any(|entry| {
            if entry.contains('*') {
                return matches_pattern(resource, entry);
            }
            entry == resource
                || resource.starts_with(&format!("{}/", entry.trim_end_matches('/')))
        })
    }

    /// First blacklist pattern matching the resource, if any.
    fn blacklisted(&self, resource: &str) -> Option<&str> {
        self.blacklist
            .iter()
            .find(|pattern| matches_pattern(resource, pattern))
            .map(String::as_str)
    }
}

/// Minimal glob matching for resource patterns. Supports `**/` prefixes
/// (match anywhere in the path), `*.` extension patterns, and exact paths.
fn matches_pattern(resource: &str, pattern: &str) -> bool {
    if let Some(rest) = pattern.strip_prefix("**/") {
        if let Some(inner) = rest.strip_suffix("/**") {
            return resource.split('/').any(|segment| segment == inner)
                || resource.contains(&format!("/{inner}/"))
                || resource.starts_with(&format!("{inner}/"));
        }
        return resource == rest || resource.ends_with(&format!("/{rest}")) || {
            rest.strip_prefix("*.").is_some_and(|ext| {
                resource.rsplit('/').next().is_some_and(|name| {
                    name.rsplit('.').next() == Some(ext) && name.contains('.')
                })
            })
        };
    }
    if let Some(ext) = pattern.strip_prefix("*.") {
        return resource
            .rsplit('/')
            .next()
            .is_some_and(|name| name.contains('.') && name.rsplit('.').next() == Some(ext));
    }
    resource == pattern || resource.ends_with(&format!("/{pattern}"))
}

/// Authorizes actions against a frozen scope snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct GovernanceGuard;

impl GovernanceGuard {
    pub fn new() -> Self {
        Self
    }

    /// Check every resource the action reads or writes. Blacklist matches
    /// take precedence over scope membership: a blacklisted resource is
    /// denied even when the contract declared it in scope.
    pub fn authorize(&self, action: &Action, scope: &ScopeSnapshot) -> Result<(), DenialReason> {
        for resource in action.target_resources() {
            if let Some(pattern) = scope.blacklisted(&resource) {
                let pattern = pattern.to_string();
                warn!(
                    action = %action.id,
                    resource = %resource,
                    pattern = %pattern,
                    "governance denied: blacklisted resource"
                );
                return Err(DenialReason::Blacklisted { resource, pattern });
            }
            if !scope.covers(&resource) {
                warn!(
                    action = %action.id,
                    resource = %resource,
                    "governance denied: resource outside declared scope"
                );
                return Err(DenialReason::OutOfScope { resource });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ActionId, CapabilityId};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn snapshot() -> ScopeSnapshot {
        ScopeSnapshot::new(
            ["src/parser.rs".to_string(), "src/codegen".to_string()],
            [
                ".env".to_string(),
                "*.key".to_string(),
                "**/secrets/**".to_string(),
            ],
        )
    }

    fn action(reads: &[&str], writes: &[&str]) -> Action {
        Action {
            id: ActionId::new(),
            capability: CapabilityId::new("lint"),
            parameters: BTreeMap::new(),
            depends_on: vec![],
            reads: reads.iter().map(|s| (*s).to_string()).collect(),
            writes: writes.iter().map(|s| (*s).to_string()).collect(),
            timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_in_scope_resource_is_authorized() {
        let action = action(&["src/parser.rs"], &["src/parser.rs"]);
        assert!(GovernanceGuard::new().authorize(&action, &snapshot()).is_ok());
    }

    #[test]
    fn test_directory_scope_covers_children() {
        let action = action(&[], &["src/codegen/emit.rs"]);
        assert!(GovernanceGuard::new().authorize(&action, &snapshot()).is_ok());
    }

    #[test]
    fn test_out_of_scope_resource_is_denied() {
        let action = action(&[], &["src/lexer.rs"]);
        let err = GovernanceGuard::new()
            .authorize(&action, &snapshot())
            .unwrap_err();
        assert_eq!(
            err,
            DenialReason::OutOfScope {
                resource: "src/lexer.rs".to_string()
            }
        );
    }

    #[test]
    fn test_blacklist_wins_over_scope() {
        let scope = ScopeSnapshot::new(
            ["deploy.key".to_string()],
            ["*.key".to_string()],
        );
        let action = action(&[], &["deploy.key"]);
        let err = GovernanceGuard::new().authorize(&action, &scope).unwrap_err();
        assert!(matches!(err, DenialReason::Blacklisted { pattern, .. } if pattern == "*.key"));
    }

    #[test]
    fn test_recursive_blacklist_pattern() {
        let scope = ScopeSnapshot::new(
            ["config".to_string()],
            ["**/secrets/**".to_string()],
        );
        let action = action(&["config/secrets/token.txt"], &[]);
        let err = GovernanceGuard::new().authorize(&action, &scope).unwrap_err();
        assert!(matches!(err, DenialReason::Blacklisted { .. }));
    }

    #[test]
    fn test_dot_env_blacklisted_by_exact_name() {
        let scope = ScopeSnapshot::new([".env".to_string()], [".env".to_string()]);
        let action = action(&[".env"], &[]);
        assert!(GovernanceGuard::new().authorize(&action, &scope).is_err());
    }

    #[test]
    fn test_bare_filename_scope_does_not_reach_other_directories() {
        let scope = ScopeSnapshot::new(["a.txt".to_string()], Vec::new());
        let guard = GovernanceGuard::new();

        assert!(guard.authorize(&action(&["a.txt"], &[]), &scope).is_ok());

        // same filename elsewhere is not a member of the declared scope
        let err = guard
            .authorize(&action(&[], &["evil/a.txt"]), &scope)
            .unwrap_err();
        assert_eq!(
            err,
            DenialReason::OutOfScope {
                resource: "evil/a.txt".to_string()
            }
        );
    }

    #[test]
    fn test_glob_scope_entry_still_covers() {
        let scope = ScopeSnapshot::new(["*.rs".to_string()], Vec::new());
        let guard = GovernanceGuard::new();
        assert!(guard.authorize(&action(&["src/lib.rs"], &[]), &scope).is_ok());
        assert!(guard.authorize(&action(&["notes.md"], &[]), &scope).is_err());
    }

    #[test]
    fn test_mixed_read_write_targets_all_checked() {
        let scope = ScopeSnapshot::new(["src".to_string()], Vec::new());
        let guard = GovernanceGuard::new();
        // in-scope read plus out-of-scope write must still deny
        let err = guard
            .authorize(&action(&["src/a.rs"], &["target/out.rs"]), &scope)
            .unwrap_err();
        assert!(matches!(err, DenialReason::OutOfScope { .. }));
    }

    #[test]
    fn test_authorize_is_idempotent() {
        let guard = GovernanceGuard::new();
        let scope = snapshot();
        let ok = action(&["src/parser.rs"], &[]);
        let bad = action(&[], &["/etc/passwd"]);
        for _ in 0..3 {
            assert!(guard.authorize(&ok, &scope).is_ok());
            assert!(guard.authorize(&bad, &scope).is_err());
        }
    }

    #[test]
    fn test_pattern_matcher() {
        assert!(matches_pattern("deploy.key", "*.key"));
        assert!(matches_pattern("certs/tls.pem", "*.pem"));
        assert!(!matches_pattern("keyring", "*.key"));
        assert!(matches_pattern("a/b/secrets/c.txt", "**/secrets/**"));
        assert!(matches_pattern("secrets/c.txt", "**/secrets/**"));
        assert!(!matches_pattern("a/secretsauce/c.txt", "**/secrets/**"));
        assert!(matches_pattern(".env", ".env"));
        assert!(matches_pattern("sub/.env", ".env"));
    }
}
