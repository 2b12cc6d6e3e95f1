//! Scope ledger.
//!
//! Cross-task mutual exclusion over scoped resources: two tasks whose
//! scopes intersect never execute concurrently; disjoint tasks proceed in
//! parallel. Tasks queue on the ledger and are admitted in the order their
//! conflicts clear.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use tokio::sync::Notify;
use tracing::debug;
use uuid::Uuid;

/// Two scope entries conflict when equal or when one is a directory prefix
/// of the other.
fn entries_conflict(a: &str, b: &str) -> bool {
    let a = a.trim_end_matches('/');
    let b = b.trim_end_matches('/');
    a == b || a.starts_with(&format!("{b}/")) || b.starts_with(&format!("{a}/"))
}

fn scopes_conflict(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    a.iter()
        .any(|ra| b.iter().any(|rb| entries_conflict(ra, rb)))
}

/// Registry of the scopes currently held by executing tasks.
#[derive(Debug, Default)]
pub struct ScopeLedger {
    held: Mutex<HashMap<Uuid, BTreeSet<String>>>,
    released: Notify,
}

impl ScopeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit the task immediately if its scope is disjoint from every held
    /// scope. Returns false without registering anything on conflict.
    pub fn try_acquire(&self, task_id: Uuid, scope: &BTreeSet<String>) -> bool {
        let mut held = self.held.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if held
            .iter()
            .any(|(other, other_scope)| *other != task_id && scopes_conflict(scope, other_scope))
        {
            return false;
        }
        held.insert(task_id, scope.clone());
        true
    }

    /// Wait until the task's scope is disjoint from every held scope, then
    /// register it.
    pub async fn acquire(&self, task_id: Uuid, scope: &BTreeSet<String>) {
        loop {
            // register for wakeup before checking, so a release between the
            // check and the await is not missed
            let notified = self.released.notified();
            if self.try_acquire(task_id, scope) {
                debug!(%task_id, resources = scope.len(), "scope acquired");
                return;
            }
            notified.await;
        }
    }

    /// Drop the task's registration and wake every queued waiter.
    pub fn release(&self, task_id: Uuid) {
        let mut held = self.held.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if held.remove(&task_id).is_some() {
            debug!(%task_id, "scope released");
            drop(held);
            self.released.notify_waiters();
        }
    }

    /// Whether any task currently holds a conflicting scope.
    pub fn is_blocked(&self, task_id: Uuid, scope: &BTreeSet<String>) -> bool {
        let held = self.held.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        held.iter()
            .any(|(other, other_scope)| *other != task_id && scopes_conflict(scope, other_scope))
    }
}
