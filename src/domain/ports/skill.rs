//! Skill invocation port.
//!
//! Skills are the externally-implemented capabilities the engine schedules.
//! The engine treats their results as opaque beyond the status field; on
//! error a skill must supply an error classification string and a
//! human-readable message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::models::{ActionId, CapabilityId};

/// A resolved invocation request for one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCall {
    pub action_id: ActionId,
    pub capability: CapabilityId,
    pub parameters: BTreeMap<String, serde_json::Value>,
}

/// Reversible record an action produces when it commits. The concrete undo
/// technology is the skill's decision; the engine only stores and replays
/// the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoDescriptor {
    pub action_id: ActionId,
    pub capability: CapabilityId,
    /// Opaque token the skill needs to reverse the commit.
    pub token: serde_json::Value,
}

/// Error classification and message reported by a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillError {
    pub class: String,
    pub message: String,
}

impl SkillError {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SkillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.class, self.message)
    }
}

impl std::error::Error for SkillError {}

/// Successful skill result: a structured payload plus the undo descriptor
/// recorded before the commit is considered durable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillOutcome {
    pub payload: serde_json::Value,
    pub undo: UndoDescriptor,
}

/// An externally-implemented unit of work the engine can schedule.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Capability this skill implements.
    fn capability(&self) -> &CapabilityId;

    /// Execute one resolved call. May block on external I/O.
    async fn invoke(&self, call: SkillCall) -> Result<SkillOutcome, SkillError>;

    /// Reverse a previously committed call using its undo descriptor.
    async fn undo(&self, undo: &UndoDescriptor) -> Result<(), SkillError>;
}

/// Routes actions to the skill implementing their capability.
pub trait SkillRouter: Send + Sync {
    /// Look up the skill for a capability, if one is registered.
    fn route(&self, capability: &CapabilityId) -> Option<std::sync::Arc<dyn Skill>>;
}
