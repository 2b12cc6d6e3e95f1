//! In-process skill adapters.
//!
//! `StaticSkillRouter` maps capability ids to skill instances fixed at
//! construction. `ScriptedSkill` is the embedded test double: it commits or
//! fails on cue, optionally sleeps to simulate work, and records every
//! invoke and undo in a shared `SkillRecorder` so tests can assert ordering
//! and exactly-once rollback.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::models::{ActionId, CapabilityId};
use crate::domain::ports::{Skill, SkillCall, SkillError, SkillOutcome, SkillRouter, UndoDescriptor};

/// Router over a fixed capability→skill table.
#[derive(Default)]
pub struct StaticSkillRouter {
    skills: HashMap<CapabilityId, Arc<dyn Skill>>,
}

impl StaticSkillRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skill(mut self, skill: Arc<dyn Skill>) -> Self {
        self.skills.insert(skill.capability().clone(), skill);
        self
    }

    pub fn register(&mut self, skill: Arc<dyn Skill>) {
        self.skills.insert(skill.capability().clone(), skill);
    }
}

impl SkillRouter for StaticSkillRouter {
    fn route(&self, capability: &CapabilityId) -> Option<Arc<dyn Skill>> {
        self.skills.get(capability).cloned()
    }
}

/// One observed skill event, in global observation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillEvent {
    Invoked(ActionId),
    Undone(ActionId),
}

/// Shared, ordered log of skill events across all scripted skills.
#[derive(Debug, Default, Clone)]
pub struct SkillRecorder {
    events: Arc<Mutex<Vec<SkillEvent>>>,
}

impl SkillRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: SkillEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<SkillEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Action ids undone, in observation order.
    pub fn undo_order(&self) -> Vec<ActionId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SkillEvent::Undone(id) => Some(id),
                SkillEvent::Invoked(_) => None,
            })
            .collect()
    }

    /// How many times one action was undone.
    pub fn undo_count(&self, action: ActionId) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == SkillEvent::Undone(action))
            .count()
    }

    pub fn invoked(&self, action: ActionId) -> bool {
        self.events().contains(&SkillEvent::Invoked(action))
    }
}

/// Scripted invoke behavior.
#[derive(Debug, Clone)]
pub enum ScriptedBehavior {
    /// Commit with an empty payload.
    Succeed,
    /// Fail every invocation with this classification and message.
    Fail { class: String, message: String },
    /// Never finish within any reasonable per-action timeout.
    Hang,
}

/// Deterministic in-process skill for embedding and tests.
pub struct ScriptedSkill {
    capability: CapabilityId,
    behavior: ScriptedBehavior,
    delay: Option<Duration>,
    fail_undo: bool,
    recorder: SkillRecorder,
}

impl ScriptedSkill {
    pub fn succeeding(capability: impl Into<String>, recorder: SkillRecorder) -> Self {
        Self {
            capability: CapabilityId::new(capability),
            behavior: ScriptedBehavior::Succeed,
            delay: None,
            fail_undo: false,
            recorder,
        }
    }

    pub fn failing(
        capability: impl Into<String>,
        class: impl Into<String>,
        message: impl Into<String>,
        recorder: SkillRecorder,
    ) -> Self {
        Self {
            capability: CapabilityId::new(capability),
            behavior: ScriptedBehavior::Fail {
                class: class.into(),
                message: message.into(),
            },
            delay: None,
            fail_undo: false,
            recorder,
        }
    }

    pub fn hanging(capability: impl Into<String>, recorder: SkillRecorder) -> Self {
        Self {
            capability: CapabilityId::new(capability),
            behavior: ScriptedBehavior::Hang,
            delay: None,
            fail_undo: false,
            recorder,
        }
    }

    /// Sleep this long before resolving each invocation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make `undo` fail, for exercising the fatal rollback path.
    pub fn with_failing_undo(mut self) -> Self {
        self.fail_undo = true;
        self
    }
}

#[async_trait]
impl Skill for ScriptedSkill {
    fn capability(&self) -> &CapabilityId {
        &self.capability
    }

    async fn invoke(&self, call: SkillCall) -> Result<SkillOutcome, SkillError> {
        self.recorder.push(SkillEvent::Invoked(call.action_id));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            ScriptedBehavior::Succeed => Ok(SkillOutcome {
                payload: serde_json::json!({ "capability": self.capability.as_str() }),
                undo: UndoDescriptor {
                    action_id: call.action_id,
                    capability: self.capability.clone(),
                    token: serde_json::json!({ "action": call.action_id.to_string() }),
                },
            }),
            ScriptedBehavior::Fail { class, message } => {
                Err(SkillError::new(class.clone(), message.clone()))
            }
            ScriptedBehavior::Hang => {
                futures::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
        }
    }

    async fn undo(&self, undo: &UndoDescriptor) -> Result<(), SkillError> {
        self.recorder.push(SkillEvent::Undone(undo.action_id));
        if self.fail_undo {
            return Err(SkillError::new("undo", "scripted undo failure"));
        }
        Ok(())
    }
}
