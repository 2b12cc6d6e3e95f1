//! In-process adapters for the engine's ports.

pub mod envelope_store;
pub mod skills;

pub use envelope_store::InMemoryEnvelopeStore;
pub use skills::{ScriptedBehavior, ScriptedSkill, SkillEvent, SkillRecorder, StaticSkillRouter};
