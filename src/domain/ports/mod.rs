//! Ports: trait seams between the engine and its external collaborators.

pub mod envelope_store;
pub mod skill;

pub use envelope_store::EnvelopeStore;
pub use skill::{Skill, SkillCall, SkillError, SkillOutcome, SkillRouter, UndoDescriptor};
