//! Domain layer for the orchestration engine.
//!
//! Pure business logic: models, the error taxonomy, and the ports external
//! collaborators implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{
    DenialReason, FieldError, OrchestrationError, OrchestrationResult, PlanError, ValidationError,
};
