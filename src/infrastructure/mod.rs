//! Infrastructure: configuration loading, logging setup, registry loading.

pub mod config;
pub mod logging;
pub mod registry;

pub use config::{ConfigError, ConfigLoader};
pub use logging::Logger;
pub use registry::{load_registry, parse_registry};
