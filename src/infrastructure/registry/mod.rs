//! Capability registry YAML loader.
//!
//! The registry document is declared once per project and loaded at
//! startup. Example:
//!
//! ```yaml
//! capabilities:
//!   - id: rust-lint
//!     tier: core
//!     profiles: [LITE, STANDARD, FULL]
//!     triggers:
//!       - on: extension
//!         ext: rs
//!     parameters:
//!       - name: fix
//!         kind: boolean
//!         default: false
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

use crate::domain::models::{CapabilityDescriptor, CapabilityRegistry};

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    capabilities: Vec<CapabilityDescriptor>,
}

/// Parse a registry document. Duplicate capability ids are an error, not
/// a silent replacement.
pub fn parse_registry(yaml: &str) -> Result<CapabilityRegistry> {
    let document: RegistryDocument =
        serde_yaml::from_str(yaml).context("Failed to parse capability registry document")?;

    let mut seen = BTreeSet::new();
    for descriptor in &document.capabilities {
        if !seen.insert(descriptor.id.clone()) {
            bail!("duplicate capability id '{}' in registry", descriptor.id);
        }
    }

    Ok(CapabilityRegistry::from_descriptors(document.capabilities))
}

/// Load and parse the registry from a file.
pub fn load_registry(path: impl AsRef<Path>) -> Result<CapabilityRegistry> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read capability registry at {}", path.display()))?;
    let registry = parse_registry(&raw)?;
    info!(
        path = %path.display(),
        capabilities = registry.len(),
        "capability registry loaded"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ActivationTier, CapabilityId, ParameterKind, Profile};

    const DOCUMENT: &str = r"
capabilities:
  - id: rust-lint
    tier: core
    profiles: [LITE, STANDARD, FULL]
    triggers:
      - on: extension
        ext: rs
    parameters:
      - name: fix
        kind: boolean
        default: false
  - id: refactor-hint
    tier: suggested
    profiles: [FULL]
    triggers:
      - on: keyword
        word: refactor
";

    #[test]
    fn test_parse_registry_document() {
        let registry = parse_registry(DOCUMENT).unwrap();
        assert_eq!(registry.len(), 2);

        let lint = registry.get(&CapabilityId::new("rust-lint")).unwrap();
        assert_eq!(lint.tier, ActivationTier::Core);
        assert!(lint.is_allowed_in(Profile::Lite));
        assert_eq!(lint.parameter("fix").unwrap().kind, ParameterKind::Boolean);
        assert_eq!(lint.triggers.len(), 1);

        let hint = registry.get(&CapabilityId::new("refactor-hint")).unwrap();
        assert_eq!(hint.tier, ActivationTier::Suggested);
        assert!(!hint.is_allowed_in(Profile::Standard));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = r"
capabilities:
  - id: lint
    tier: core
    profiles: [FULL]
  - id: lint
    tier: core
    profiles: [FULL]
";
        assert!(parse_registry(yaml).is_err());
    }

    #[test]
    fn test_empty_document_is_an_empty_registry() {
        let registry = parse_registry("capabilities: []").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_registry_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();
        file.flush().unwrap();

        let registry = load_registry(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_registry("/nonexistent/capabilities.yaml").is_err());
    }
}
