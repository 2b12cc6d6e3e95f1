//! Capability registry domain models.
//!
//! Capabilities ("skills") are externally-implemented units of work the
//! engine can schedule. Their descriptors are declared up front and loaded
//! once per process lifetime; the engine never discovers capabilities by
//! inspection.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::contract::{Phase, Profile};

/// Unique identifier of a registered capability.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CapabilityId(pub String);

impl CapabilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CapabilityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Activation tier of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationTier {
    /// Activated deterministically whenever its triggers match.
    Core,
    /// Offered as a suggestion; only permissive profiles may activate it.
    Suggested,
}

/// A declarative rule mapping contextual signals to a capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "on", rename_all = "snake_case")]
pub enum TriggerPredicate {
    /// Matches a resource file extension (without the dot).
    Extension { ext: String },
    /// Matches the current execution phase.
    Phase { phase: Phase },
    /// Matches a literal keyword hit in the objective text.
    Keyword { word: String },
    /// Matches the classification of the last error.
    ErrorClass { class: String },
    /// Matches extension and phase together. More specific than either alone.
    ExtensionInPhase { ext: String, phase: Phase },
}

impl TriggerPredicate {
    /// Specificity used for shortlist ranking. Exact extension+phase
    /// predicates outrank single-signal predicates, which outrank the
    /// broad phase-only match.
    pub fn specificity(&self) -> u8 {
        match self {
            Self::ExtensionInPhase { .. } => 3,
            Self::Extension { .. } | Self::Keyword { .. } | Self::ErrorClass { .. } => 2,
            Self::Phase { .. } => 1,
        }
    }
}

/// Kind of a declared capability parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    String,
    Integer,
    Boolean,
    Path,
}

/// A parameter a capability declares it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    /// When present the parameter is optional and this value is used if the
    /// plan does not supply one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            required: true,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        kind: ParameterKind,
        default: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            default: Some(default),
            required: false,
        }
    }
}

/// Declared description of a registered capability. Immutable at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub id: CapabilityId,
    #[serde(default)]
    pub triggers: Vec<TriggerPredicate>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Profiles whose allowlist includes this capability.
    pub profiles: BTreeSet<Profile>,
    pub tier: ActivationTier,
}

impl CapabilityDescriptor {
    pub fn new(id: impl Into<String>, tier: ActivationTier) -> Self {
        Self {
            id: CapabilityId::new(id),
            triggers: Vec::new(),
            parameters: Vec::new(),
            profiles: BTreeSet::new(),
            tier,
        }
    }

    pub fn with_trigger(mut self, trigger: TriggerPredicate) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn with_parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn allowed_in(mut self, profile: Profile) -> Self {
        self.profiles.insert(profile);
        self
    }

    /// Whether this capability is allowlisted for the given profile.
    pub fn is_allowed_in(&self, profile: Profile) -> bool {
        self.profiles.contains(&profile)
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Static catalogue of capability descriptors, read-only at run time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityRegistry {
    capabilities: BTreeMap<CapabilityId, CapabilityDescriptor>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from descriptors. Ids are expected to be unique;
    /// the YAML loader rejects duplicates before construction. Should a
    /// duplicate reach here anyway, the last occurrence wins.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = CapabilityDescriptor>) -> Self {
        let capabilities = descriptors
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        Self { capabilities }
    }

    pub fn get(&self, id: &CapabilityId) -> Option<&CapabilityDescriptor> {
        self.capabilities.get(id)
    }

    pub fn contains(&self, id: &CapabilityId) -> bool {
        self.capabilities.contains_key(id)
    }

    /// Iterate descriptors in stable id order.
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.capabilities.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &CapabilityId> {
        self.capabilities.keys()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
