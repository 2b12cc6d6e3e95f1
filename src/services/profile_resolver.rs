//! Profile resolver.
//!
//! Maps a declared profile to the concrete set of capabilities a task may
//! use plus the activation policy the trigger engine must honor. Unknown
//! profile names are an error; there is no fallback profile.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::domain::errors::{OrchestrationError, OrchestrationResult};
use crate::domain::models::{ActivationTier, CapabilityId, CapabilityRegistry, Profile};

/// How capabilities may be activated under a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPolicy {
    /// Only core-tier capabilities activate, deterministically on trigger.
    CoreDeterministic,
    /// Core-tier activates deterministically; suggested-tier capabilities
    /// may additionally be offered.
    SuggestOnly,
}

/// Resolved capability grant for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileGrant {
    pub profile: Profile,
    /// Capabilities the task may reference at all, in stable id order.
    pub allowed: BTreeSet<CapabilityId>,
    pub activation: ActivationPolicy,
}

impl ProfileGrant {
    pub fn permits(&self, id: &CapabilityId) -> bool {
        self.allowed.contains(id)
    }
}

/// Resolves profiles against the loaded capability registry.
#[derive(Debug, Clone)]
pub struct ProfileResolver {
    registry: Arc<CapabilityRegistry>,
}

impl ProfileResolver {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve a raw profile name. Unrecognized names fail; they are never
    /// silently mapped to a default.
    pub fn resolve_name(&self, name: &str) -> OrchestrationResult<ProfileGrant> {
        let profile = Profile::from_str(name)
            .ok_or_else(|| OrchestrationError::UnknownProfile(name.to_string()))?;
        Ok(self.resolve(profile))
    }

    /// Resolve a known profile to its grant.
    pub fn resolve(&self, profile: Profile) -> ProfileGrant {
        let allowed: BTreeSet<CapabilityId> = match profile {
            // Lite: the intersection of the core tier and the Lite
            // allowlist. Suggested-tier capabilities are excluded outright.
            Profile::Lite => self
                .registry
                .iter()
                .filter(|d| d.tier == ActivationTier::Core && d.is_allowed_in(Profile::Lite))
                .map(|d| d.id.clone())
                .collect(),
            Profile::Standard => self
                .registry
                .iter()
                .filter(|d| d.is_allowed_in(Profile::Standard))
                .map(|d| d.id.clone())
                .collect(),
            Profile::Full => self.registry.ids().cloned().collect(),
        };

        let activation = match profile {
            Profile::Lite | Profile::Standard => ActivationPolicy::CoreDeterministic,
            Profile::Full => ActivationPolicy::SuggestOnly,
        };

        debug!(
            profile = profile.as_str(),
            allowed = allowed.len(),
            "profile resolved"
        );

        ProfileGrant {
            profile,
            allowed,
            activation,
        }
    }
}
