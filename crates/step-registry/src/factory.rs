//! Step factory
//!
//! Maps step type keys to their implementations. The factory is built once
//! at start-up, filled by the bootstrap, and then shared read-mostly by every
//! view that needs a step.

use crate::error::{RegistryError, Result};
use crate::step::StepImplementation;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use step_model::{StepDescriptor, StepTypeId};

/// Shared step implementation
pub type StepRef = Arc<dyn StepImplementation>;

/// What to do when a type key is registered twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// Replace silently
    Lenient,
    /// Replace and log a warning
    #[default]
    Warn,
    /// Reject the second registration
    Strict,
}

/// Result of looking up a step type
#[derive(Debug, Clone)]
pub enum StepLookup {
    /// Registered implementation
    Supported(StepRef),
    /// No implementation; render a placeholder
    Unsupported(StepTypeId),
}

impl StepLookup {
    /// Implementation, if supported
    #[must_use]
    pub fn step(&self) -> Option<&StepRef> {
        match self {
            Self::Supported(step) => Some(step),
            Self::Unsupported(_) => None,
        }
    }

    /// Check if supported
    #[inline]
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }
}

/// Registry of step implementations keyed by type
///
/// Cheap to share behind `Arc`; registration and lookup take `&self`.
pub struct StepFactory {
    steps: RwLock<IndexMap<StepTypeId, StepRef>>,
    policy: RegistrationPolicy,
}

impl Default for StepFactory {
    fn default() -> Self {
        Self::new(RegistrationPolicy::default())
    }
}

impl std::fmt::Debug for StepFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepFactory")
            .field("policy", &self.policy)
            .field("types", &self.type_ids())
            .finish()
    }
}

impl StepFactory {
    /// Create empty factory
    #[must_use]
    pub fn new(policy: RegistrationPolicy) -> Self {
        Self {
            steps: RwLock::new(IndexMap::new()),
            policy,
        }
    }

    /// Registration policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Register a step under its type key
    ///
    /// The last registration for a key wins, except under
    /// [`RegistrationPolicy::Strict`]. Returns the replaced implementation.
    ///
    /// # Errors
    /// Returns [`RegistryError::Duplicate`] if the key is taken and the
    /// policy is strict.
    pub fn register_step(&self, step: StepRef) -> Result<Option<StepRef>> {
        let type_id = step.type_id().clone();
        let mut steps = self.steps.write();

        if let Some(existing) = steps.get(&type_id) {
            match self.policy {
                RegistrationPolicy::Strict => {
                    return Err(RegistryError::Duplicate(type_id));
                }
                RegistrationPolicy::Warn if !Arc::ptr_eq(existing, &step) => {
                    tracing::warn!(step_type = %type_id, "replacing registered step implementation");
                }
                RegistrationPolicy::Warn | RegistrationPolicy::Lenient => {}
            }
        }

        tracing::debug!(step_type = %type_id, "registered step");
        Ok(steps.insert(type_id, step))
    }

    /// Implementation for a type, if registered
    #[must_use]
    pub fn get_step(&self, type_id: &StepTypeId) -> Option<StepRef> {
        self.steps.read().get(type_id).cloned()
    }

    /// Look up a type, reporting unknown types explicitly
    #[must_use]
    pub fn lookup(&self, type_id: &StepTypeId) -> StepLookup {
        match self.get_step(type_id) {
            Some(step) => StepLookup::Supported(step),
            None => {
                tracing::debug!(step_type = %type_id, "step type not registered");
                StepLookup::Unsupported(type_id.clone())
            }
        }
    }

    /// Implementation for a type
    ///
    /// # Errors
    /// Returns [`RegistryError::Unsupported`] if the type is not registered
    pub fn require(&self, type_id: &StepTypeId) -> Result<StepRef> {
        self.get_step(type_id)
            .ok_or_else(|| RegistryError::Unsupported(type_id.clone()))
    }

    /// Remove every registration
    pub fn reset(&self) {
        self.steps.write().clear();
    }

    /// Check if a type is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, type_id: &StepTypeId) -> bool {
        self.steps.read().contains_key(type_id)
    }

    /// Number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.read().len()
    }

    /// Check if nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.read().is_empty()
    }

    /// Registered types in registration order
    #[must_use]
    pub fn type_ids(&self) -> Vec<StepTypeId> {
        self.steps.read().keys().cloned().collect()
    }

    /// Descriptors of every registered step, for the step palette
    #[must_use]
    pub fn descriptors(&self) -> Vec<StepDescriptor> {
        self.steps
            .read()
            .values()
            .map(|s| s.descriptor().clone())
            .collect()
    }
}
