//! Error types for the step registry

use step_model::StepTypeId;

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No implementation registered for the type
    #[error("step type '{0}' is not registered")]
    Unsupported(StepTypeId),

    /// Type already registered under the strict policy
    #[error("step type '{0}' is already registered")]
    Duplicate(StepTypeId),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
