//! Error types for the authoring surface
//!
//! Validation failures are never errors here; they travel as
//! [`FieldErrorMap`](step_validation::FieldErrorMap)s inside reports.

use step_model::ModelError;
use step_registry::RegistryError;
use step_validation::RuleError;

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Step data problem
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Step type lookup or registration failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Defect in a step's rules
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    /// File access failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// No stage with this identifier
    #[error("stage not found: {0}")]
    StageNotFound(String),

    /// No step with this identifier in the stage
    #[error("step '{step}' not found in stage '{stage}'")]
    StepNotFound {
        /// Stage identifier
        stage: String,
        /// Step identifier
        step: String,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Dropdown options could not be loaded
    #[error("failed to load options for '{field}': {message}")]
    OptionsFetch {
        /// Field the options were for
        field: String,
        /// User-visible reason
        message: String,
    },
}

impl CoreError {
    /// Create options fetch error
    #[inline]
    #[must_use]
    pub fn options_fetch(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OptionsFetch {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if retrying the operation may help
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::OptionsFetch { .. } | Self::Io(_))
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
