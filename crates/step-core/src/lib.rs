//! Step Core - Pipeline authoring surface
//!
//! Ties the step registry and the built-in steps to pipeline files: loads
//! configuration and documents, edits stages, validates and renders them for a
//! view mode, and writes the normalized result back.
//!
//! # Core Concepts
//!
//! - **FrameworkConfig**: Registration policy, minimum timeout, debounce window, strings
//! - **PipelineDocument**: YAML/JSON pipeline with unmodelled keys preserved
//! - **PipelineEditor**: Add, remove, validate, render and save steps per stage
//! - **DebouncedOptions**: Latest-wins dropdown option loading
//!
//! # Example
//!
//! ```rust,ignore
//! use step_core::prelude::*;
//!
//! let config = FrameworkConfig::from_file("step.yaml")?;
//! let factory = builtin_factory(&config)?;
//! let document = PipelineDocument::from_file("pipeline.yaml")?;
//!
//! let editor = PipelineEditor::new(factory, document)
//!     .with_strings(config.load_strings()?)
//!     .with_config(config);
//! let report = editor.validate(ViewMode::Edit)?;
//! if report.is_valid() {
//!     std::fs::write("pipeline.yaml", editor.to_yaml()?)?;
//! }
//! ```

#![warn(unreachable_pub)]

// Core modules
mod config;
mod document;
mod editor;
mod error;
mod logging;
mod options;

// Re-exports
pub use config::FrameworkConfig;
pub use document::{Execution, Pipeline, PipelineDocument, Stage, StageEntry, StageSpec, StepEntry};
pub use editor::{PipelineEditor, PipelineReport, RenderedStep, StageReport, UnsupportedStep};
pub use error::{CoreError, Result};
pub use logging::{init_logging, init_logging_from};
pub use options::{DebouncedOptions, OptionLoader, OptionsOutcome, SelectOption};

use std::sync::Arc;
use step_registry::StepFactory;

/// Factory with the configured policy and every built-in step registered
///
/// # Errors
/// Returns error if a built-in step cannot be registered
pub fn builtin_factory(config: &FrameworkConfig) -> Result<Arc<StepFactory>> {
    let factory = StepFactory::new(config.registration_policy);
    step_library::register_builtin_steps(&factory)?;
    Ok(Arc::new(factory))
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for pipeline tooling
    pub use crate::{
        builtin_factory, CoreError, FrameworkConfig, PipelineDocument, PipelineEditor,
        PipelineReport, Result,
    };
    pub use step_model::{StepFormData, StepTypeId, ViewMode};
    pub use step_registry::{StepFactory, StepView};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
