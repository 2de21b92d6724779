//! Step Model
//!
//! Data model shared by every part of the step plugin framework.
//!
//! # Core Concepts
//!
//! - [`StepTypeId`]: Registry key and persisted `type` discriminant
//! - [`StepDescriptor`]: Static description of a step kind
//! - [`StepFormData`]: One step instance as edited and persisted
//! - [`ViewMode`]: Context a step form is rendered/validated in
//! - [`FieldPath`]: Dot-separated addressing into form data
//! - [`FieldValue`]: Raw values decoded into fixed / runtime input / expression
//! - [`StepTemplate`]: Runtime-overridable subset of a step
//!
//! # Example
//!
//! ```rust
//! use step_model::{FieldPath, StepFormData, StepTemplate, StepTypeId};
//! use serde_json::json;
//!
//! let step = StepFormData::new(StepTypeId::new("Http"))
//!     .with_identifier("call_api")
//!     .with_timeout("<+input>");
//!
//! let template = StepTemplate::from_form_data(&step);
//! assert!(template.is_runtime(&FieldPath::literal("timeout")));
//! ```

#![warn(unreachable_pub)]

// Core modules
mod duration;
mod path;
mod step;
mod strings;
mod template;
mod value;
mod view_mode;

// Re-exports
pub use duration::{format_duration, parse_duration, DurationError, MIN_TIMEOUT};
pub use path::{FieldPath, PathError};
pub use step::{ModelError, StepDescriptor, StepFormData, StepTypeId};
pub use strings::{StringLookup, StringTable};
pub use template::StepTemplate;
pub use value::{is_empty_value, is_runtime_input, FieldValue, RuntimeInput, RUNTIME_INPUT};
pub use view_mode::{UnknownViewMode, ViewMode};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with step data
    pub use crate::{
        FieldPath, FieldValue, StepDescriptor, StepFormData, StepTemplate, StepTypeId,
        StringLookup, StringTable, ViewMode,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
