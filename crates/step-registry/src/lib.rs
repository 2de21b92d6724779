//! Step Registry
//!
//! The contract every step kind implements and the machinery around it.
//!
//! # Core Concepts
//!
//! - **StepImplementation**: Descriptor, form layout, rules, render, validate, normalize
//! - **StepFactory**: Type key to implementation registry with explicit misses
//! - **Dispatcher**: View mode to [`StepView`] selection
//! - **StepForm**: Edit/submit cycle with `on_change` and `on_update`
//!
//! # Example
//!
//! ```rust,ignore
//! use step_registry::{StepFactory, StepLookup, StepRenderProps};
//!
//! let factory = StepFactory::default();
//! factory.register_step(Arc::new(HttpStep::new()))?;
//!
//! let view = match factory.lookup(&data.step_type) {
//!     StepLookup::Supported(step) => step.render_step(&props),
//!     StepLookup::Unsupported(type_id) => unsupported_view(&type_id),
//! };
//! ```

#![warn(unreachable_pub)]

// Core modules
mod dispatch;
mod error;
mod factory;
mod field;
mod form;
mod process;
mod step;

// Re-exports
pub use dispatch::{
    dispatch, unsupported_view, AllowableType, FieldView, StepRenderProps, StepView,
    VariableEntry,
};
pub use error::{RegistryError, Result};
pub use factory::{RegistrationPolicy, StepFactory, StepLookup, StepRef};
pub use field::{FieldSpec, WidgetKind};
pub use form::{StepForm, SubmitOutcome};
pub use process::{drop_blank_rows, normalize_step, prune_empty, strip_paths};
pub use step::StepImplementation;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for step implementations
    pub use crate::{
        FieldSpec, StepFactory, StepImplementation, StepLookup, StepRef, StepRenderProps,
        StepView, WidgetKind,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
