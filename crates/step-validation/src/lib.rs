//! Step Validation
//!
//! Declarative field rules and the single validator that interprets them.
//!
//! # Overview
//!
//! - **FieldRule / RuleSet**: What to check, built fresh per call by each step
//! - **Condition**: Guards that include a rule only for certain sibling values
//! - **Validator**: View-mode aware interpreter producing a [`FieldErrorMap`]
//! - **Identifier checks**: Slug format and per-stage uniqueness
//!
//! # Example
//!
//! ```rust
//! use step_model::{StepFormData, StepTemplate, StepTypeId, StringTable, ViewMode};
//! use step_validation::{Condition, FieldRule, RuleSet, Validator};
//! use serde_json::json;
//!
//! let rules = RuleSet::step_base_default().when(
//!     Condition::equals("spec.mode", "extraction"),
//!     |r| r.with(FieldRule::text("spec.auth.domain", "label.auth_domain").required()),
//! );
//!
//! let step = StepFormData::new(StepTypeId::new("Sonarqube"))
//!     .with_spec(json!({"mode": "extraction"}));
//!
//! let strings = StringTable::english();
//! let errors = Validator::new(&strings)
//!     .validate(&step, &rules, &StepTemplate::empty(), ViewMode::Edit)
//!     .unwrap();
//! assert!(errors.contains("spec.auth.domain"));
//! ```

#![warn(unreachable_pub)]

// Core modules
mod errors;
mod identifier;
mod rule;
mod validator;

// Re-exports
pub use errors::{FieldErrorMap, RuleError};
pub use identifier::{
    check_identifier_format, find_duplicate_identifiers, identifier_from_name,
    next_free_identifier, DuplicateIdentifier, IdentifierError, RESERVED_IDENTIFIERS,
};
pub use rule::{Condition, FieldRule, RuleKind, RuleSet};
pub use validator::Validator;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for validation
    pub use crate::{Condition, FieldErrorMap, FieldRule, RuleError, RuleKind, RuleSet, Validator};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
