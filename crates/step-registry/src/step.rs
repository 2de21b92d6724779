//! Step implementation contract
//!
//! Every step kind implements [`StepImplementation`]. Only the descriptor,
//! the form layout and the rule builder are mandatory; rendering, validation
//! and normalization have defaults shared by all steps.

use crate::dispatch::{dispatch, StepRenderProps, StepView};
use crate::field::FieldSpec;
use crate::process::normalize_step;
use step_model::{StepDescriptor, StepFormData, StepTemplate, StepTypeId, StringLookup, ViewMode};
use step_validation::{FieldErrorMap, RuleError, RuleSet, Validator};

/// Capabilities of one step kind
///
/// Implementations are stateless and shared behind `Arc` by the factory, so
/// every method takes `&self` and must be pure.
pub trait StepImplementation: Send + Sync + std::fmt::Debug {
    /// Static description of this step kind
    fn descriptor(&self) -> &StepDescriptor;

    /// Step type key
    fn type_id(&self) -> &StepTypeId {
        &self.descriptor().type_id
    }

    /// Form layout in display order
    ///
    /// May branch on the current values, e.g. to show fields for the chosen
    /// scan mode only.
    fn fields(&self, data: &StepFormData) -> Vec<FieldSpec>;

    /// Step-specific rules for the current values and mode
    ///
    /// Called on every validation; must not cache.
    fn validation_rules(&self, data: &StepFormData, mode: ViewMode) -> RuleSet;

    /// Rules shared by every step (name, identifier, timeout)
    fn base_rules(&self) -> RuleSet {
        RuleSet::step_base_default()
    }

    /// Render for the mode in `props`
    fn render_step(&self, props: &StepRenderProps<'_>) -> StepView {
        dispatch(self, props)
    }

    /// Validate form values for `mode`
    ///
    /// Returns an empty map when the values are valid. Delegates to
    /// [`validate_input_set_with`](Self::validate_input_set_with) with this
    /// step's [`base_rules`](Self::base_rules).
    ///
    /// # Errors
    /// Returns [`RuleError`] only for defects in this step's rules.
    fn validate_input_set(
        &self,
        data: &StepFormData,
        template: &StepTemplate,
        mode: ViewMode,
        strings: &dyn StringLookup,
    ) -> Result<FieldErrorMap, RuleError> {
        self.validate_input_set_with(self.base_rules(), data, template, mode, strings)
    }

    /// Validate form values for `mode` on top of caller-supplied base rules
    ///
    /// Steps with custom validation override this method; every caller,
    /// including the pipeline editor, ends up here.
    ///
    /// # Errors
    /// Returns [`RuleError`] only for defects in the rules.
    fn validate_input_set_with(
        &self,
        base: RuleSet,
        data: &StepFormData,
        template: &StepTemplate,
        mode: ViewMode,
        strings: &dyn StringLookup,
    ) -> Result<FieldErrorMap, RuleError> {
        let rules = base.extend(self.validation_rules(data, mode));
        Validator::new(strings).validate(data, &rules, template, mode)
    }

    /// Normalize values into the persisted shape
    ///
    /// Must be idempotent. The default trims names and drops empty values.
    fn process_form_data(&self, data: &StepFormData) -> StepFormData {
        normalize_step(data)
    }

    /// Values for a freshly added step
    fn default_form_values(&self) -> StepFormData {
        self.descriptor().default_values.clone()
    }
}
