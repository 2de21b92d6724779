//! Form state for one step
//!
//! [`StepForm`] owns the values being edited, reports every change through
//! `on_change`, and on submit validates, normalizes and reports the result
//! through `on_update`.

use crate::dispatch::{StepRenderProps, StepView};
use crate::factory::StepRef;
use serde_json::Value;
use step_model::{FieldPath, ModelError, StepFormData, StepTemplate, StringLookup, ViewMode};
use step_validation::{FieldErrorMap, RuleError};

type Callback<'a> = Box<dyn FnMut(&StepFormData) + 'a>;

/// Result of a submit
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Values were valid; carries the normalized values
    Submitted(StepFormData),
    /// Values were invalid; nothing was reported upstream
    Invalid(FieldErrorMap),
}

impl SubmitOutcome {
    /// Check for a successful submit
    #[inline]
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

/// Editable values of one step
pub struct StepForm<'a> {
    step: StepRef,
    values: StepFormData,
    template: StepTemplate,
    mode: ViewMode,
    strings: &'a dyn StringLookup,
    errors: FieldErrorMap,
    on_change: Option<Callback<'a>>,
    on_update: Option<Callback<'a>>,
}

impl std::fmt::Debug for StepForm<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepForm")
            .field("step_type", self.step.type_id())
            .field("mode", &self.mode)
            .field("values", &self.values)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<'a> StepForm<'a> {
    /// Create form over initial values
    #[must_use]
    pub fn new(
        step: StepRef,
        initial: StepFormData,
        mode: ViewMode,
        strings: &'a dyn StringLookup,
    ) -> Self {
        Self {
            step,
            values: initial,
            template: StepTemplate::empty(),
            mode,
            strings,
            errors: FieldErrorMap::new(),
            on_change: None,
            on_update: None,
        }
    }

    /// With runtime template
    #[must_use]
    pub fn with_template(mut self, template: StepTemplate) -> Self {
        self.template = template;
        self
    }

    /// Called after every field change
    #[must_use]
    pub fn on_change(mut self, callback: impl FnMut(&StepFormData) + 'a) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Called with normalized values after a successful submit
    #[must_use]
    pub fn on_update(mut self, callback: impl FnMut(&StepFormData) + 'a) -> Self {
        self.on_update = Some(Box::new(callback));
        self
    }

    /// Current values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &StepFormData {
        &self.values
    }

    /// Errors from the last validation
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &FieldErrorMap {
        &self.errors
    }

    /// Change one field and notify `on_change`
    ///
    /// # Errors
    /// Returns error if the path cannot hold a value; the values are left
    /// unchanged and no callback fires.
    pub fn set_field_value(&mut self, path: &FieldPath, value: Value) -> Result<(), ModelError> {
        self.values.set(path, value)?;
        if let Some(callback) = self.on_change.as_mut() {
            callback(&self.values);
        }
        Ok(())
    }

    /// Validate current values for the form's mode
    ///
    /// # Errors
    /// Returns [`RuleError`] for defects in the step's rules
    pub fn validate(&mut self) -> Result<&FieldErrorMap, RuleError> {
        self.errors =
            self.step
                .validate_input_set(&self.values, &self.template, self.mode, self.strings)?;
        Ok(&self.errors)
    }

    /// Validate, normalize and report upstream
    ///
    /// `on_update` fires only when the values are valid.
    ///
    /// # Errors
    /// Returns [`RuleError`] for defects in the step's rules
    pub fn submit_form(&mut self) -> Result<SubmitOutcome, RuleError> {
        if !self.validate()?.is_empty() {
            tracing::debug!(
                step = %self.values.identifier,
                error_count = self.errors.len(),
                "submit rejected"
            );
            return Ok(SubmitOutcome::Invalid(self.errors.clone()));
        }

        let processed = self.step.process_form_data(&self.values);
        if let Some(callback) = self.on_update.as_mut() {
            callback(&processed);
        }
        self.values = processed.clone();
        Ok(SubmitOutcome::Submitted(processed))
    }

    /// Render current values
    #[must_use]
    pub fn render(&self, readonly: bool) -> StepView {
        let props = StepRenderProps::new(self.mode, &self.values, &self.template, self.strings)
            .with_readonly(readonly);
        self.step.render_step(&props)
    }
}
