//! Pipeline editor
//!
//! The authoring surface over a [`PipelineDocument`]: adds, edits and removes
//! steps, validates stages, renders them for a view mode and produces the
//! normalized document for saving.
//!
//! Steps whose type the factory does not know are never an error here. They
//! render as placeholders, are listed in reports, and are saved untouched.

use crate::config::FrameworkConfig;
use crate::document::{PipelineDocument, Stage, StepEntry};
use crate::error::{CoreError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use step_model::{
    FieldPath, StepFormData, StepTemplate, StepTypeId, StringLookup, StringTable, ViewMode,
};
use step_registry::{
    unsupported_view, StepFactory, StepImplementation, StepLookup, StepRenderProps, StepView,
};
use step_validation::{
    check_identifier_format, find_duplicate_identifiers, identifier_from_name,
    next_free_identifier, DuplicateIdentifier, FieldErrorMap, RuleError,
};

/// Step whose type is not registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedStep {
    /// Step identifier
    pub identifier: String,
    /// Unknown type
    pub type_id: StepTypeId,
}

/// Validation result for one stage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageReport {
    /// Stage identifier
    pub stage: String,

    /// Field errors per step; valid steps are omitted
    ///
    /// Keyed by identifier, or `identifier#index` for a step whose identifier
    /// is already taken by an earlier one.
    pub step_errors: IndexMap<String, FieldErrorMap>,

    /// Steps sharing an identifier
    #[serde(skip)]
    pub duplicates: Vec<DuplicateIdentifier>,

    /// Steps that could not be validated
    pub unsupported: Vec<UnsupportedStep>,
}

impl StageReport {
    /// Check if every supported step is valid and identifiers are unique
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.step_errors.is_empty() && self.duplicates.is_empty()
    }

    /// Number of failing fields across steps
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.step_errors.values().map(FieldErrorMap::len).sum()
    }
}

/// Validation result for a whole pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    /// View mode validated for
    pub mode: ViewMode,

    /// Per-stage results in order
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Check if every stage is valid
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.stages.iter().all(StageReport::is_valid)
    }

    /// Number of failing fields across the pipeline
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.stages.iter().map(StageReport::error_count).sum()
    }

    /// Stage result by identifier
    #[must_use]
    pub fn stage(&self, identifier: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == identifier)
    }

    /// Check for steps of unknown types
    #[must_use]
    pub fn has_unsupported(&self) -> bool {
        self.stages.iter().any(|s| !s.unsupported.is_empty())
    }
}

/// Rendered step of a stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedStep {
    /// Step identifier
    pub identifier: String,
    /// View for the requested mode
    pub view: StepView,
}

/// Editor over one pipeline document
pub struct PipelineEditor {
    factory: Arc<StepFactory>,
    config: FrameworkConfig,
    strings: Arc<StringTable>,
    document: PipelineDocument,
}

impl std::fmt::Debug for PipelineEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineEditor")
            .field("pipeline", &self.document.pipeline.identifier)
            .field("step_types", &self.factory.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PipelineEditor {
    /// Create editor with default config and English strings
    #[must_use]
    pub fn new(factory: Arc<StepFactory>, document: PipelineDocument) -> Self {
        Self {
            factory,
            config: FrameworkConfig::default(),
            strings: Arc::new(StringTable::english()),
            document,
        }
    }

    /// With configuration
    #[must_use]
    pub fn with_config(mut self, config: FrameworkConfig) -> Self {
        self.config = config;
        self
    }

    /// With string table
    #[must_use]
    pub fn with_strings(mut self, strings: StringTable) -> Self {
        self.strings = Arc::new(strings);
        self
    }

    /// Current document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &PipelineDocument {
        &self.document
    }

    /// Take the document back
    #[inline]
    #[must_use]
    pub fn into_document(self) -> PipelineDocument {
        self.document
    }

    /// Step factory in use
    #[inline]
    #[must_use]
    pub fn factory(&self) -> &Arc<StepFactory> {
        &self.factory
    }

    fn stage(&self, stage: &str) -> Result<&Stage> {
        self.document
            .stage(stage)
            .ok_or_else(|| CoreError::StageNotFound(stage.to_string()))
    }

    fn stage_mut(&mut self, stage: &str) -> Result<&mut Stage> {
        self.document
            .stage_mut(stage)
            .ok_or_else(|| CoreError::StageNotFound(stage.to_string()))
    }

    /// Step by stage and identifier
    ///
    /// # Errors
    /// Returns error if the stage or step does not exist
    pub fn step(&self, stage: &str, identifier: &str) -> Result<&StepFormData> {
        self.stage(stage)?
            .step(identifier)
            .ok_or_else(|| CoreError::StepNotFound {
                stage: stage.to_string(),
                step: identifier.to_string(),
            })
    }

    /// Append a new step with its type's defaults
    ///
    /// The identifier is the type key, suffixed `_1`, `_2`, ... until it is
    /// unique in the stage. Returns the new identifier.
    ///
    /// # Errors
    /// Returns error if the stage does not exist or the type is not registered
    pub fn add_step(&mut self, stage: &str, type_id: &StepTypeId) -> Result<String> {
        self.insert_step(stage, type_id, None)
    }

    /// Append a new step named by the author
    ///
    /// The identifier is derived from `name` (`"Call API"` becomes
    /// `Call_API`) and made unique the same way as [`add_step`](Self::add_step).
    /// A name that yields no valid identifier falls back to the type key.
    ///
    /// # Errors
    /// Returns error if the stage does not exist or the type is not registered
    pub fn add_named_step(&mut self, stage: &str, type_id: &StepTypeId, name: &str) -> Result<String> {
        self.insert_step(stage, type_id, Some(name))
    }

    fn insert_step(&mut self, stage: &str, type_id: &StepTypeId, name: Option<&str>) -> Result<String> {
        let step = self.factory.require(type_id)?;
        let target = self.stage_mut(stage)?;

        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let base = name
            .map(identifier_from_name)
            .filter(|id| check_identifier_format(id).is_ok())
            .unwrap_or_else(|| type_id.as_str().to_string());
        let identifier = next_free_identifier(&base, target.steps().map(|s| s.identifier.as_str()));

        let mut data = step.default_form_values();
        data.identifier.clone_from(&identifier);
        data.name = name.map_or_else(|| step.descriptor().display_name.clone(), str::to_string);

        target.spec.execution.steps.push(StepEntry { step: data });
        tracing::info!(stage, step = %identifier, step_type = %type_id, "added step");
        Ok(identifier)
    }

    /// Remove a step, returning its values
    ///
    /// # Errors
    /// Returns error if the stage or step does not exist
    pub fn remove_step(&mut self, stage: &str, identifier: &str) -> Result<StepFormData> {
        let target = self.stage_mut(stage)?;
        let index = target.position(identifier).ok_or_else(|| CoreError::StepNotFound {
            stage: stage.to_string(),
            step: identifier.to_string(),
        })?;
        let removed = target.spec.execution.steps.remove(index).step;
        tracing::info!(stage, step = identifier, "removed step");
        Ok(removed)
    }

    /// Replace a step's values
    ///
    /// The new values may carry a different identifier.
    ///
    /// # Errors
    /// Returns error if the stage or step does not exist
    pub fn update_step(&mut self, stage: &str, identifier: &str, data: StepFormData) -> Result<()> {
        let target = self.stage_mut(stage)?;
        let slot = target
            .steps_mut()
            .find(|s| s.identifier == identifier)
            .ok_or_else(|| CoreError::StepNotFound {
                stage: stage.to_string(),
                step: identifier.to_string(),
            })?;
        *slot = data;
        tracing::debug!(stage, step = identifier, "updated step");
        Ok(())
    }

    /// Validate one step's values against its type
    ///
    /// Runs the step's own validation over its base rules, with the
    /// configured minimum timeout in place of the default.
    ///
    /// # Errors
    /// Returns [`RuleError`] for defects in the step's rules
    pub fn validate_step(
        &self,
        step: &dyn StepImplementation,
        data: &StepFormData,
        template: &StepTemplate,
        mode: ViewMode,
    ) -> std::result::Result<FieldErrorMap, RuleError> {
        let base = step.base_rules().with_min_timeout(self.config.min_timeout);
        step.validate_input_set_with(base, data, template, mode, self.strings.as_ref())
    }

    /// Validate every step of a stage
    ///
    /// Runtime-form modes treat each step's own `<+input>` fields as the
    /// template, reporting those still waiting for a value.
    ///
    /// # Errors
    /// Returns error if the stage does not exist or a step's rules are defective
    pub fn validate_stage(&self, stage: &str, mode: ViewMode) -> Result<StageReport> {
        let target = self.stage(stage)?;
        let steps = target.step_list();
        let mut report = StageReport {
            stage: stage.to_string(),
            ..StageReport::default()
        };

        for (index, data) in steps.iter().enumerate() {
            let step = match self.factory.lookup(&data.step_type) {
                StepLookup::Supported(step) => step,
                StepLookup::Unsupported(type_id) => {
                    report.unsupported.push(UnsupportedStep {
                        identifier: data.identifier.clone(),
                        type_id,
                    });
                    continue;
                }
            };
            let template = template_for(data, mode);
            let errors = self.validate_step(step.as_ref(), data, &template, mode)?;
            if !errors.is_empty() {
                let key = report_key(&steps, index);
                report.step_errors.entry(key).or_default().merge(errors);
            }
        }

        report.duplicates = find_duplicate_identifiers(&steps);
        for dup in &report.duplicates {
            let message = self.strings.get_string(
                "validation.duplicate_identifier",
                &[("identifier", dup.identifier.as_str())],
            );
            let key = report_key(&steps, dup.second_index);
            report
                .step_errors
                .entry(key)
                .or_default()
                .insert(FieldPath::literal("identifier"), message);
        }

        tracing::debug!(
            stage,
            mode = %mode,
            errors = report.error_count(),
            duplicates = report.duplicates.len(),
            unsupported = report.unsupported.len(),
            "validated stage"
        );
        Ok(report)
    }

    /// Validate every stage
    ///
    /// # Errors
    /// Returns error if a step's rules are defective
    pub fn validate(&self, mode: ViewMode) -> Result<PipelineReport> {
        let stages = self
            .document
            .stages()
            .map(|s| self.validate_stage(&s.identifier, mode))
            .collect::<Result<Vec<_>>>()?;
        let report = PipelineReport { mode, stages };
        tracing::info!(
            pipeline = %self.document.pipeline.identifier,
            mode = %mode,
            valid = report.is_valid(),
            errors = report.error_count(),
            "validated pipeline"
        );
        Ok(report)
    }

    /// Render every step of a stage
    ///
    /// # Errors
    /// Returns error if the stage does not exist
    pub fn render_stage(&self, stage: &str, mode: ViewMode, readonly: bool) -> Result<Vec<RenderedStep>> {
        let target = self.stage(stage)?;
        let rendered = target
            .steps()
            .map(|data| {
                let view = match self.factory.lookup(&data.step_type) {
                    StepLookup::Supported(step) => {
                        let template = template_for(data, mode);
                        let props = StepRenderProps::new(mode, data, &template, self.strings.as_ref())
                            .with_readonly(readonly);
                        step.render_step(&props)
                    }
                    StepLookup::Unsupported(type_id) => unsupported_view(&type_id),
                };
                RenderedStep {
                    identifier: data.identifier.clone(),
                    view,
                }
            })
            .collect();
        Ok(rendered)
    }

    /// Document with every supported step normalized for saving
    ///
    /// Unsupported steps are kept exactly as loaded.
    #[must_use]
    pub fn processed(&self) -> PipelineDocument {
        let mut out = self.document.clone();
        for entry in &mut out.pipeline.stages {
            for data in entry.stage.steps_mut() {
                match self.factory.get_step(&data.step_type) {
                    Some(step) => *data = step.process_form_data(data),
                    None => tracing::warn!(
                        step = %data.identifier,
                        step_type = %data.step_type,
                        "saving unsupported step untouched"
                    ),
                }
            }
        }
        out
    }

    /// Processed document as YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String> {
        self.processed().to_yaml()
    }

    /// Processed document as JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        self.processed().to_json()
    }
}

fn report_key(steps: &[StepFormData], index: usize) -> String {
    let identifier = &steps[index].identifier;
    if steps[..index].iter().any(|s| &s.identifier == identifier) {
        format!("{identifier}#{index}")
    } else {
        identifier.clone()
    }
}

fn template_for(data: &StepFormData, mode: ViewMode) -> StepTemplate {
    if mode.is_runtime_form() {
        StepTemplate::from_form_data(data)
    } else {
        StepTemplate::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use step_library::register_builtin_steps;
    use step_validation::RuleSet;
    use std::time::Duration;

    fn factory() -> Arc<StepFactory> {
        let factory = Arc::new(StepFactory::default());
        register_builtin_steps(&factory).unwrap();
        factory
    }

    fn editor() -> PipelineEditor {
        let doc = PipelineDocument::new("demo", "Demo").with_stage(Stage::new("build", "CI"));
        PipelineEditor::new(factory(), doc)
    }

    #[test]
    fn add_step_uses_unique_identifiers() {
        let mut editor = editor();
        let http = StepTypeId::new("Http");
        assert_eq!(editor.add_step("build", &http).unwrap(), "Http");
        assert_eq!(editor.add_step("build", &http).unwrap(), "Http_1");

        let step = editor.step("build", "Http_1").unwrap();
        assert_eq!(step.name, "HTTP");
        assert_eq!(step.timeout.as_deref(), Some("10s"));
    }

    #[test]
    fn named_step_derives_identifier() {
        let mut editor = editor();
        let http = StepTypeId::new("Http");
        assert_eq!(editor.add_named_step("build", &http, " Call API #2 ").unwrap(), "Call_API_2");
        assert_eq!(editor.add_named_step("build", &http, "Call API 2").unwrap(), "Call_API_2_1");
        assert_eq!(editor.step("build", "Call_API_2").unwrap().name, "Call API #2");

        // Reserved and empty names fall back to the type key
        assert_eq!(editor.add_named_step("build", &http, "step").unwrap(), "Http");
        assert_eq!(editor.add_named_step("build", &http, "  ").unwrap(), "Http_1");
        assert_eq!(editor.step("build", "Http_1").unwrap().name, "HTTP");
    }

    #[test]
    fn add_unknown_type_fails() {
        let mut editor = editor();
        assert!(matches!(
            editor.add_step("build", &StepTypeId::new("Nope")),
            Err(CoreError::Registry(_))
        ));
        assert!(matches!(
            editor.add_step("missing", &StepTypeId::new("Http")),
            Err(CoreError::StageNotFound(_))
        ));
    }

    #[test]
    fn update_and_remove() {
        let mut editor = editor();
        let id = editor.add_step("build", &StepTypeId::new("Http")).unwrap();
        let mut data = editor.step("build", &id).unwrap().clone();
        data.identifier = "ping".to_string();
        editor.update_step("build", &id, data).unwrap();

        assert!(editor.step("build", "ping").is_ok());
        let removed = editor.remove_step("build", "ping").unwrap();
        assert_eq!(removed.identifier, "ping");
        assert!(matches!(
            editor.remove_step("build", "ping"),
            Err(CoreError::StepNotFound { .. })
        ));
    }

    #[test]
    fn duplicates_reported() {
        let mut editor = editor();
        let id = editor.add_step("build", &StepTypeId::new("Http")).unwrap();
        editor.add_step("build", &StepTypeId::new("Http")).unwrap();
        let mut copy = editor.step("build", &id).unwrap().clone();
        copy.spec = json!({"url": "https://x", "method": "GET"});
        editor.update_step("build", "Http_1", copy).unwrap();

        let report = editor.validate_stage("build", ViewMode::Edit).unwrap();
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(
            report.step_errors["Http#1"].get_str("identifier"),
            Some("Identifier 'Http' is already used in this stage")
        );
        assert!(report.step_errors.contains_key("Http"));
        assert!(!report.is_valid());
    }

    #[test]
    fn configured_min_timeout_applies() {
        let mut editor = editor().with_config(
            FrameworkConfig::new().with_min_timeout(Duration::from_secs(60)),
        );
        let id = editor.add_step("build", &StepTypeId::new("Http")).unwrap();
        let mut data = editor.step("build", &id).unwrap().clone();
        data.spec = json!({"url": "https://x", "method": "GET"});
        data.timeout = Some("30s".to_string());
        editor.update_step("build", &id, data).unwrap();

        let report = editor.validate(ViewMode::Edit).unwrap();
        let errors = &report.stage("build").unwrap().step_errors["Http"];
        assert_eq!(errors.get_str("timeout"), Some("Timeout must be at least 1m"));
    }

    #[derive(Debug)]
    struct Gated {
        descriptor: step_model::StepDescriptor,
    }

    impl StepImplementation for Gated {
        fn descriptor(&self) -> &step_model::StepDescriptor {
            &self.descriptor
        }

        fn fields(&self, _data: &StepFormData) -> Vec<step_registry::FieldSpec> {
            step_registry::FieldSpec::step_base()
        }

        fn validation_rules(&self, _data: &StepFormData, _mode: ViewMode) -> RuleSet {
            RuleSet::new()
        }

        fn validate_input_set_with(
            &self,
            _base: RuleSet,
            _data: &StepFormData,
            _template: &StepTemplate,
            _mode: ViewMode,
            _strings: &dyn StringLookup,
        ) -> std::result::Result<FieldErrorMap, RuleError> {
            let mut errors = FieldErrorMap::new();
            errors.insert(FieldPath::literal("spec.x"), "x is never valid");
            Ok(errors)
        }
    }

    #[test]
    fn custom_step_validation_is_honored() {
        let factory = factory();
        factory
            .register_step(Arc::new(Gated {
                descriptor: step_model::StepDescriptor::new("Gated", "Gated")
                    .with_defaults(Some("10m"), json!({})),
            }))
            .unwrap();
        let doc = PipelineDocument::new("demo", "Demo").with_stage(Stage::new("build", "CI"));
        let mut editor = PipelineEditor::new(factory, doc);
        editor.add_step("build", &StepTypeId::new("Gated")).unwrap();

        let report = editor.validate(ViewMode::Edit).unwrap();
        assert!(!report.is_valid());
        assert_eq!(
            report.stage("build").unwrap().step_errors["Gated"].get_str("spec.x"),
            Some("x is never valid")
        );
    }

    #[test]
    fn unsupported_steps_render_as_placeholders() {
        let mut editor = editor();
        let mut alien = StepFormData::new(StepTypeId::new("FutureStep"));
        alien.identifier = "alien".to_string();
        alien.spec = json!({"anything": [1, 2, 3]});
        editor
            .document
            .stage_mut("build")
            .unwrap()
            .spec
            .execution
            .steps
            .push(StepEntry { step: alien.clone() });

        let rendered = editor.render_stage("build", ViewMode::Edit, false).unwrap();
        assert!(rendered[0].view.is_unsupported());

        let report = editor.validate(ViewMode::Edit).unwrap();
        assert!(report.has_unsupported());

        let saved = editor.processed();
        assert_eq!(saved.stage("build").unwrap().step("alien"), Some(&alien));
    }
}
