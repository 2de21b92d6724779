//! SonarQube scanner step

use super::{scanner_fields, scanner_process, scanner_rules, Choice, ScannerTool};
use serde_json::json;
use step_model::{StepDescriptor, StepFormData, ViewMode};
use step_registry::{FieldSpec, StepImplementation};
use step_validation::{Condition, FieldRule, RuleSet};

/// Static analysis through a SonarQube server
#[derive(Debug, Clone)]
pub struct SonarqubeStep {
    descriptor: StepDescriptor,
}

impl Default for SonarqubeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl SonarqubeStep {
    /// Type key
    pub const TYPE: &'static str = "Sonarqube";

    /// Create step
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: StepDescriptor::new(Self::TYPE, "SonarQube")
                .with_icon("sonarqube")
                .with_help_text("step.sonarqube.help")
                .with_defaults(
                    Some("5m"),
                    json!({
                        "mode": "orchestration",
                        "config": "default",
                        "target": {"type": "repository", "name": "", "variant": ""},
                        "advanced": {"log": {"level": "info"}},
                    }),
                ),
        }
    }
}

impl ScannerTool for SonarqubeStep {
    fn tool_fields(&self, data: &StepFormData) -> Vec<FieldSpec> {
        if Choice::of(data, "mode").may_be("extraction") {
            vec![FieldSpec::text("spec.tool.project_key", "label.project_key")]
        } else {
            Vec::new()
        }
    }

    fn tool_rules(&self, rules: RuleSet) -> RuleSet {
        rules.when(Condition::equals("spec.mode", "extraction"), |r| {
            r.with(FieldRule::text("spec.tool.project_key", "label.project_key").required())
        })
    }

    fn stale_sections(&self, data: &StepFormData) -> Vec<&'static str> {
        match Choice::of(data, "mode") {
            Choice::Fixed(mode) if mode != "extraction" => vec!["spec.tool.project_key"],
            _ => Vec::new(),
        }
    }
}

impl StepImplementation for SonarqubeStep {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn fields(&self, data: &StepFormData) -> Vec<FieldSpec> {
        scanner_fields(self, data)
    }

    fn validation_rules(&self, _data: &StepFormData, _mode: ViewMode) -> RuleSet {
        scanner_rules(self)
    }

    fn process_form_data(&self, data: &StepFormData) -> StepFormData {
        scanner_process(self, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use step_model::{StepTemplate, StepTypeId, StringTable};

    #[test]
    fn extraction_requires_project_key() {
        let strings = StringTable::english();
        let data = StepFormData::new(StepTypeId::new(SonarqubeStep::TYPE))
            .with_name("Sonar")
            .with_identifier("sonar")
            .with_timeout("5m")
            .with_spec(json!({
                "mode": "extraction",
                "config": "default",
                "target": {"type": "repository", "name": "app", "variant": "main"},
                "auth": {"domain": "https://sonar.example.com", "access_token": "t"},
            }));
        let errors = SonarqubeStep::new()
            .validate_input_set(&data, &StepTemplate::empty(), ViewMode::Edit, &strings)
            .unwrap();
        assert_eq!(errors.get_str("spec.tool.project_key"), Some("Project Key is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn project_key_field_only_for_extraction() {
        let step = SonarqubeStep::new();
        let fields = step.fields(&step.default_form_values());
        assert!(!fields.iter().any(|f| f.path.to_string() == "spec.tool.project_key"));
    }

    #[test]
    fn deferred_mode_keeps_every_section() {
        let data = SonarqubeStep::new()
            .default_form_values()
            .with_name("Sonar")
            .with_identifier("sonar")
            .with_spec(json!({
                "mode": "<+input>",
                "config": "default",
                "target": {"type": "repository", "name": "app", "variant": "main"},
                "auth": {"domain": "sonar.example.com", "access_token": "tok"},
                "ingestion": {"file": "report.json"},
                "tool": {"project_key": "pk"},
            }));
        let step = SonarqubeStep::new();
        let out = step.process_form_data(&data);
        assert_eq!(out.spec, data.spec);

        let paths: Vec<String> = step.fields(&data).iter().map(|f| f.path.to_string()).collect();
        for path in ["spec.auth.domain", "spec.ingestion.file", "spec.tool.project_key"] {
            assert!(paths.iter().any(|p| p == path), "{path} missing from {paths:?}");
        }
    }

    #[test]
    fn expression_mode_keeps_project_key() {
        let data = SonarqubeStep::new().default_form_values().with_spec(json!({
            "mode": "<+pipeline.variables.scan_mode>",
            "tool": {"project_key": "pk"},
        }));
        let out = SonarqubeStep::new().process_form_data(&data);
        assert_eq!(out.spec["tool"], json!({"project_key": "pk"}));
    }
}
