//! HTTP call step

use serde_json::json;
use step_model::{StepDescriptor, StepFormData, ViewMode};
use step_registry::{
    drop_blank_rows, normalize_step, prune_empty, FieldSpec, StepImplementation, WidgetKind,
};
use step_validation::{FieldRule, RuleSet};

/// Methods the HTTP step can send
pub const HTTP_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH"];

/// Calls an HTTP endpoint and asserts on the response
#[derive(Debug, Clone)]
pub struct HttpStep {
    descriptor: StepDescriptor,
}

impl Default for HttpStep {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpStep {
    /// Type key
    pub const TYPE: &'static str = "Http";

    /// Create step
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: StepDescriptor::new(Self::TYPE, "HTTP")
                .with_icon("http-step")
                .with_help_text("step.http.help")
                .with_defaults(Some("10s"), json!({"url": "", "method": "GET", "headers": []})),
        }
    }
}

impl StepImplementation for HttpStep {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn fields(&self, _data: &StepFormData) -> Vec<FieldSpec> {
        let mut fields = FieldSpec::step_base();
        fields.extend([
            FieldSpec::text("spec.url", "label.url"),
            FieldSpec::select("spec.method", "label.method", HTTP_METHODS),
            FieldSpec::text_area("spec.requestBody", "label.request_body"),
            FieldSpec::new("spec.headers", "label.headers", WidgetKind::KeyValueList),
            FieldSpec::text_area("spec.assertion", "label.assertion"),
        ]);
        fields
    }

    fn validation_rules(&self, _data: &StepFormData, _mode: ViewMode) -> RuleSet {
        RuleSet::new()
            .with(FieldRule::text("spec.url", "label.url").required())
            .with(FieldRule::one_of("spec.method", "label.method", HTTP_METHODS).required())
            .with(FieldRule::text("spec.requestBody", "label.request_body"))
            .with(FieldRule::list("spec.headers", "label.headers"))
            .with(FieldRule::text("spec.assertion", "label.assertion"))
    }

    fn process_form_data(&self, data: &StepFormData) -> StepFormData {
        let mut out = normalize_step(data);
        if let Some(headers) = out.spec.get_mut("headers") {
            drop_blank_rows(headers);
        }
        // Dropping rows may leave an empty list behind
        prune_empty(&mut out.spec);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use step_model::{StepTemplate, StepTypeId, StringTable};
    use step_registry::StepRenderProps;

    fn call(spec: serde_json::Value) -> StepFormData {
        StepFormData::new(StepTypeId::new(HttpStep::TYPE))
            .with_name("Call API")
            .with_identifier("call_api")
            .with_timeout("30s")
            .with_spec(spec)
    }

    #[test]
    fn url_and_method_required() {
        let strings = StringTable::english();
        let errors = HttpStep::new()
            .validate_input_set(&call(json!({})), &StepTemplate::empty(), ViewMode::Edit, &strings)
            .unwrap();
        assert_eq!(errors.get_str("spec.url"), Some("URL is required"));
        assert!(errors.contains("spec.method"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn unknown_method_rejected() {
        let strings = StringTable::english();
        let errors = HttpStep::new()
            .validate_input_set(
                &call(json!({"url": "https://x", "method": "FETCH"})),
                &StepTemplate::empty(),
                ViewMode::Edit,
                &strings,
            )
            .unwrap();
        assert!(errors.contains("spec.method"));
    }

    #[test]
    fn deferred_header_value_gets_its_own_input() {
        let strings = StringTable::english();
        let step = HttpStep::new();
        let data = call(json!({
            "url": "https://x",
            "method": "GET",
            "headers": [{"key": "X", "value": "<+input>"}],
        }));
        let template = StepTemplate::from_form_data(&data);
        let props = StepRenderProps::new(ViewMode::InputSet, &data, &template, &strings);

        let view = step.render_step(&props);
        let paths: Vec<String> = view.fields().iter().map(|f| f.path.to_string()).collect();
        assert_eq!(paths, vec!["spec.headers.0.value"]);
        let value = view.field("spec.headers.0.value").unwrap();
        assert!(value.editable);
        assert!(value.required);

        let errors = step
            .validate_input_set(&data, &template, ViewMode::InputSet, &strings)
            .unwrap();
        assert_eq!(
            errors.get_str("spec.headers.0.value"),
            Some("spec.headers.0.value is required")
        );
    }

    #[test]
    fn blank_headers_dropped() {
        let data = call(json!({
            "url": "https://x",
            "method": "GET",
            "requestBody": "",
            "headers": [{"key": "", "value": ""}, {"key": "Accept", "value": "json"}],
        }));
        let out = HttpStep::new().process_form_data(&data);
        assert_eq!(
            out.spec,
            json!({
                "url": "https://x",
                "method": "GET",
                "headers": [{"key": "Accept", "value": "json"}],
            })
        );
    }
}
