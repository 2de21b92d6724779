//! Runtime templates
//!
//! A template is the step shape with `<+input>` at every field that is
//! deferred to runtime. Runtime-form view modes render and validate exactly
//! those fields.

use crate::path::{FieldPath, PathError};
use crate::step::StepFormData;
use crate::value::{FieldValue, RuntimeInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Runtime-overridable subset of a step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepTemplate(Value);

impl StepTemplate {
    /// Wrap a raw template document
    #[inline]
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Template with no runtime fields
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::Null)
    }

    /// Template derived from authored form data
    ///
    /// Every `<+input>` the author left in the step becomes a runtime field.
    #[must_use]
    pub fn from_form_data(data: &StepFormData) -> Self {
        Self(data.to_value())
    }

    /// Raw template document
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Decoded template value at a path
    ///
    /// # Errors
    /// Returns error if the path descends into a scalar
    pub fn field(&self, path: &FieldPath) -> Result<FieldValue, PathError> {
        Ok(FieldValue::decode_opt(path.lookup(&self.0)?))
    }

    /// Check if a field is deferred to runtime
    ///
    /// A path that descends into a scalar is simply not a runtime field here.
    #[must_use]
    pub fn is_runtime(&self, path: &FieldPath) -> bool {
        self.field(path).is_ok_and(|v| v.is_runtime())
    }

    /// Runtime input modifiers for a field
    #[must_use]
    pub fn runtime_input(&self, path: &FieldPath) -> Option<RuntimeInput> {
        match self.field(path) {
            Ok(FieldValue::RuntimeInput(input)) => Some(input),
            _ => None,
        }
    }

    /// All leaf paths that are runtime inputs, in document order
    #[must_use]
    pub fn runtime_paths(&self) -> Vec<FieldPath> {
        let mut out = Vec::new();
        collect_runtime(&self.0, &mut Vec::new(), &mut out);
        out
    }

    /// Runtime leaves that none of `known` accounts for
    ///
    /// A known path accounts for a leaf when it is the leaf itself, or an
    /// ancestor the template defers whole. A leaf under a fixed ancestor,
    /// such as one header value in a fixed header list, is not accounted for.
    #[must_use]
    pub fn uncovered_runtime_paths<'a, I>(&self, known: I) -> Vec<FieldPath>
    where
        I: IntoIterator<Item = &'a FieldPath>,
    {
        let known: Vec<&FieldPath> = known.into_iter().collect();
        self.runtime_paths()
            .into_iter()
            .filter(|leaf| {
                !known
                    .iter()
                    .any(|k| *k == leaf || (k.is_prefix_of(leaf) && self.is_runtime(k)))
            })
            .collect()
    }

    /// Check if the template defers anything to runtime
    #[must_use]
    pub fn has_runtime_fields(&self) -> bool {
        !self.runtime_paths().is_empty()
    }
}

fn collect_runtime(value: &Value, prefix: &mut Vec<String>, out: &mut Vec<FieldPath>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                prefix.push(key.clone());
                collect_runtime(child, prefix, out);
                prefix.pop();
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                prefix.push(i.to_string());
                collect_runtime(child, prefix, out);
                prefix.pop();
            }
        }
        leaf => {
            if FieldValue::decode(leaf).is_runtime() {
                if let Ok(path) = FieldPath::new(prefix.clone()) {
                    out.push(path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn runtime_detection() {
        let template = StepTemplate::new(json!({"timeout": "<+input>", "spec": {"url": "x"}}));
        assert!(template.is_runtime(&FieldPath::literal("timeout")));
        assert!(!template.is_runtime(&FieldPath::literal("spec.url")));
        assert!(!template.is_runtime(&FieldPath::literal("spec.method")));
    }

    #[test]
    fn fixed_template_has_no_runtime_fields() {
        let template = StepTemplate::new(json!({"timeout": "10m"}));
        assert!(!template.has_runtime_fields());
        assert!(!StepTemplate::empty().has_runtime_fields());
    }

    #[test]
    fn runtime_paths_walks_nested_and_arrays() {
        let template = StepTemplate::new(json!({
            "spec": {
                "auth": {"domain": "<+input>"},
                "headers": [{"key": "a", "value": "<+input>.default(b)"}]
            }
        }));
        let paths: Vec<String> = template.runtime_paths().iter().map(ToString::to_string).collect();
        assert!(paths.contains(&"spec.auth.domain".to_string()));
        assert!(paths.contains(&"spec.headers.0.value".to_string()));
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn leaf_under_fixed_list_is_uncovered() {
        let template = StepTemplate::new(json!({
            "timeout": "<+input>",
            "spec": {"headers": [{"key": "X", "value": "<+input>"}]}
        }));
        let known = [FieldPath::literal("timeout"), FieldPath::literal("spec.headers")];
        let uncovered: Vec<String> = template
            .uncovered_runtime_paths(&known)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(uncovered, vec!["spec.headers.0.value".to_string()]);
    }

    #[test]
    fn list_deferred_whole_covers_itself() {
        let template = StepTemplate::new(json!({"spec": {"headers": "<+input>"}}));
        let known = [FieldPath::literal("spec.headers")];
        assert!(template.uncovered_runtime_paths(&known).is_empty());
    }

    #[test]
    fn runtime_input_modifiers_exposed() {
        let template = StepTemplate::new(json!({"spec": {"method": "<+input>.allowedValues(GET,POST)"}}));
        let input = template.runtime_input(&FieldPath::literal("spec.method")).unwrap();
        assert_eq!(input.allowed_values, vec!["GET", "POST"]);
    }
}
