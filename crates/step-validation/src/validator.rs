//! Generic validator for declarative field rules
//!
//! Interprets a [`RuleSet`] against form data, a runtime template and a view
//! mode, producing a [`FieldErrorMap`]. Validation failures are data; only
//! defects in the rules themselves surface as [`RuleError`].

use crate::errors::{FieldErrorMap, RuleError};
use crate::identifier::{check_identifier_format, IdentifierError};
use crate::rule::{FieldRule, RuleKind, RuleSet};
use serde_json::Value;
use step_model::{
    format_duration, parse_duration, FieldValue, RuntimeInput, StepFormData, StepTemplate,
    StringLookup, ViewMode,
};

static NULL_VALUE: Value = Value::Null;

/// Rule interpreter
///
/// Stateless apart from the string service used to build messages.
#[derive(Clone, Copy)]
pub struct Validator<'s> {
    strings: &'s dyn StringLookup,
}

impl std::fmt::Debug for Validator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

impl<'s> Validator<'s> {
    /// Create validator using `strings` for messages
    #[inline]
    #[must_use]
    pub fn new(strings: &'s dyn StringLookup) -> Self {
        Self { strings }
    }

    /// Validate form data against rules
    ///
    /// - Edit mode checks every active rule.
    /// - Runtime-form modes check only fields the template marks `<+input>`.
    ///   A deferred leaf no rule accounts for must still be filled in.
    /// - `InputVariable` is a read-only listing: only duration minimums apply.
    /// - Outside runtime forms, fields without a rule are never checked.
    ///
    /// # Errors
    /// Returns [`RuleError`] if a rule or its guard cannot be resolved
    /// against the data (a defect in the step's rule configuration).
    pub fn validate(
        &self,
        data: &StepFormData,
        rules: &RuleSet,
        template: &StepTemplate,
        mode: ViewMode,
    ) -> Result<FieldErrorMap, RuleError> {
        let mut errors = FieldErrorMap::new();
        let listing = mode == ViewMode::InputVariable;

        let doc = data.to_value();
        for rule in rules {
            if listing && !matches!(rule.kind, RuleKind::Duration { .. }) {
                continue;
            }
            if let Some(condition) = &rule.depends_on {
                let active = condition.evaluate(&doc).map_err(|e| {
                    tracing::error!("condition on '{}' is malformed: {}", rule.path, e);
                    RuleError::malformed(&rule.path, e)
                })?;
                if !active {
                    continue;
                }
            }

            let runtime = if mode.is_runtime_form() {
                match template.runtime_input(&rule.path) {
                    Some(input) => Some(input),
                    None => continue,
                }
            } else {
                None
            };

            let raw = rule.path.lookup(&doc).map_err(|e| {
                tracing::error!("rule path '{}' is malformed: {}", rule.path, e);
                RuleError::malformed(&rule.path, e)
            })?;

            if let Some(message) = self.check(rule, &FieldValue::decode_opt(raw), runtime.as_ref(), mode) {
                errors.insert(rule.path.clone(), message);
            }
        }

        if mode.is_runtime_form() && mode.enforces_required() {
            for path in template.uncovered_runtime_paths(rules.iter().map(|r| &r.path)) {
                let raw = path.lookup(&doc).ok().flatten();
                let filled = match FieldValue::decode_opt(raw) {
                    FieldValue::RuntimeInput(_) => false,
                    value => !value.is_empty(),
                };
                if !filled {
                    let label = path.to_string();
                    let message = self.strings.get_string("validation.required", &[("label", label.as_str())]);
                    errors.insert(path, message);
                }
            }
        }

        tracing::debug!(
            step = %data.identifier,
            mode = %mode,
            error_count = errors.len(),
            "validated step"
        );
        Ok(errors)
    }

    fn check(
        &self,
        rule: &FieldRule,
        value: &FieldValue,
        runtime: Option<&RuntimeInput>,
        mode: ViewMode,
    ) -> Option<String> {
        let fixed = match value {
            FieldValue::Expression(_) => return None,
            // Still unresolved: fine while authoring, unfilled in a runtime form
            FieldValue::RuntimeInput(_) if !mode.is_runtime_form() => return None,
            FieldValue::RuntimeInput(_) => &NULL_VALUE,
            FieldValue::Fixed(v) => v,
        };

        if value.is_empty() || fixed.is_null() {
            let enforced = mode.enforces_required() && mode != ViewMode::InputVariable;
            return (rule.required && enforced)
                .then(|| self.message(rule, "validation.required", &[]));
        }

        if let Some(input) = runtime.filter(|i| !i.allowed_values.is_empty()) {
            let supplied = scalar_text(fixed);
            if !supplied.as_deref().is_some_and(|s| input.allowed_values.iter().any(|a| a == s)) {
                let options = input.allowed_values.join(", ");
                return Some(self.message(
                    rule,
                    "validation.not_allowed",
                    &[("options", options.as_str())],
                ));
            }
        }

        self.check_kind(rule, fixed)
    }

    fn check_kind(&self, rule: &FieldRule, value: &Value) -> Option<String> {
        match &rule.kind {
            RuleKind::Text => (!value.is_string()).then(|| self.type_mismatch(rule)),
            RuleKind::Identifier => {
                let Some(s) = value.as_str() else {
                    return Some(self.type_mismatch(rule));
                };
                match check_identifier_format(s) {
                    Ok(()) => None,
                    Err(IdentifierError::InvalidFormat(_)) => {
                        Some(self.message(rule, "validation.identifier", &[]))
                    }
                    Err(IdentifierError::Reserved(word)) => Some(self.message(
                        rule,
                        "validation.identifier_reserved",
                        &[("value", word.as_str())],
                    )),
                }
            }
            RuleKind::Duration { min } => {
                let Some(s) = value.as_str() else {
                    return Some(self.type_mismatch(rule));
                };
                match parse_duration(s) {
                    Err(_) => Some(self.message(rule, "validation.invalid_duration", &[])),
                    Ok(d) if d < *min => {
                        let min = format_duration(*min);
                        Some(self.message(rule, "validation.timeout_min", &[("min", min.as_str())]))
                    }
                    Ok(_) => None,
                }
            }
            RuleKind::Number { min, max } => {
                let n = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                let Some(n) = n else {
                    return Some(self.type_mismatch(rule));
                };
                let below = min.is_some_and(|m| n < m);
                let above = max.is_some_and(|m| n > m);
                (below || above).then(|| {
                    let lo = min.map_or_else(|| "-∞".to_string(), |m| m.to_string());
                    let hi = max.map_or_else(|| "∞".to_string(), |m| m.to_string());
                    self.message(rule, "validation.number_range", &[("min", lo.as_str()), ("max", hi.as_str())])
                })
            }
            RuleKind::OneOf(options) => {
                let ok = value.as_str().is_some_and(|s| options.iter().any(|o| o == s));
                (!ok).then(|| {
                    let options = options.join(", ");
                    self.message(rule, "validation.one_of", &[("options", options.as_str())])
                })
            }
            RuleKind::Boolean => {
                let ok = value.is_boolean() || matches!(value.as_str(), Some("true" | "false"));
                (!ok).then(|| self.type_mismatch(rule))
            }
            RuleKind::List => (!value.is_array()).then(|| self.type_mismatch(rule)),
            RuleKind::Map => (!value.is_object()).then(|| self.type_mismatch(rule)),
        }
    }

    fn type_mismatch(&self, rule: &FieldRule) -> String {
        self.message(rule, "validation.type_mismatch", &[("expected", rule.kind.expected_name())])
    }

    fn message(&self, rule: &FieldRule, key: &str, extra: &[(&str, &str)]) -> String {
        let label = self.strings.get_string(&rule.label, &[]);
        let mut vars: Vec<(&str, &str)> = Vec::with_capacity(extra.len() + 1);
        vars.push(("label", label.as_str()));
        vars.extend_from_slice(extra);
        self.strings.get_string(key, &vars)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Condition, FieldRule};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use step_model::{StepTypeId, StringTable, MIN_TIMEOUT};

    fn blank() -> StepFormData {
        StepFormData::new(StepTypeId::new("Http"))
    }

    fn strings() -> StringTable {
        StringTable::english()
    }

    #[test]
    fn blank_step_reports_required_fields() {
        let table = strings();
        let errors = Validator::new(&table)
            .validate(&blank(), &RuleSet::step_base_default(), &StepTemplate::empty(), ViewMode::Edit)
            .unwrap();
        assert_eq!(errors.get_str("name"), Some("Name is required"));
        assert_eq!(errors.get_str("identifier"), Some("Identifier is required"));
        assert_eq!(errors.get_str("timeout"), Some("Timeout is required"));
    }

    #[test]
    fn short_timeout_fails_in_every_mode() {
        let table = strings();
        let data = blank().with_timeout("5s");
        let template = StepTemplate::new(json!({"timeout": "<+input>"}));
        let rules = RuleSet::new().with(FieldRule::duration("timeout", "label.timeout", MIN_TIMEOUT));
        for mode in ViewMode::ALL {
            let errors = Validator::new(&table).validate(&data, &rules, &template, mode).unwrap();
            assert_eq!(
                errors.get_str("timeout"),
                Some("Timeout must be at least 10s"),
                "mode {mode}"
            );
        }
    }

    #[test]
    fn ten_minutes_passes() {
        let table = strings();
        let data = blank().with_timeout("10m");
        let rules = RuleSet::new().with(FieldRule::duration("timeout", "label.timeout", MIN_TIMEOUT));
        let errors = Validator::new(&table)
            .validate(&data, &rules, &StepTemplate::empty(), ViewMode::Edit)
            .unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn invalid_duration_reported() {
        let table = strings();
        let data = blank().with_timeout("soon");
        let rules = RuleSet::new().with(FieldRule::duration("timeout", "label.timeout", Duration::from_secs(1)));
        let errors = Validator::new(&table)
            .validate(&data, &rules, &StepTemplate::empty(), ViewMode::Edit)
            .unwrap();
        assert_eq!(errors.get_str("timeout"), Some("Timeout is not a valid duration"));
    }

    #[test]
    fn runtime_modes_skip_fixed_fields() {
        let table = strings();
        let template = StepTemplate::new(json!({"timeout": "10m", "name": "<+input>"}));
        let errors = Validator::new(&table)
            .validate(&blank(), &RuleSet::step_base_default(), &template, ViewMode::InputSet)
            .unwrap();
        assert!(errors.contains("name"));
        assert!(!errors.contains("timeout"));
        assert!(!errors.contains("identifier"));
    }

    #[test]
    fn template_mode_does_not_enforce_required() {
        let table = strings();
        let template = StepTemplate::new(json!({"spec": {"url": "<+input>"}}));
        let rules = RuleSet::new().with(FieldRule::text("spec.url", "label.url").required());
        let v = Validator::new(&table);
        assert!(v.validate(&blank(), &rules, &template, ViewMode::Template).unwrap().is_empty());
        assert!(v.validate(&blank(), &rules, &template, ViewMode::DeploymentForm).unwrap().contains("spec.url"));
        assert!(v.validate(&blank(), &rules, &template, ViewMode::TriggerForm).unwrap().contains("spec.url"));
    }

    #[test]
    fn unresolved_runtime_input_is_empty_in_runtime_form() {
        let table = strings();
        let data = blank().with_spec(json!({"url": "<+input>"}));
        let template = StepTemplate::new(json!({"spec": {"url": "<+input>"}}));
        let rules = RuleSet::new().with(FieldRule::text("spec.url", "label.url").required());
        let v = Validator::new(&table);
        assert!(v.validate(&data, &rules, &template, ViewMode::InputSet).unwrap().contains("spec.url"));
        assert!(v.validate(&data, &rules, &StepTemplate::empty(), ViewMode::Edit).unwrap().is_empty());
    }

    #[test]
    fn expressions_skip_type_checks() {
        let table = strings();
        let data = blank().with_timeout("<+pipeline.variables.timeout>");
        let rules = RuleSet::step_base_default();
        let errors = Validator::new(&table)
            .validate(&data, &rules, &StepTemplate::empty(), ViewMode::Edit)
            .unwrap();
        assert!(!errors.contains("timeout"));
    }

    #[test]
    fn allowed_values_enforced_in_runtime_form() {
        let table = strings();
        let template = StepTemplate::new(json!({"spec": {"method": "<+input>.allowedValues(GET,POST)"}}));
        let rules = RuleSet::new().with(FieldRule::text("spec.method", "label.method").required());
        let v = Validator::new(&table);
        let bad = blank().with_spec(json!({"method": "PUT"}));
        let good = blank().with_spec(json!({"method": "GET"}));
        assert_eq!(
            v.validate(&bad, &rules, &template, ViewMode::InputSet).unwrap().get_str("spec.method"),
            Some("Method must be one of the allowed values: GET, POST")
        );
        assert!(v.validate(&good, &rules, &template, ViewMode::InputSet).unwrap().is_empty());
    }

    #[test]
    fn conditional_rules_recomputed_per_call() {
        let table = strings();
        let rules = RuleSet::new().when(Condition::equals("spec.mode", "extraction"), |r| {
            r.with(FieldRule::text("spec.auth.domain", "label.auth_domain").required())
        });
        let v = Validator::new(&table);
        let mut data = blank().with_spec(json!({"mode": "ingestion"}));
        assert!(v.validate(&data, &rules, &StepTemplate::empty(), ViewMode::Edit).unwrap().is_empty());
        data.spec = json!({"mode": "extraction"});
        assert!(v
            .validate(&data, &rules, &StepTemplate::empty(), ViewMode::Edit)
            .unwrap()
            .contains("spec.auth.domain"));
    }

    #[test]
    fn unknown_fields_never_block() {
        let table = strings();
        let data = blank().with_spec(json!({"anything": 42, "nested": {"x": null}}));
        let errors = Validator::new(&table)
            .validate(&data, &RuleSet::new(), &StepTemplate::empty(), ViewMode::Edit)
            .unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn malformed_rule_path_is_rule_error() {
        let table = strings();
        let data = blank().with_name("plain");
        let rules = RuleSet::new().with(FieldRule::text("name.first", "label.name"));
        let result = Validator::new(&table).validate(&data, &rules, &StepTemplate::empty(), ViewMode::Edit);
        assert!(matches!(result, Err(RuleError::MalformedPath { .. })));
    }

    #[test]
    fn kind_checks() {
        let table = strings();
        let data = blank().with_spec(json!({
            "n": 200, "choice": "c", "flag": "yes", "items": {}, "obj": []
        }));
        let rules = RuleSet::new()
            .with(FieldRule::number("spec.n", "n", Some(0.0), Some(100.0)))
            .with(FieldRule::one_of("spec.choice", "choice", ["a", "b"]))
            .with(FieldRule::boolean("spec.flag", "flag"))
            .with(FieldRule::list("spec.items", "items"))
            .with(FieldRule::map("spec.obj", "obj"));
        let errors = Validator::new(&table)
            .validate(&data, &rules, &StepTemplate::empty(), ViewMode::Edit)
            .unwrap();
        assert_eq!(errors.get_str("spec.n"), Some("n must be between 0 and 100"));
        assert_eq!(errors.get_str("spec.choice"), Some("choice must be one of: a, b"));
        assert_eq!(errors.get_str("spec.flag"), Some("flag must be a boolean"));
        assert_eq!(errors.get_str("spec.items"), Some("items must be a list"));
        assert_eq!(errors.get_str("spec.obj"), Some("obj must be a map"));
    }

    #[test]
    fn input_variable_mode_skips_required_and_format() {
        let table = strings();
        let data = blank().with_identifier("9 bad").with_timeout("");
        let errors = Validator::new(&table)
            .validate(&data, &RuleSet::step_base_default(), &StepTemplate::empty(), ViewMode::InputVariable)
            .unwrap();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn deferred_leaf_without_rule_is_required_in_runtime_form() {
        let table = strings();
        let data = blank().with_spec(json!({"headers": [{"key": "X", "value": "<+input>"}]}));
        let template = StepTemplate::from_form_data(&data);
        let rules = RuleSet::new().with(FieldRule::list("spec.headers", "label.headers"));
        let v = Validator::new(&table);

        let errors = v.validate(&data, &rules, &template, ViewMode::InputSet).unwrap();
        assert_eq!(
            errors.get_str("spec.headers.0.value"),
            Some("spec.headers.0.value is required")
        );
        assert!(v.validate(&data, &rules, &template, ViewMode::Template).unwrap().is_empty());

        let filled = blank().with_spec(json!({"headers": [{"key": "X", "value": "json"}]}));
        assert!(v.validate(&filled, &rules, &template, ViewMode::InputSet).unwrap().is_empty());
    }

    #[test]
    fn reserved_identifier_message() {
        let table = strings();
        let data = blank().with_identifier("step");
        let rules = RuleSet::new().with(FieldRule::identifier("identifier", "label.identifier"));
        let errors = Validator::new(&table)
            .validate(&data, &rules, &StepTemplate::empty(), ViewMode::Edit)
            .unwrap();
        assert_eq!(
            errors.get_str("identifier"),
            Some("Identifier cannot be the reserved word 'step'")
        );
    }
}
