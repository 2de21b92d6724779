//! Form data normalization helpers
//!
//! Building blocks for `process_form_data`. All helpers are pure and
//! idempotent: applying them twice gives the same result as applying once.

use serde_json::Value;
use step_model::{is_empty_value, FieldPath, StepFormData};

/// Recursively drop empty entries from objects and arrays
///
/// Children are pruned before their parent is tested, so an object that only
/// held empty values disappears in the same pass. Booleans and numbers are
/// never empty; `<+input>` and expressions are kept.
pub fn prune_empty(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                prune_empty(child);
            }
            map.retain(|_, v| !is_empty_value(v));
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                prune_empty(item);
            }
            items.retain(|v| !is_empty_value(v));
        }
        _ => {}
    }
}

/// Trim top-level text fields and prune `spec`
///
/// A blank timeout is removed entirely. `extra` keys are left untouched.
#[must_use]
pub fn normalize_step(data: &StepFormData) -> StepFormData {
    let mut out = data.clone();
    out.name = out.name.trim().to_string();
    out.identifier = out.identifier.trim().to_string();
    out.timeout = out
        .timeout
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);
    prune_empty(&mut out.spec);
    if !out.spec.is_object() && is_empty_value(&out.spec) {
        out.spec = Value::Object(serde_json::Map::new());
    }
    out
}

/// Remove UI-only keys below `spec`
///
/// Paths are relative to the form data root. Missing paths are ignored.
pub fn strip_paths(data: &mut StepFormData, paths: &[&str]) {
    let mut doc = data.to_value();
    for raw in paths {
        if let Ok(path) = raw.parse::<FieldPath>() {
            path.remove(&mut doc);
        }
    }
    match StepFormData::from_value(doc) {
        Ok(stripped) => *data = stripped,
        Err(e) => tracing::warn!("could not strip UI keys from '{}': {}", data.identifier, e),
    }
}

/// Drop rows whose `key` or `value` is blank from a key/value list
pub fn drop_blank_rows(list: &mut Value) {
    if let Value::Array(rows) = list {
        rows.retain(|row| {
            let blank = |field: &str| row.get(field).map_or(true, is_empty_value);
            !blank("key") && !blank("value")
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use step_model::StepTypeId;

    #[test]
    fn prune_removes_nested_empties() {
        let mut v = json!({
            "a": "",
            "b": {"c": null, "d": []},
            "e": false,
            "f": "<+input>",
            "g": [{"x": ""}, 1],
        });
        prune_empty(&mut v);
        assert_eq!(v, json!({"e": false, "f": "<+input>", "g": [1]}));
    }

    #[test]
    fn normalize_trims_and_drops_blank_timeout() {
        let data = StepFormData::new(StepTypeId::new("Http"))
            .with_name("  Call API ")
            .with_identifier(" call_api")
            .with_timeout("  ")
            .with_spec(json!({"url": "https://x", "requestBody": ""}));
        let out = normalize_step(&data);
        assert_eq!(out.name, "Call API");
        assert_eq!(out.identifier, "call_api");
        assert_eq!(out.timeout, None);
        assert_eq!(out.spec, json!({"url": "https://x"}));
        assert_eq!(normalize_step(&out), out);
    }

    #[test]
    fn strip_removes_only_named_keys() {
        let mut data = StepFormData::new(StepTypeId::new("Sonarqube"))
            .with_spec(json!({"advanced": {"uiExpanded": true, "log": {"level": "info"}}}));
        strip_paths(&mut data, &["spec.advanced.uiExpanded", "spec.missing"]);
        assert_eq!(data.spec, json!({"advanced": {"log": {"level": "info"}}}));
    }

    #[test]
    fn blank_rows_dropped() {
        let mut headers = json!([
            {"key": "Accept", "value": "json"},
            {"key": "", "value": "x"},
            {"key": "X-Id"},
        ]);
        drop_blank_rows(&mut headers);
        assert_eq!(headers, json!([{"key": "Accept", "value": "json"}]));
    }
}
