//! Field values with runtime-input and expression decoding
//!
//! Persisted step documents mark deferred fields with the `<+input>` token and
//! embed expressions as `<+...>` strings. [`FieldValue`] decodes those once so
//! downstream code matches on a variant instead of comparing strings.

use serde_json::Value;

/// Literal token marking a field as deferred to runtime
pub const RUNTIME_INPUT: &str = "<+input>";

const EXPRESSION_OPEN: &str = "<+";
const EXPRESSION_CLOSE: char = '>';

/// Decoded form of a raw field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Value fixed at authoring time
    Fixed(Value),

    /// Value supplied at runtime (`<+input>`)
    RuntimeInput(RuntimeInput),

    /// Expression resolved by the pipeline engine (`<+pipeline.variables.x>`)
    Expression(String),
}

/// Modifiers attached to a runtime input token
///
/// `<+input>.default(main).allowedValues(main,dev)` decodes to a default of
/// `main` and allowed values `[main, dev]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuntimeInput {
    /// Value used when none is supplied
    pub default: Option<String>,

    /// Closed set of accepted values (empty = unrestricted)
    pub allowed_values: Vec<String>,

    /// Pattern the supplied value must match
    pub regex: Option<String>,

    /// Requested during execution rather than at trigger time
    pub execution_input: bool,
}

impl RuntimeInput {
    /// Plain `<+input>` with no modifiers
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default value
    #[inline]
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// With allowed values
    #[inline]
    #[must_use]
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Wire representation
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::from(RUNTIME_INPUT);
        if self.execution_input {
            out.push_str(".executionInput()");
        }
        if let Some(default) = &self.default {
            out.push_str(&format!(".default({default})"));
        }
        if !self.allowed_values.is_empty() {
            out.push_str(&format!(".allowedValues({})", self.allowed_values.join(",")));
        }
        if let Some(regex) = &self.regex {
            out.push_str(&format!(".regex({regex})"));
        }
        out
    }

    /// Parse the modifier chain that follows the `<+input>` token
    ///
    /// Unknown or malformed modifiers are ignored; the field stays a runtime
    /// input either way.
    fn parse_modifiers(mut rest: &str) -> Self {
        let mut input = Self::new();
        while let Some(stripped) = rest.strip_prefix('.') {
            let Some(open) = stripped.find('(') else { break };
            let Some(close) = stripped[open..].find(')').map(|c| c + open) else {
                break;
            };
            let name = &stripped[..open];
            let args = &stripped[open + 1..close];
            match name {
                "default" => input.default = Some(args.to_string()),
                "allowedValues" => {
                    input.allowed_values = args
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect();
                }
                "regex" => input.regex = Some(args.to_string()),
                "executionInput" => input.execution_input = true,
                other => tracing::debug!("ignoring unknown runtime input modifier '{}'", other),
            }
            rest = &stripped[close + 1..];
        }
        input
    }
}

impl FieldValue {
    /// Decode a raw JSON value
    #[must_use]
    pub fn decode(raw: &Value) -> Self {
        let Value::String(s) = raw else {
            return Self::Fixed(raw.clone());
        };
        let trimmed = s.trim();
        if let Some(rest) = trimmed.strip_prefix(RUNTIME_INPUT) {
            return Self::RuntimeInput(RuntimeInput::parse_modifiers(rest));
        }
        if trimmed.starts_with(EXPRESSION_OPEN) && trimmed.ends_with(EXPRESSION_CLOSE) {
            return Self::Expression(trimmed.to_string());
        }
        Self::Fixed(raw.clone())
    }

    /// Decode an optional raw value, treating absence as `Fixed(null)`
    #[must_use]
    pub fn decode_opt(raw: Option<&Value>) -> Self {
        raw.map_or(Self::Fixed(Value::Null), Self::decode)
    }

    /// Encode back into the wire representation
    #[must_use]
    pub fn encode(&self) -> Value {
        match self {
            Self::Fixed(v) => v.clone(),
            Self::RuntimeInput(input) => Value::String(input.encode()),
            Self::Expression(expr) => Value::String(expr.clone()),
        }
    }

    /// Check if the value is deferred to runtime
    #[inline]
    #[must_use]
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::RuntimeInput(_))
    }

    /// Check if the value is an expression
    #[inline]
    #[must_use]
    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Expression(_))
    }

    /// Fixed value, if any
    #[inline]
    #[must_use]
    pub fn as_fixed(&self) -> Option<&Value> {
        match self {
            Self::Fixed(v) => Some(v),
            _ => None,
        }
    }

    /// Check if the value counts as "not filled in"
    ///
    /// `null`, empty strings, whitespace-only strings, empty arrays and empty
    /// objects are empty. Runtime inputs and expressions never are.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Fixed(v) => is_empty_value(v),
            Self::RuntimeInput(_) | Self::Expression(_) => false,
        }
    }
}

/// Emptiness test on raw JSON
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Check if a raw value is a runtime input token
#[inline]
#[must_use]
pub fn is_runtime_input(raw: &Value) -> bool {
    FieldValue::decode(raw).is_runtime()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_plain_runtime_input() {
        assert_eq!(
            FieldValue::decode(&json!("<+input>")),
            FieldValue::RuntimeInput(RuntimeInput::new())
        );
    }

    #[test]
    fn decodes_runtime_input_modifiers() {
        let value = FieldValue::decode(&json!("<+input>.default(main).allowedValues(main, dev)"));
        let FieldValue::RuntimeInput(input) = value else {
            panic!("expected runtime input");
        };
        assert_eq!(input.default.as_deref(), Some("main"));
        assert_eq!(input.allowed_values, vec!["main", "dev"]);
    }

    #[test]
    fn decodes_expression_and_fixed() {
        assert_eq!(
            FieldValue::decode(&json!("<+pipeline.variables.url>")),
            FieldValue::Expression("<+pipeline.variables.url>".into())
        );
        assert_eq!(FieldValue::decode(&json!("10m")), FieldValue::Fixed(json!("10m")));
        assert_eq!(FieldValue::decode(&json!(3)), FieldValue::Fixed(json!(3)));
    }

    #[test]
    fn encode_restores_wire_form() {
        let raw = json!("<+input>.default(a).allowedValues(a,b)");
        assert_eq!(FieldValue::decode(&raw).encode(), raw);
        assert_eq!(FieldValue::decode(&json!("<+input>")).encode(), json!(RUNTIME_INPUT));
    }

    #[test]
    fn emptiness() {
        assert!(FieldValue::decode(&json!("")).is_empty());
        assert!(FieldValue::decode(&json!("   ")).is_empty());
        assert!(FieldValue::decode(&json!({})).is_empty());
        assert!(FieldValue::decode_opt(None).is_empty());
        assert!(!FieldValue::decode(&json!(false)).is_empty());
        assert!(!FieldValue::decode(&json!("<+input>")).is_empty());
    }
}
