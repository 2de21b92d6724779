//! Declarative field rules
//!
//! Steps describe what to check as data: a [`RuleSet`] of [`FieldRule`]s,
//! some guarded by a [`Condition`] on sibling fields. The [`Validator`] is the
//! only thing that interprets them.
//!
//! [`Validator`]: crate::Validator

use serde_json::Value;
use std::time::Duration;
use step_model::{FieldPath, FieldValue, PathError, MIN_TIMEOUT};

/// What kind of value a field holds
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Free text
    Text,

    /// Identifier slug (`^[a-zA-Z_][0-9a-zA-Z_]*$`, not reserved)
    Identifier,

    /// Duration string with a lower bound
    Duration {
        /// Smallest accepted duration
        min: Duration,
    },

    /// Number (or numeric string) within optional bounds
    Number {
        /// Lower bound, inclusive
        min: Option<f64>,
        /// Upper bound, inclusive
        max: Option<f64>,
    },

    /// One of a closed set of strings
    OneOf(Vec<String>),

    /// Boolean (or `"true"`/`"false"`)
    Boolean,

    /// Array
    List,

    /// Object
    Map,
}

impl RuleKind {
    /// Name used in type mismatch messages
    #[must_use]
    pub fn expected_name(&self) -> &'static str {
        match self {
            Self::Text | Self::Identifier | Self::OneOf(_) => "string",
            Self::Duration { .. } => "duration",
            Self::Number { .. } => "number",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Map => "map",
        }
    }
}

/// One entry of a field validation config
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    /// Field to check
    pub path: FieldPath,

    /// String key of the field label
    pub label: String,

    /// Expected value kind
    pub kind: RuleKind,

    /// Whether an empty value is an error
    pub required: bool,

    /// Rule applies only while this holds
    pub depends_on: Option<Condition>,
}

impl FieldRule {
    /// Create optional rule
    ///
    /// # Panics
    /// Panics if `path` is not a valid field path literal
    #[must_use]
    pub fn new(path: &str, label: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            path: FieldPath::literal(path),
            label: label.into(),
            kind,
            required: false,
            depends_on: None,
        }
    }

    /// Text field
    #[must_use]
    pub fn text(path: &str, label: impl Into<String>) -> Self {
        Self::new(path, label, RuleKind::Text)
    }

    /// Identifier field
    #[must_use]
    pub fn identifier(path: &str, label: impl Into<String>) -> Self {
        Self::new(path, label, RuleKind::Identifier)
    }

    /// Duration field with minimum
    #[must_use]
    pub fn duration(path: &str, label: impl Into<String>, min: Duration) -> Self {
        Self::new(path, label, RuleKind::Duration { min })
    }

    /// Closed-choice field
    #[must_use]
    pub fn one_of<I, S>(path: &str, label: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(path, label, RuleKind::OneOf(options.into_iter().map(Into::into).collect()))
    }

    /// Numeric field
    #[must_use]
    pub fn number(path: &str, label: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(path, label, RuleKind::Number { min, max })
    }

    /// Boolean field
    #[must_use]
    pub fn boolean(path: &str, label: impl Into<String>) -> Self {
        Self::new(path, label, RuleKind::Boolean)
    }

    /// List field
    #[must_use]
    pub fn list(path: &str, label: impl Into<String>) -> Self {
        Self::new(path, label, RuleKind::List)
    }

    /// Map field
    #[must_use]
    pub fn map(path: &str, label: impl Into<String>) -> Self {
        Self::new(path, label, RuleKind::Map)
    }

    /// Mark as required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Guard with a condition (combined with any existing guard)
    #[must_use]
    pub fn depends_on(mut self, condition: Condition) -> Self {
        self.depends_on = Some(match self.depends_on.take() {
            Some(existing) => Condition::All(vec![existing, condition]),
            None => condition,
        });
        self
    }
}

/// Predicate over sibling field values
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals value
    Equals(FieldPath, Value),

    /// Field does not equal value
    NotEquals(FieldPath, Value),

    /// Field equals one of the values
    OneOf(FieldPath, Vec<Value>),

    /// Field is a runtime input
    IsRuntime(FieldPath),

    /// Field is present and not empty
    IsSet(FieldPath),

    /// All conditions hold
    All(Vec<Condition>),

    /// At least one condition holds
    Any(Vec<Condition>),

    /// Condition does not hold
    Not(Box<Condition>),
}

impl Condition {
    /// `path == value`
    #[must_use]
    pub fn equals(path: &str, value: impl Into<Value>) -> Self {
        Self::Equals(FieldPath::literal(path), value.into())
    }

    /// `path != value`
    #[must_use]
    pub fn not_equals(path: &str, value: impl Into<Value>) -> Self {
        Self::NotEquals(FieldPath::literal(path), value.into())
    }

    /// `path in values`
    #[must_use]
    pub fn one_of<I, V>(path: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::OneOf(FieldPath::literal(path), values.into_iter().map(Into::into).collect())
    }

    /// `path` is set
    #[must_use]
    pub fn is_set(path: &str) -> Self {
        Self::IsSet(FieldPath::literal(path))
    }

    /// Negation
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(condition: Self) -> Self {
        Self::Not(Box::new(condition))
    }

    /// Evaluate against a form data document
    ///
    /// # Errors
    /// Returns error if a referenced path descends into a scalar
    pub fn evaluate(&self, doc: &Value) -> Result<bool, PathError> {
        Ok(match self {
            Self::Equals(path, expected) => path.lookup(doc)? == Some(expected),
            Self::NotEquals(path, expected) => path.lookup(doc)? != Some(expected),
            Self::OneOf(path, values) => path
                .lookup(doc)?
                .is_some_and(|actual| values.contains(actual)),
            Self::IsRuntime(path) => FieldValue::decode_opt(path.lookup(doc)?).is_runtime(),
            Self::IsSet(path) => !FieldValue::decode_opt(path.lookup(doc)?).is_empty(),
            Self::All(conditions) => {
                for c in conditions {
                    if !c.evaluate(doc)? {
                        return Ok(false);
                    }
                }
                true
            }
            Self::Any(conditions) => {
                for c in conditions {
                    if c.evaluate(doc)? {
                        return Ok(true);
                    }
                }
                false
            }
            Self::Not(inner) => !inner.evaluate(doc)?,
        })
    }
}

/// Ordered field validation config
///
/// Built fresh by a step for every validation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl RuleSet {
    /// Create empty rule set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules every step carries: name, identifier and timeout
    #[must_use]
    pub fn step_base(min_timeout: Duration) -> Self {
        Self::new()
            .with(FieldRule::text("name", "label.name").required())
            .with(FieldRule::identifier("identifier", "label.identifier").required())
            .with(FieldRule::duration("timeout", "label.timeout", min_timeout).required())
    }

    /// Base rules with the default minimum timeout
    #[must_use]
    pub fn step_base_default() -> Self {
        Self::step_base(MIN_TIMEOUT)
    }

    /// Replace the lower bound of every `timeout` duration rule
    ///
    /// Rule sets without a timeout rule come back unchanged.
    #[must_use]
    pub fn with_min_timeout(mut self, min_timeout: Duration) -> Self {
        for rule in &mut self.rules {
            if rule.path.segments() == ["timeout"] {
                if let RuleKind::Duration { min } = &mut rule.kind {
                    *min = min_timeout;
                }
            }
        }
        self
    }

    /// Append a rule
    pub fn push(&mut self, rule: FieldRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Append a rule (builder form)
    #[inline]
    #[must_use]
    pub fn with(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append rules that apply only while `condition` holds
    #[must_use]
    pub fn when(mut self, condition: Condition, build: impl FnOnce(Self) -> Self) -> Self {
        let guarded = build(Self::new());
        self.rules.extend(
            guarded
                .rules
                .into_iter()
                .map(|rule| rule.depends_on(condition.clone())),
        );
        self
    }

    /// Append all rules of another set
    #[must_use]
    pub fn extend(mut self, other: Self) -> Self {
        self.rules.extend(other.rules);
        self
    }

    /// Iterate rules in order
    pub fn iter(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter()
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule for a path, if any
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&FieldRule> {
        self.rules.iter().find(|r| &r.path == path)
    }

    /// Paths covered by rules whose guard holds for `doc`
    ///
    /// # Errors
    /// Returns error if a guard references a path through a scalar
    pub fn active_paths(&self, doc: &Value) -> Result<Vec<&FieldPath>, PathError> {
        let mut out = Vec::new();
        for rule in &self.rules {
            let active = match &rule.depends_on {
                Some(c) => c.evaluate(doc)?,
                None => true,
            };
            if active {
                out.push(&rule.path);
            }
        }
        Ok(out)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a FieldRule;
    type IntoIter = std::slice::Iter<'a, FieldRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_builders() {
        let rule = FieldRule::text("spec.url", "label.url").required();
        assert!(rule.required);
        assert_eq!(rule.path.to_string(), "spec.url");
        assert_eq!(rule.kind.expected_name(), "string");
    }

    #[test]
    fn min_timeout_replaced_on_timeout_rule_only() {
        let rules = RuleSet::step_base_default()
            .with(FieldRule::duration("spec.poll", "label.poll", Duration::from_secs(1)))
            .with_min_timeout(Duration::from_secs(60));
        let timeout = rules.get(&FieldPath::literal("timeout")).unwrap();
        assert_eq!(timeout.kind, RuleKind::Duration { min: Duration::from_secs(60) });
        assert!(timeout.required);
        let poll = rules.get(&FieldPath::literal("spec.poll")).unwrap();
        assert_eq!(poll.kind, RuleKind::Duration { min: Duration::from_secs(1) });

        assert!(RuleSet::new().with_min_timeout(Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn condition_equals_and_one_of() {
        let doc = json!({"spec": {"mode": "extraction"}});
        assert!(Condition::equals("spec.mode", "extraction").evaluate(&doc).unwrap());
        assert!(!Condition::equals("spec.mode", "ingestion").evaluate(&doc).unwrap());
        assert!(Condition::one_of("spec.mode", ["orchestration", "extraction"])
            .evaluate(&doc)
            .unwrap());
        assert!(Condition::not_equals("spec.missing", "x").evaluate(&doc).unwrap());
    }

    #[test]
    fn condition_combinators() {
        let doc = json!({"a": 1, "b": "<+input>"});
        let c = Condition::All(vec![
            Condition::equals("a", 1),
            Condition::IsRuntime(FieldPath::literal("b")),
        ]);
        assert!(c.evaluate(&doc).unwrap());
        assert!(!Condition::not(c).evaluate(&doc).unwrap());
        assert!(Condition::Any(vec![Condition::is_set("zzz"), Condition::is_set("a")])
            .evaluate(&doc)
            .unwrap());
    }

    #[test]
    fn when_guards_each_rule() {
        let rules = RuleSet::new().when(Condition::equals("spec.mode", "extraction"), |r| {
            r.with(FieldRule::text("spec.auth.domain", "label.auth_domain").required())
        });
        let rule = rules.iter().next().unwrap();
        assert!(rule.depends_on.is_some());

        let extraction = json!({"spec": {"mode": "extraction"}});
        let ingestion = json!({"spec": {"mode": "ingestion"}});
        assert_eq!(rules.active_paths(&extraction).unwrap().len(), 1);
        assert!(rules.active_paths(&ingestion).unwrap().is_empty());
    }

    #[test]
    fn nested_when_combines_guards() {
        let rules = RuleSet::new().when(Condition::equals("a", 1), |r| {
            r.when(Condition::equals("b", 2), |r| r.with(FieldRule::text("c", "c")))
        });
        assert!(rules.active_paths(&json!({"a": 1, "b": 2})).unwrap().len() == 1);
        assert!(rules.active_paths(&json!({"a": 1, "b": 3})).unwrap().is_empty());
    }

    #[test]
    fn step_base_contains_common_fields() {
        let base = RuleSet::step_base_default();
        assert_eq!(base.len(), 3);
        assert!(base.get(&FieldPath::literal("timeout")).is_some());
    }
}
