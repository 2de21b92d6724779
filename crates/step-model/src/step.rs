//! Step type identifiers, descriptors and form data

use crate::path::{FieldPath, PathError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Globally unique identifier of a step kind (`"Http"`, `"K8sBlueGreenDeploy"`)
///
/// Registry key and the `type` discriminant in persisted pipelines. Never
/// empty; deserializing an empty `type` fails.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepTypeId(String);

impl StepTypeId {
    /// Create identifier
    ///
    /// # Panics
    /// Panics on an empty identifier; step types are compile-time constants.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        assert!(!id.is_empty(), "step type identifier must not be empty");
        Self(id)
    }

    /// Get identifier string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StepTypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StepTypeId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyStepType);
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for StepTypeId {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StepTypeId> for String {
    fn from(id: StepTypeId) -> Self {
        id.0
    }
}

impl AsRef<str> for StepTypeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Form data of one step instance in a pipeline
///
/// The serialized shape is the persisted step schema:
///
/// ```yaml
/// type: Http
/// identifier: call_api
/// name: Call API
/// timeout: 10m
/// spec:
///   url: https://example.com
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFormData {
    /// Stable slug, unique within a stage
    #[serde(default)]
    pub identifier: String,

    /// Human label
    #[serde(default)]
    pub name: String,

    /// Step kind
    #[serde(rename = "type")]
    pub step_type: StepTypeId,

    /// Timeout duration string (may be a runtime input)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Step-kind-specific record
    #[serde(default = "empty_object")]
    pub spec: Value,

    /// Keys this crate does not model (`when`, `failureStrategies`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl StepFormData {
    /// Create empty form data for a step type
    #[must_use]
    pub fn new(step_type: StepTypeId) -> Self {
        Self {
            identifier: String::new(),
            name: String::new(),
            step_type,
            timeout: None,
            spec: empty_object(),
            extra: Map::new(),
        }
    }

    /// With identifier
    #[inline]
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// With name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// With timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    /// With spec record
    #[inline]
    #[must_use]
    pub fn with_spec(mut self, spec: Value) -> Self {
        self.spec = spec;
        self
    }

    /// Whole form data as a JSON document
    #[must_use]
    pub fn to_value(&self) -> Value {
        // Every field is plain JSON, so conversion cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Build form data from a JSON document
    ///
    /// # Errors
    /// Returns error if the document does not have the step shape
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(ModelError::InvalidShape)
    }

    /// Read a field by path
    ///
    /// # Errors
    /// Returns error if the path descends into a scalar
    pub fn get(&self, path: &FieldPath) -> Result<Option<Value>, PathError> {
        let doc = self.to_value();
        Ok(path.lookup(&doc)?.cloned())
    }

    /// Write a field by path
    ///
    /// # Errors
    /// Returns error if the path is not writable or the result no longer has
    /// the step shape (e.g. a number written to `name`)
    pub fn set(&mut self, path: &FieldPath, value: Value) -> Result<(), ModelError> {
        let mut doc = self.to_value();
        path.insert(&mut doc, value)?;
        *self = Self::from_value(doc)?;
        Ok(())
    }
}

/// Static description of one step kind
///
/// Created once per step implementation and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepDescriptor {
    /// Step kind
    pub type_id: StepTypeId,

    /// Label shown in the step palette
    pub display_name: String,

    /// Icon reference
    pub icon: String,

    /// Values used when a user adds this step
    pub default_values: StepFormData,

    /// String key of the help text
    pub help_text_key: Option<String>,
}

impl StepDescriptor {
    /// Create descriptor with empty defaults
    #[must_use]
    pub fn new(type_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        let type_id = StepTypeId::new(type_id);
        Self {
            default_values: StepFormData::new(type_id.clone()),
            type_id,
            display_name: display_name.into(),
            icon: String::new(),
            help_text_key: None,
        }
    }

    /// With icon
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// With default timeout and spec
    ///
    /// The step type of the defaults always matches the descriptor.
    #[must_use]
    pub fn with_defaults(mut self, timeout: Option<&str>, spec: Value) -> Self {
        self.default_values.timeout = timeout.map(String::from);
        self.default_values.spec = spec;
        self
    }

    /// With help text key
    #[inline]
    #[must_use]
    pub fn with_help_text(mut self, key: impl Into<String>) -> Self {
        self.help_text_key = Some(key.into());
        self
    }
}

/// Data model errors
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Empty step type
    #[error("step type identifier is empty")]
    EmptyStepType,

    /// Path error
    #[error(transparent)]
    Path(#[from] PathError),

    /// Document does not have the step shape
    #[error("invalid step shape: {0}")]
    InvalidShape(#[source] serde_json::Error),
}
