//! Field error maps and rule errors

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use step_model::{FieldPath, PathError};

/// Field-level validation errors, keyed by path in rule order
///
/// An empty map means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrorMap(IndexMap<FieldPath, String>);

impl FieldErrorMap {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error (first error per field wins)
    pub fn insert(&mut self, path: FieldPath, message: impl Into<String>) {
        self.0.entry(path).or_insert_with(|| message.into());
    }

    /// Error for a field
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Error for a dotted path
    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        path.parse::<FieldPath>().ok().and_then(|p| self.get(&p))
    }

    /// Check if a field has an error
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get_str(path).is_some()
    }

    /// Check if valid
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Merge another map; existing entries are kept
    pub fn merge(&mut self, other: Self) {
        for (path, message) in other.0 {
            self.insert(path, message);
        }
    }

    /// Iterate errors in rule order
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &str)> {
        self.0.iter().map(|(p, m)| (p, m.as_str()))
    }

    /// Failing paths
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.0.keys()
    }
}

impl IntoIterator for FieldErrorMap {
    type Item = (FieldPath, String);
    type IntoIter = indexmap::map::IntoIter<FieldPath, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Defects in a step's own rule configuration
///
/// These are never user input problems; they point at a bug in the step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// Rule or condition path cannot be resolved
    #[error("rule for '{field}' is malformed: {source}")]
    MalformedPath {
        /// Rule path
        field: String,
        /// Underlying path error
        #[source]
        source: PathError,
    },
}

impl RuleError {
    /// Create malformed path error
    #[inline]
    #[must_use]
    pub fn malformed(field: &FieldPath, source: PathError) -> Self {
        Self::MalformedPath {
            field: field.to_string(),
            source,
        }
    }
}
