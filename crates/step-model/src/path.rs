//! Field paths for addressing values inside step form data
//!
//! Provides [`FieldPath`] for hierarchical addressing of fields such as
//! `spec.tool.project_key` within a step's JSON shape.

use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Dot-separated path to a field in step form data
///
/// Numeric segments index into arrays when the parent value is an array.
///
/// # Examples
/// - `["spec", "auth", "domain"]` → `spec.auth.domain`
/// - `["spec", "headers", "0", "key"]` → `spec.headers.0.key`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Create new path from segments
    ///
    /// # Errors
    /// Returns error if there are no segments or a segment is invalid
    pub fn new(segments: Vec<String>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        for seg in &segments {
            validate_segment(seg)?;
        }
        Ok(Self(segments))
    }

    /// Parse a path, panicking on malformed input
    ///
    /// Intended for paths written as literals in step definitions, where a bad
    /// path is a defect in the step itself.
    ///
    /// # Panics
    /// Panics if `path` is not a valid field path
    #[must_use]
    pub fn literal(path: &str) -> Self {
        match path.parse() {
            Ok(p) => p,
            Err(e) => panic!("invalid field path literal '{path}': {e}"),
        }
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Paths always have at least one segment
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if any)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment
    #[inline]
    #[must_use]
    pub fn last(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Get first segment
    #[inline]
    #[must_use]
    pub fn first(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }

    /// Append a segment, returning new path
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Check if this path is a prefix of another
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Resolve this path inside a JSON value
    ///
    /// Missing keys and `null` intermediates resolve to `Ok(None)`.
    ///
    /// # Errors
    /// Returns [`PathError::NotAContainer`] when the path tries to descend into
    /// a string, number or boolean. That always indicates a malformed path in
    /// a step definition rather than bad user input.
    pub fn lookup<'v>(&self, root: &'v Value) -> Result<Option<&'v Value>, PathError> {
        let mut current = root;
        for (depth, seg) in self.0.iter().enumerate() {
            current = match current {
                Value::Object(map) => match map.get(seg) {
                    Some(v) => v,
                    None => return Ok(None),
                },
                Value::Array(items) => match seg.parse::<usize>().ok().and_then(|i| items.get(i)) {
                    Some(v) => v,
                    None => return Ok(None),
                },
                Value::Null => return Ok(None),
                _ => return Err(self.not_a_container(depth)),
            };
        }
        Ok(Some(current))
    }

    /// Write a value at this path, creating intermediate objects as needed
    ///
    /// # Errors
    /// Returns error if an intermediate value is a scalar, or an array index is
    /// out of bounds
    pub fn insert(&self, root: &mut Value, value: Value) -> Result<(), PathError> {
        let mut current = root;
        for (depth, seg) in self.0.iter().enumerate() {
            let is_last = depth + 1 == self.0.len();
            if current.is_null() {
                *current = Value::Object(Map::new());
            }
            current = match current {
                Value::Object(map) => {
                    if is_last {
                        map.insert(seg.clone(), value);
                        return Ok(());
                    }
                    map.entry(seg.clone()).or_insert(Value::Null)
                }
                Value::Array(items) => {
                    let len = items.len();
                    let idx = seg
                        .parse::<usize>()
                        .ok()
                        .filter(|i| *i < len)
                        .ok_or_else(|| PathError::IndexOutOfBounds {
                            path: self.to_string(),
                            index: seg.clone(),
                        })?;
                    if is_last {
                        items[idx] = value;
                        return Ok(());
                    }
                    &mut items[idx]
                }
                _ => return Err(self.not_a_container(depth)),
            };
        }
        Ok(())
    }

    /// Remove the value at this path, returning it
    pub fn remove(&self, root: &mut Value) -> Option<Value> {
        let (last, parents) = self.0.split_last()?;
        let mut current = root;
        for seg in parents {
            current = match current {
                Value::Object(map) => map.get_mut(seg)?,
                Value::Array(items) => items.get_mut(seg.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        match current {
            Value::Object(map) => map.remove(last),
            Value::Array(items) => {
                let idx = last.parse::<usize>().ok().filter(|i| *i < items.len())?;
                Some(items.remove(idx))
            }
            _ => None,
        }
    }

    fn not_a_container(&self, depth: usize) -> PathError {
        PathError::NotAContainer {
            path: self.to_string(),
            at: self.0[..depth].join("."),
        }
    }
}

fn validate_segment(seg: &str) -> Result<(), PathError> {
    if seg.is_empty() {
        Err(PathError::EmptySegment)
    } else if seg.contains(|c: char| !c.is_alphanumeric() && c != '_' && c != '-') {
        Err(PathError::InvalidSegment(seg.to_string()))
    } else {
        Ok(())
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let segments: Vec<String> = s
            .split('.')
            .map(|seg| validate_segment(seg).map(|()| seg.to_string()))
            .collect::<Result<_, _>>()?;
        Ok(Self(segments))
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// Errors related to field paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path has no segments
    #[error("field path is empty")]
    Empty,

    /// Empty segment in path
    #[error("field path contains empty segment")]
    EmptySegment,

    /// Invalid segment characters
    #[error("invalid segment: {0} (must be alphanumeric, '_' or '-')")]
    InvalidSegment(String),

    /// Path descends into a scalar value
    #[error("field path '{path}' descends into a non-container value at '{at}'")]
    NotAContainer {
        /// Full path
        path: String,
        /// Prefix that resolved to a scalar
        at: String,
    },

    /// Array index missing or out of range on write
    #[error("field path '{path}' has invalid array index '{index}'")]
    IndexOutOfBounds {
        /// Full path
        path: String,
        /// Offending segment
        index: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_parse_and_display() {
        let path = FieldPath::from_str("spec.tool.project_key").unwrap();
        assert_eq!(path.segments(), &["spec", "tool", "project_key"]);
        assert_eq!(path.to_string(), "spec.tool.project_key");
        assert_eq!(path.first(), "spec");
        assert_eq!(path.last(), "project_key");
    }

    #[test]
    fn path_rejects_malformed() {
        assert_eq!(FieldPath::from_str(""), Err(PathError::Empty));
        assert_eq!(FieldPath::from_str("spec..url"), Err(PathError::EmptySegment));
        assert!(matches!(
            FieldPath::from_str("spec.u rl"),
            Err(PathError::InvalidSegment(_))
        ));
    }

    #[test]
    fn path_parent_and_child() {
        let path = FieldPath::literal("spec.auth");
        assert_eq!(path.child("domain").to_string(), "spec.auth.domain");
        assert_eq!(path.parent().unwrap().to_string(), "spec");
        assert!(FieldPath::literal("spec").parent().is_none());
        assert!(path.is_prefix_of(&path.child("domain")));
    }

    #[test]
    fn lookup_resolves_nested_and_arrays() {
        let doc = json!({"spec": {"headers": [{"key": "a"}], "url": "x"}});
        assert_eq!(
            FieldPath::literal("spec.headers.0.key").lookup(&doc).unwrap(),
            Some(&json!("a"))
        );
        assert_eq!(FieldPath::literal("spec.missing").lookup(&doc).unwrap(), None);
        assert_eq!(FieldPath::literal("spec.headers.7").lookup(&doc).unwrap(), None);
    }

    #[test]
    fn lookup_into_scalar_is_error() {
        let doc = json!({"name": "step"});
        let err = FieldPath::literal("name.first").lookup(&doc).unwrap_err();
        assert!(matches!(err, PathError::NotAContainer { .. }));
    }

    #[test]
    fn insert_creates_intermediates() {
        let mut doc = json!({"spec": null});
        FieldPath::literal("spec.auth.domain")
            .insert(&mut doc, json!("example.com"))
            .unwrap();
        assert_eq!(doc, json!({"spec": {"auth": {"domain": "example.com"}}}));
    }

    #[test]
    fn insert_into_array_checks_bounds() {
        let mut doc = json!({"list": [1, 2]});
        FieldPath::literal("list.1").insert(&mut doc, json!(5)).unwrap();
        assert_eq!(doc, json!({"list": [1, 5]}));
        assert!(FieldPath::literal("list.4").insert(&mut doc, json!(1)).is_err());
    }

    #[test]
    fn remove_returns_value() {
        let mut doc = json!({"spec": {"a": 1, "b": 2}});
        assert_eq!(FieldPath::literal("spec.a").remove(&mut doc), Some(json!(1)));
        assert_eq!(doc, json!({"spec": {"b": 2}}));
        assert_eq!(FieldPath::literal("spec.zzz").remove(&mut doc), None);
    }

    #[test]
    fn serde_as_string() {
        let path = FieldPath::literal("spec.url");
        let encoded = serde_json::to_string(&path).unwrap();
        assert_eq!(encoded, "\"spec.url\"");
        let decoded: FieldPath = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, path);
    }
}
