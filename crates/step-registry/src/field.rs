//! Form layout descriptions
//!
//! A step describes its form as an ordered list of [`FieldSpec`]s. The
//! dispatcher turns these into [`FieldView`](crate::FieldView)s for a
//! concrete view mode.

use serde::{Deserialize, Serialize};
use step_model::FieldPath;

/// Input widget for a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetKind {
    /// Single line text
    Text,
    /// Multi-line text
    TextArea,
    /// Identifier derived from the name
    Identifier,
    /// Duration such as `10m`
    Duration,
    /// Numeric input
    Number,
    /// Checkbox
    Checkbox,
    /// Fixed set of options
    Select {
        /// Selectable values
        options: Vec<String>,
    },
    /// Repeating key/value rows
    KeyValueList,
}

impl WidgetKind {
    /// Create select widget
    #[must_use]
    pub fn select<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Select {
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}

/// One field of a step form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Location in the form data
    pub path: FieldPath,

    /// Label string key
    pub label: String,

    /// Widget used in editable views
    pub widget: WidgetKind,
}

impl FieldSpec {
    /// Create field spec
    ///
    /// # Panics
    /// Panics if `path` is not a valid literal path.
    #[must_use]
    pub fn new(path: &str, label: impl Into<String>, widget: WidgetKind) -> Self {
        Self {
            path: FieldPath::literal(path),
            label: label.into(),
            widget,
        }
    }

    /// Text field
    #[inline]
    #[must_use]
    pub fn text(path: &str, label: impl Into<String>) -> Self {
        Self::new(path, label, WidgetKind::Text)
    }

    /// Multi-line text field
    #[inline]
    #[must_use]
    pub fn text_area(path: &str, label: impl Into<String>) -> Self {
        Self::new(path, label, WidgetKind::TextArea)
    }

    /// Checkbox field
    #[inline]
    #[must_use]
    pub fn checkbox(path: &str, label: impl Into<String>) -> Self {
        Self::new(path, label, WidgetKind::Checkbox)
    }

    /// Select field
    #[must_use]
    pub fn select<I, S>(path: &str, label: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(path, label, WidgetKind::select(options))
    }

    /// Common fields every step form starts with
    #[must_use]
    pub fn step_base() -> Vec<Self> {
        vec![
            Self::text("name", "label.name"),
            Self::new("identifier", "label.identifier", WidgetKind::Identifier),
            Self::new("timeout", "label.timeout", WidgetKind::Duration),
        ]
    }
}
