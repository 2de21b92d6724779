//! View-mode dispatch
//!
//! Turns a step's form layout into a renderable [`StepView`] for one view
//! mode. The view is a plain data model; any front end can draw it.
//!
//! # Dispatch
//!
//! | Mode | View |
//! |------|------|
//! | `Edit` | every field of the step form |
//! | `InputSet`, `Template`, `DeploymentForm`, `TriggerForm` | only fields the template marks `<+input>` |
//! | `InputVariable` | read-only listing of every leaf value |

use crate::field::{FieldSpec, WidgetKind};
use crate::step::StepImplementation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use step_model::{
    FieldPath, FieldValue, StepFormData, StepTemplate, StepTypeId, StringLookup, ViewMode,
};

/// Value kinds a field may switch between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllowableType {
    /// Literal value
    Fixed,
    /// `<+input>`
    Runtime,
    /// `<+...>` expression
    Expression,
}

impl AllowableType {
    /// Every kind
    pub const ALL: [Self; 3] = [Self::Fixed, Self::Runtime, Self::Expression];
}

/// Inputs to a single render
pub struct StepRenderProps<'a> {
    /// View mode
    pub mode: ViewMode,

    /// Current form values
    pub data: &'a StepFormData,

    /// Runtime template (ignored in `Edit`)
    pub template: &'a StepTemplate,

    /// Disable all inputs
    pub readonly: bool,

    /// Value kinds offered to the user
    pub allowable_types: Vec<AllowableType>,

    /// Label lookup
    pub strings: &'a dyn StringLookup,
}

impl<'a> StepRenderProps<'a> {
    /// Create props with every value kind allowed
    #[must_use]
    pub fn new(
        mode: ViewMode,
        data: &'a StepFormData,
        template: &'a StepTemplate,
        strings: &'a dyn StringLookup,
    ) -> Self {
        Self {
            mode,
            data,
            template,
            readonly: false,
            allowable_types: AllowableType::ALL.to_vec(),
            strings,
        }
    }

    /// With readonly flag
    #[inline]
    #[must_use]
    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// With allowable value kinds
    #[inline]
    #[must_use]
    pub fn with_allowable_types(mut self, types: Vec<AllowableType>) -> Self {
        self.allowable_types = types;
        self
    }
}

impl fmt::Debug for StepRenderProps<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRenderProps")
            .field("mode", &self.mode)
            .field("step", &self.data.identifier)
            .field("readonly", &self.readonly)
            .field("allowable_types", &self.allowable_types)
            .finish_non_exhaustive()
    }
}

/// One rendered input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldView {
    /// Field location
    pub path: FieldPath,

    /// Resolved label
    pub label: String,

    /// Widget to draw
    pub widget: WidgetKind,

    /// Value to show
    pub value: Value,

    /// Whether the user may change the value
    pub editable: bool,

    /// Whether an empty value is a validation error in this mode
    pub required: bool,

    /// Value kinds offered for this field
    pub allowable_types: Vec<AllowableType>,
}

/// One row of the variables listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableEntry {
    /// Leaf location
    pub path: FieldPath,

    /// Value as text; expressions verbatim
    pub value: String,
}

/// Renderable step view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum StepView {
    /// Full authoring form
    Edit {
        /// Inputs in layout order
        fields: Vec<FieldView>,
    },

    /// Runtime-input form
    RuntimeInputs {
        /// Inputs for deferred fields only
        fields: Vec<FieldView>,
    },

    /// Read-only variables
    Variables {
        /// Leaf values in document order
        entries: Vec<VariableEntry>,
    },

    /// Placeholder for a step type this build does not know
    Unsupported {
        /// Unknown type
        type_id: StepTypeId,
    },
}

impl StepView {
    /// Rendered inputs, empty for listings and placeholders
    #[must_use]
    pub fn fields(&self) -> &[FieldView] {
        match self {
            Self::Edit { fields } | Self::RuntimeInputs { fields } => fields,
            Self::Variables { .. } | Self::Unsupported { .. } => &[],
        }
    }

    /// Input at a dotted path
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&FieldView> {
        self.fields().iter().find(|f| f.path.to_string() == path)
    }

    /// Check for the unsupported placeholder
    #[inline]
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Render a step for the mode in `props`
///
/// Deterministic in `props.mode`; see the module table.
pub fn dispatch<S>(step: &S, props: &StepRenderProps<'_>) -> StepView
where
    S: StepImplementation + ?Sized,
{
    tracing::debug!(step_type = %step.type_id(), mode = %props.mode, "rendering step");
    match props.mode {
        ViewMode::Edit => StepView::Edit {
            fields: edit_fields(step, props),
        },
        ViewMode::InputVariable => StepView::Variables {
            entries: variable_entries(props.data),
        },
        ViewMode::InputSet | ViewMode::Template | ViewMode::DeploymentForm | ViewMode::TriggerForm => {
            StepView::RuntimeInputs {
                fields: runtime_fields(step, props),
            }
        }
    }
}

/// Placeholder view for a type missing from the factory
#[must_use]
pub fn unsupported_view(type_id: &StepTypeId) -> StepView {
    tracing::warn!(step_type = %type_id, "rendering placeholder for unsupported step");
    StepView::Unsupported {
        type_id: type_id.clone(),
    }
}

fn required_paths<S>(step: &S, props: &StepRenderProps<'_>) -> HashSet<FieldPath>
where
    S: StepImplementation + ?Sized,
{
    if !props.mode.enforces_required() {
        return HashSet::new();
    }
    let rules = step
        .base_rules()
        .extend(step.validation_rules(props.data, props.mode));
    let doc = props.data.to_value();
    let mut out = HashSet::new();
    for rule in &rules {
        let active = match &rule.depends_on {
            Some(condition) => condition.evaluate(&doc).unwrap_or_else(|e| {
                tracing::warn!(step_type = %step.type_id(), "cannot resolve guard on '{}': {}", rule.path, e);
                false
            }),
            None => true,
        };
        if active && rule.required {
            out.insert(rule.path.clone());
        }
    }
    if props.mode.is_runtime_form() {
        out.extend(props.template.uncovered_runtime_paths(rules.iter().map(|r| &r.path)));
    }
    out
}

fn current_value(data: &StepFormData, path: &FieldPath) -> Value {
    data.get(path).ok().flatten().unwrap_or(Value::Null)
}

fn edit_fields<S>(step: &S, props: &StepRenderProps<'_>) -> Vec<FieldView>
where
    S: StepImplementation + ?Sized,
{
    let required = required_paths(step, props);
    step.fields(props.data)
        .into_iter()
        .map(|spec| FieldView {
            label: props.strings.get_string(&spec.label, &[]),
            value: current_value(props.data, &spec.path),
            editable: !props.readonly,
            required: required.contains(&spec.path),
            allowable_types: props.allowable_types.clone(),
            widget: spec.widget,
            path: spec.path,
        })
        .collect()
}

fn runtime_fields<S>(step: &S, props: &StepRenderProps<'_>) -> Vec<FieldView>
where
    S: StepImplementation + ?Sized,
{
    let required = required_paths(step, props);
    let mut specs = step.fields(props.data);

    // Deferred leaves the layout does not name still need an input
    let uncovered = props.template.uncovered_runtime_paths(specs.iter().map(|s| &s.path));
    for path in uncovered {
        specs.push(FieldSpec {
            label: path.to_string(),
            path,
            widget: WidgetKind::Text,
        });
    }

    // A runtime form cannot defer a field again, except in a template
    let allowable_types: Vec<AllowableType> = props
        .allowable_types
        .iter()
        .copied()
        .filter(|t| props.mode == ViewMode::Template || *t != AllowableType::Runtime)
        .collect();

    specs
        .into_iter()
        .filter_map(|spec| {
            let input = props.template.runtime_input(&spec.path)?;
            let widget = if input.allowed_values.is_empty() {
                spec.widget
            } else {
                WidgetKind::select(input.allowed_values.iter().cloned())
            };
            let value = match FieldValue::decode(&current_value(props.data, &spec.path)) {
                FieldValue::Fixed(v) if !step_model::is_empty_value(&v) => v,
                FieldValue::Expression(e) => Value::String(e),
                _ => input.default.clone().map_or(Value::Null, Value::String),
            };
            Some(FieldView {
                label: props.strings.get_string(&spec.label, &[]),
                value,
                editable: !props.readonly,
                required: required.contains(&spec.path),
                allowable_types: allowable_types.clone(),
                widget,
                path: spec.path,
            })
        })
        .collect()
}

fn variable_entries(data: &StepFormData) -> Vec<VariableEntry> {
    let mut entries = Vec::new();
    if let Value::Object(map) = data.to_value() {
        for (key, value) in &map {
            match FieldPath::new(vec![key.clone()]) {
                Ok(path) => collect_leaves(value, &path, &mut entries),
                Err(e) => tracing::debug!("skipping key '{}' in variables listing: {}", key, e),
            }
        }
    }
    entries
}

fn collect_leaves(value: &Value, path: &FieldPath, out: &mut Vec<VariableEntry>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                collect_leaves(child, &path.child(key.clone()), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_leaves(child, &path.child(i.to_string()), out);
            }
        }
        Value::String(s) => out.push(VariableEntry {
            path: path.clone(),
            value: s.clone(),
        }),
        Value::Bool(_) | Value::Number(_) => out.push(VariableEntry {
            path: path.clone(),
            value: value.to_string(),
        }),
    }
}
