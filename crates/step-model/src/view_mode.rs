//! Rendering and validation contexts for step forms

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Context a step form is displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    /// Full authoring form
    #[default]
    Edit,

    /// Runtime inputs collected for an input set
    InputSet,

    /// Read-only listing of resolved variables
    InputVariable,

    /// Runtime inputs of a template
    Template,

    /// Runtime inputs collected at deployment time
    DeploymentForm,

    /// Runtime inputs collected by a trigger
    TriggerForm,
}

impl ViewMode {
    /// All modes
    pub const ALL: [Self; 6] = [
        Self::Edit,
        Self::InputSet,
        Self::InputVariable,
        Self::Template,
        Self::DeploymentForm,
        Self::TriggerForm,
    ];

    /// Modes that render and validate only runtime-input fields
    #[inline]
    #[must_use]
    pub fn is_runtime_form(self) -> bool {
        matches!(
            self,
            Self::InputSet | Self::Template | Self::DeploymentForm | Self::TriggerForm
        )
    }

    /// Whether required-ness is enforced in this mode
    ///
    /// Template mode only checks value formats; everything else enforces
    /// required fields.
    #[inline]
    #[must_use]
    pub fn enforces_required(self) -> bool {
        !matches!(self, Self::Template)
    }

    /// Kebab-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::InputSet => "input-set",
            Self::InputVariable => "input-variable",
            Self::Template => "template",
            Self::DeploymentForm => "deployment-form",
            Self::TriggerForm => "trigger-form",
        }
    }
}

impl Display for ViewMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = UnknownViewMode;

    /// Accepts `input-set`, `input_set`, `InputSet` and `inputset`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "edit" => Ok(Self::Edit),
            "inputset" => Ok(Self::InputSet),
            "inputvariable" => Ok(Self::InputVariable),
            "template" => Ok(Self::Template),
            "deploymentform" => Ok(Self::DeploymentForm),
            "triggerform" => Ok(Self::TriggerForm),
            _ => Err(UnknownViewMode(s.to_string())),
        }
    }
}

/// Unrecognised view mode name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view mode: '{0}'")]
pub struct UnknownViewMode(pub String);
