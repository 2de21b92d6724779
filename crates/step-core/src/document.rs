//! Pipeline documents
//!
//! The persisted pipeline shape, in YAML or JSON:
//!
//! ```yaml
//! pipeline:
//!   identifier: build_and_scan
//!   name: Build and Scan
//!   stages:
//!     - stage:
//!         identifier: scan
//!         name: Scan
//!         type: SecurityTests
//!         spec:
//!           execution:
//!             steps:
//!               - step:
//!                   type: Sonarqube
//!                   identifier: sonar
//!                   name: Sonar
//!                   timeout: 5m
//!                   spec: {}
//! ```
//!
//! Keys this crate does not model are kept verbatim.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use step_model::StepFormData;

/// Root of a pipeline file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDocument {
    /// The pipeline
    pub pipeline: Pipeline,
}

/// Pipeline definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline identifier
    pub identifier: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Stages in execution order
    #[serde(default)]
    pub stages: Vec<StageEntry>,

    /// Unmodelled keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wrapper around one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEntry {
    /// The stage
    pub stage: Stage,
}

/// One stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Stage identifier
    pub identifier: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Stage kind
    #[serde(rename = "type", default)]
    pub stage_type: String,

    /// Stage body
    #[serde(default)]
    pub spec: StageSpec,

    /// Unmodelled keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stage body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Steps to run
    #[serde(default)]
    pub execution: Execution,

    /// Unmodelled keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ordered step list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Steps in order
    #[serde(default)]
    pub steps: Vec<StepEntry>,

    /// Unmodelled keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wrapper around one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEntry {
    /// The step
    pub step: StepFormData,
}

impl Stage {
    /// Create empty stage
    #[must_use]
    pub fn new(identifier: impl Into<String>, stage_type: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            name: identifier.clone(),
            identifier,
            stage_type: stage_type.into(),
            spec: StageSpec::default(),
            extra: Map::new(),
        }
    }

    /// Steps in order
    pub fn steps(&self) -> impl Iterator<Item = &StepFormData> {
        self.spec.execution.steps.iter().map(|e| &e.step)
    }

    /// Steps in order, mutable
    pub fn steps_mut(&mut self) -> impl Iterator<Item = &mut StepFormData> {
        self.spec.execution.steps.iter_mut().map(|e| &mut e.step)
    }

    /// Owned copy of the step list
    #[must_use]
    pub fn step_list(&self) -> Vec<StepFormData> {
        self.steps().cloned().collect()
    }

    /// Step by identifier
    #[must_use]
    pub fn step(&self, identifier: &str) -> Option<&StepFormData> {
        self.steps().find(|s| s.identifier == identifier)
    }

    /// Position of a step
    #[must_use]
    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.steps().position(|s| s.identifier == identifier)
    }
}

impl PipelineDocument {
    /// Create empty pipeline
    #[must_use]
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pipeline: Pipeline {
                identifier: identifier.into(),
                name: name.into(),
                stages: Vec::new(),
                extra: Map::new(),
            },
        }
    }

    /// With an appended stage
    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.pipeline.stages.push(StageEntry { stage });
        self
    }

    /// Parse from YAML
    ///
    /// # Errors
    /// Returns error if the YAML does not have the pipeline shape
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns error if the JSON does not have the pipeline shape
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a file; `.json` files are read as JSON, anything else as YAML
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Serialize to YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Stages in order
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.pipeline.stages.iter().map(|e| &e.stage)
    }

    /// Stage by identifier
    #[must_use]
    pub fn stage(&self, identifier: &str) -> Option<&Stage> {
        self.stages().find(|s| s.identifier == identifier)
    }

    /// Stage by identifier, mutable
    pub fn stage_mut(&mut self, identifier: &str) -> Option<&mut Stage> {
        self.pipeline
            .stages
            .iter_mut()
            .map(|e| &mut e.stage)
            .find(|s| s.identifier == identifier)
    }

    /// Total number of steps
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.stages().map(|s| s.spec.execution.steps.len()).sum()
    }
}
