//! Testing utilities for the step framework workspace
//!
//! Shared test steps, fixtures, and factory helpers.

#![allow(missing_docs)]

use serde_json::{json, Value};
use std::sync::Arc;
use step_model::{StepDescriptor, StepFormData, StepTypeId, ViewMode};
use step_registry::{FieldSpec, RegistrationPolicy, StepFactory, StepImplementation, StepRef};
use step_validation::{FieldRule, RuleSet};

/// Step with a configurable layout and rule set
#[derive(Debug, Clone)]
pub struct MockStep {
    descriptor: StepDescriptor,
    fields: Vec<FieldSpec>,
    rules: RuleSet,
}

impl MockStep {
    pub fn new(type_id: &str) -> Self {
        Self {
            descriptor: StepDescriptor::new(type_id, type_id).with_defaults(Some("10m"), json!({})),
            fields: FieldSpec::step_base(),
            rules: RuleSet::new(),
        }
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rules = self.rules.with(rule);
        self
    }

    pub fn with_defaults(mut self, timeout: Option<&str>, spec: Value) -> Self {
        self.descriptor = self.descriptor.with_defaults(timeout, spec);
        self
    }

    pub fn shared(self) -> StepRef {
        Arc::new(self)
    }
}

impl StepImplementation for MockStep {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn fields(&self, _data: &StepFormData) -> Vec<FieldSpec> {
        self.fields.clone()
    }

    fn validation_rules(&self, _data: &StepFormData, _mode: ViewMode) -> RuleSet {
        self.rules.clone()
    }
}

/// Step with every base field empty
pub fn blank_step(type_id: &str) -> StepFormData {
    StepFormData::new(StepTypeId::new(type_id)).with_timeout("")
}

/// Valid HTTP step
pub fn sample_http_step(identifier: &str) -> StepFormData {
    StepFormData::new(StepTypeId::new("Http"))
        .with_identifier(identifier)
        .with_name(identifier)
        .with_timeout("1m")
        .with_spec(json!({"url": "https://example.com/health", "method": "GET"}))
}

/// Sonarqube step in the given scan mode with everything else filled in
pub fn sample_sonarqube_step(identifier: &str, mode: &str) -> StepFormData {
    StepFormData::new(StepTypeId::new("Sonarqube"))
        .with_identifier(identifier)
        .with_name(identifier)
        .with_timeout("10m")
        .with_spec(json!({
            "mode": mode,
            "config": "default",
            "target": {"type": "repository", "name": "payments", "variant": "main"},
            "auth": {"access_token": "<+secrets.getValue(\"sonar\")>"},
        }))
}

/// Factory with every built-in step registered
pub fn factory_with_builtins() -> Arc<StepFactory> {
    let factory = StepFactory::new(RegistrationPolicy::Strict);
    step_library::register_builtin_steps(&factory).unwrap();
    Arc::new(factory)
}

/// Pipeline with one CI stage and one security stage
pub const SAMPLE_PIPELINE_YAML: &str = r#"pipeline:
  identifier: payments_release
  name: Payments Release
  projectIdentifier: payments
  stages:
    - stage:
        identifier: build
        name: Build
        type: CI
        spec:
          execution:
            steps:
              - step:
                  type: Http
                  identifier: smoke
                  name: Smoke Test
                  timeout: 1m
                  spec:
                    url: https://payments.internal/health
                    method: GET
                    headers:
                      - key: Accept
                        value: application/json
                      - key: ""
                        value: ""
              - step:
                  type: LegacyScript
                  identifier: legacy
                  name: Legacy
                  spec:
                    script: ./run.sh
    - stage:
        identifier: scan
        name: Scan
        type: SecurityTests
        spec:
          execution:
            steps:
              - step:
                  type: Sonarqube
                  identifier: sonar
                  name: Sonar
                  timeout: "<+input>"
                  spec:
                    mode: orchestration
                    config: default
                    target:
                      type: repository
                      name: payments
                      variant: main
                    auth:
                      access_token: token
                      domain: sonar.internal
"#;
