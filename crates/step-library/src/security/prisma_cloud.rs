//! Prisma Cloud scanner step

use super::{scanner_fields, scanner_process, scanner_rules, Choice, ScannerTool};
use serde_json::json;
use step_model::{StepDescriptor, StepFormData, ViewMode};
use step_registry::{FieldSpec, StepImplementation};
use step_validation::{Condition, FieldRule, RuleSet};

/// Registries a container image can be pulled from
pub const IMAGE_TYPES: [&str; 4] = ["docker_v2", "jfrog_artifactory", "aws_ecr", "local_image"];

/// Container and code scanning through Prisma Cloud
#[derive(Debug, Clone)]
pub struct PrismaCloudStep {
    descriptor: StepDescriptor,
}

impl Default for PrismaCloudStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PrismaCloudStep {
    /// Type key
    pub const TYPE: &'static str = "PrismaCloud";

    /// Create step
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: StepDescriptor::new(Self::TYPE, "Prisma Cloud")
                .with_icon("prisma-cloud")
                .with_help_text("step.prisma_cloud.help")
                .with_defaults(
                    Some("5m"),
                    json!({
                        "mode": "orchestration",
                        "config": "default",
                        "target": {"type": "container", "name": "", "variant": ""},
                        "image": {"type": "docker_v2", "name": "", "tag": ""},
                        "advanced": {"log": {"level": "info"}},
                    }),
                ),
        }
    }
}

fn target_type(data: &StepFormData) -> Choice {
    Choice::of(data, "target.type")
}

impl ScannerTool for PrismaCloudStep {
    fn tool_fields(&self, data: &StepFormData) -> Vec<FieldSpec> {
        if !target_type(data).may_be("container") {
            return Vec::new();
        }
        vec![
            FieldSpec::select("spec.image.type", "label.image_type", IMAGE_TYPES),
            FieldSpec::text("spec.image.name", "label.image_name"),
            FieldSpec::text("spec.image.tag", "label.image_tag"),
        ]
    }

    fn tool_rules(&self, rules: RuleSet) -> RuleSet {
        rules.when(Condition::equals("spec.target.type", "container"), |r| {
            r.with(FieldRule::one_of("spec.image.type", "label.image_type", IMAGE_TYPES))
                .with(FieldRule::text("spec.image.name", "label.image_name").required())
                .with(FieldRule::text("spec.image.tag", "label.image_tag"))
        })
    }

    fn stale_sections(&self, data: &StepFormData) -> Vec<&'static str> {
        match target_type(data) {
            Choice::Fixed(kind) if kind != "container" => vec!["spec.image"],
            _ => Vec::new(),
        }
    }
}

impl StepImplementation for PrismaCloudStep {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn fields(&self, data: &StepFormData) -> Vec<FieldSpec> {
        scanner_fields(self, data)
    }

    fn validation_rules(&self, _data: &StepFormData, _mode: ViewMode) -> RuleSet {
        scanner_rules(self)
    }

    fn process_form_data(&self, data: &StepFormData) -> StepFormData {
        scanner_process(self, data)
    }
}
