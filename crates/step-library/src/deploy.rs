//! Blue/green deployment steps
//!
//! Both steps only toggle flags; everything else comes from the stage's
//! infrastructure definition.

use serde_json::json;
use step_model::{StepDescriptor, StepFormData, ViewMode};
use step_registry::{FieldSpec, StepImplementation};
use step_validation::{FieldRule, RuleSet};

/// Swaps traffic between old and new auto scaling groups
#[derive(Debug, Clone)]
pub struct AsgBlueGreenSwapStep {
    descriptor: StepDescriptor,
}

impl Default for AsgBlueGreenSwapStep {
    fn default() -> Self {
        Self::new()
    }
}

impl AsgBlueGreenSwapStep {
    /// Type key
    pub const TYPE: &'static str = "AsgBlueGreenSwapService";

    /// Create step
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: StepDescriptor::new(Self::TYPE, "ASG Blue Green Swap Service")
                .with_icon("asg-swap")
                .with_defaults(Some("10m"), json!({"downsizeOldAsg": false})),
        }
    }
}

impl StepImplementation for AsgBlueGreenSwapStep {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn fields(&self, _data: &StepFormData) -> Vec<FieldSpec> {
        let mut fields = FieldSpec::step_base();
        fields.push(FieldSpec::checkbox("spec.downsizeOldAsg", "label.downsize_old_asg"));
        fields
    }

    fn validation_rules(&self, _data: &StepFormData, _mode: ViewMode) -> RuleSet {
        RuleSet::new().with(FieldRule::boolean("spec.downsizeOldAsg", "label.downsize_old_asg"))
    }
}

/// Deploys a Kubernetes workload with blue/green switching
#[derive(Debug, Clone)]
pub struct K8sBlueGreenDeployStep {
    descriptor: StepDescriptor,
}

impl Default for K8sBlueGreenDeployStep {
    fn default() -> Self {
        Self::new()
    }
}

impl K8sBlueGreenDeployStep {
    /// Type key
    pub const TYPE: &'static str = "K8sBlueGreenDeploy";

    /// Create step
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: StepDescriptor::new(Self::TYPE, "Blue Green Deployment")
                .with_icon("blue-green")
                .with_defaults(
                    Some("10m"),
                    json!({"skipDryRun": false, "pruningEnabled": false}),
                ),
        }
    }
}

impl StepImplementation for K8sBlueGreenDeployStep {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn fields(&self, _data: &StepFormData) -> Vec<FieldSpec> {
        let mut fields = FieldSpec::step_base();
        fields.push(FieldSpec::checkbox("spec.skipDryRun", "label.skip_dry_run"));
        fields.push(FieldSpec::checkbox("spec.pruningEnabled", "label.pruning_enabled"));
        fields
    }

    fn validation_rules(&self, _data: &StepFormData, _mode: ViewMode) -> RuleSet {
        RuleSet::new()
            .with(FieldRule::boolean("spec.skipDryRun", "label.skip_dry_run"))
            .with(FieldRule::boolean("spec.pruningEnabled", "label.pruning_enabled"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use step_model::{StepTemplate, StringTable};

    #[test]
    fn defaults_validate_once_named() {
        let strings = StringTable::english();
        let step = K8sBlueGreenDeployStep::new();
        let data = step
            .default_form_values()
            .with_name("Deploy")
            .with_identifier("deploy");
        let errors = step
            .validate_input_set(&data, &StepTemplate::empty(), ViewMode::Edit, &strings)
            .unwrap();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn non_boolean_flag_rejected() {
        let strings = StringTable::english();
        let step = AsgBlueGreenSwapStep::new();
        let data = step
            .default_form_values()
            .with_name("Swap")
            .with_identifier("swap")
            .with_spec(json!({"downsizeOldAsg": "yes"}));
        let errors = step
            .validate_input_set(&data, &StepTemplate::empty(), ViewMode::Edit, &strings)
            .unwrap();
        assert_eq!(
            errors.get_str("spec.downsizeOldAsg"),
            Some("Downsize old ASG must be a boolean")
        );
    }

    #[test]
    fn false_flags_survive_processing() {
        let step = K8sBlueGreenDeployStep::new();
        let out = step.process_form_data(&step.default_form_values());
        assert_eq!(out.spec, json!({"skipDryRun": false, "pruningEnabled": false}));
    }
}
