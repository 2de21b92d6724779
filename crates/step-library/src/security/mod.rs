//! Security test steps
//!
//! Scanner steps share one form: a scan mode, a target, optional auth and
//! ingestion sections, and advanced logging options. Each scanner adds its
//! own tool-specific fields on top through [`ScannerTool`].
//!
//! # Modes
//!
//! - `orchestration`: the step runs the scanner; auth token required
//! - `extraction`: results pulled from a scanner server; domain and token required
//! - `ingestion`: results read from a file; auth is not used

mod prisma_cloud;
mod sonarqube;

pub use prisma_cloud::{PrismaCloudStep, IMAGE_TYPES};
pub use sonarqube::SonarqubeStep;

use step_model::{FieldValue, StepFormData};
use step_registry::{normalize_step, strip_paths, FieldSpec};
use step_validation::{Condition, FieldRule, RuleSet};

/// Scan modes
pub const SCAN_MODES: [&str; 3] = ["orchestration", "extraction", "ingestion"];

/// Scan target kinds
pub const TARGET_TYPES: [&str; 4] = ["repository", "container", "instance", "configuration"];

/// Log levels for the scanner
pub const LOG_LEVELS: [&str; 4] = ["debug", "info", "warning", "error"];

/// Severity thresholds
pub const SEVERITIES: [&str; 6] = ["critical", "high", "medium", "low", "info", "none"];

/// Keys only the form uses; never persisted
const UI_ONLY_PATHS: [&str; 1] = ["spec.advanced.uiExpanded"];

/// Tool-specific additions to the shared scanner form
pub(crate) trait ScannerTool {
    /// Extra fields shown after the shared ones
    fn tool_fields(&self, data: &StepFormData) -> Vec<FieldSpec>;

    /// Extra rules appended after the shared ones
    fn tool_rules(&self, rules: RuleSet) -> RuleSet;

    /// Sections dropped when their guard no longer holds
    fn stale_sections(&self, _data: &StepFormData) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Value of a key the form branches on, such as `spec.mode`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Choice {
    /// Nothing chosen yet
    Unset,
    /// Chosen while authoring
    Fixed(String),
    /// Left to a runtime input or an expression; any branch may apply
    Deferred,
}

impl Choice {
    /// Decode the value at a dot path under `spec`
    pub(crate) fn of(data: &StepFormData, key: &str) -> Self {
        let mut current = &data.spec;
        for seg in key.split('.') {
            match current.get(seg) {
                Some(next) => current = next,
                None => return Self::Unset,
            }
        }
        match FieldValue::decode(current) {
            FieldValue::Fixed(serde_json::Value::String(s)) if !s.is_empty() => Self::Fixed(s),
            FieldValue::Fixed(_) => Self::Unset,
            FieldValue::RuntimeInput(_) | FieldValue::Expression(_) => Self::Deferred,
        }
    }

    /// Check for a fixed value
    pub(crate) fn is(&self, value: &str) -> bool {
        matches!(self, Self::Fixed(s) if s == value)
    }

    /// Check if the branch for `value` may apply
    pub(crate) fn may_be(&self, value: &str) -> bool {
        matches!(self, Self::Deferred) || self.is(value)
    }
}

fn uses_auth(mode: &str) -> bool {
    matches!(mode, "orchestration" | "extraction")
}

/// Shared scanner form layout for the current values
pub(crate) fn scanner_fields(tool: &dyn ScannerTool, data: &StepFormData) -> Vec<FieldSpec> {
    let mode = Choice::of(data, "mode");
    let mut fields = FieldSpec::step_base();
    fields.extend([
        FieldSpec::select("spec.mode", "label.mode", SCAN_MODES),
        FieldSpec::text("spec.config", "label.config"),
        FieldSpec::select("spec.target.type", "label.target_type", TARGET_TYPES),
        FieldSpec::text("spec.target.name", "label.target_name"),
        FieldSpec::text("spec.target.variant", "label.target_variant"),
        FieldSpec::text("spec.target.workspace", "label.target_workspace"),
    ]);

    if mode.may_be("ingestion") {
        fields.push(FieldSpec::text("spec.ingestion.file", "label.ingestion_file"));
    }
    if mode.may_be("extraction") {
        fields.push(FieldSpec::text("spec.auth.domain", "label.auth_domain"));
    }
    if mode.may_be("orchestration") || mode.may_be("extraction") {
        fields.push(FieldSpec::text("spec.auth.access_token", "label.auth_access_token"));
        fields.push(FieldSpec::checkbox("spec.auth.ssl", "label.auth_ssl"));
    }

    fields.extend(tool.tool_fields(data));
    fields.extend([
        FieldSpec::select("spec.advanced.log.level", "label.log_level", LOG_LEVELS),
        FieldSpec::select("spec.advanced.fail_on_severity", "label.fail_on_severity", SEVERITIES),
    ]);
    fields
}

/// Shared scanner rules
///
/// Branches are guarded by conditions on the current values, so the same
/// set serves every mode and target.
pub(crate) fn scanner_rules(tool: &dyn ScannerTool) -> RuleSet {
    let rules = RuleSet::new()
        .with(FieldRule::one_of("spec.mode", "label.mode", SCAN_MODES).required())
        .with(FieldRule::text("spec.config", "label.config").required())
        .with(FieldRule::one_of("spec.target.type", "label.target_type", TARGET_TYPES).required())
        .when(Condition::equals("spec.target.type", "repository"), |r| {
            r.with(FieldRule::text("spec.target.name", "label.target_name").required())
                .with(FieldRule::text("spec.target.variant", "label.target_variant").required())
        })
        .with(FieldRule::text("spec.target.workspace", "label.target_workspace"))
        .when(Condition::equals("spec.mode", "ingestion"), |r| {
            r.with(FieldRule::text("spec.ingestion.file", "label.ingestion_file").required())
        })
        .when(Condition::equals("spec.mode", "extraction"), |r| {
            r.with(FieldRule::text("spec.auth.domain", "label.auth_domain").required())
        })
        .when(Condition::one_of("spec.mode", ["orchestration", "extraction"]), |r| {
            r.with(FieldRule::text("spec.auth.access_token", "label.auth_access_token").required())
                .with(FieldRule::boolean("spec.auth.ssl", "label.auth_ssl"))
        });

    tool.tool_rules(rules)
        .with(FieldRule::one_of("spec.advanced.log.level", "label.log_level", LOG_LEVELS))
        .with(FieldRule::one_of(
            "spec.advanced.fail_on_severity",
            "label.fail_on_severity",
            SEVERITIES,
        ))
}

/// Persisted shape of a scanner step
///
/// Drops UI-only keys, sections the chosen mode does not use, and empties.
/// A mode left to runtime keeps every section.
pub(crate) fn scanner_process(tool: &dyn ScannerTool, data: &StepFormData) -> StepFormData {
    let mut out = data.clone();

    let mut stale: Vec<&str> = UI_ONLY_PATHS.to_vec();
    if let Choice::Fixed(mode) = Choice::of(data, "mode") {
        if !uses_auth(&mode) {
            stale.push("spec.auth");
        }
        if mode != "ingestion" {
            stale.push("spec.ingestion");
        }
        if mode == "orchestration" {
            stale.push("spec.auth.domain");
        }
    }
    stale.extend(tool.stale_sections(data));

    strip_paths(&mut out, &stale);
    normalize_step(&out)
}
