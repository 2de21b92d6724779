//! User-facing string lookup
//!
//! Every label and message goes through [`StringLookup`] so steps never embed
//! display text. [`StringTable`] is the in-process implementation, seeded with
//! English defaults and overridable from YAML.

use std::collections::HashMap;

/// String lookup service
pub trait StringLookup: Send + Sync {
    /// Resolve `key`, substituting `{{name}}` placeholders from `vars`
    ///
    /// Unknown keys resolve to the key itself.
    fn get_string(&self, key: &str, vars: &[(&str, &str)]) -> String;
}

/// Key/value string table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    entries: HashMap<String, String>,
}

const ENGLISH: &[(&str, &str)] = &[
    // Validation messages
    ("validation.required", "{{label}} is required"),
    ("validation.timeout_min", "{{label}} must be at least {{min}}"),
    ("validation.invalid_duration", "{{label}} is not a valid duration"),
    (
        "validation.identifier",
        "{{label}} must start with a letter or _ and contain only letters, digits and _",
    ),
    ("validation.identifier_reserved", "{{label}} cannot be the reserved word '{{value}}'"),
    ("validation.one_of", "{{label}} must be one of: {{options}}"),
    ("validation.not_allowed", "{{label}} must be one of the allowed values: {{options}}"),
    ("validation.number_range", "{{label}} must be between {{min}} and {{max}}"),
    ("validation.type_mismatch", "{{label}} must be a {{expected}}"),
    (
        "validation.duplicate_identifier",
        "Identifier '{{identifier}}' is already used in this stage",
    ),
    // Common labels
    ("label.name", "Name"),
    ("label.identifier", "Identifier"),
    ("label.timeout", "Timeout"),
    ("label.description", "Description"),
    // Http
    ("label.url", "URL"),
    ("label.method", "Method"),
    ("label.request_body", "Request Body"),
    ("label.headers", "Headers"),
    ("label.assertion", "Assertion"),
    // Deployment steps
    ("label.downsize_old_asg", "Downsize old ASG"),
    ("label.skip_dry_run", "Skip Dry Run"),
    ("label.pruning_enabled", "Enable Kubernetes Pruning"),
    // Security steps
    ("label.mode", "Scan Mode"),
    ("label.config", "Scan Configuration"),
    ("label.target_type", "Target Type"),
    ("label.target_name", "Target Name"),
    ("label.target_variant", "Variant"),
    ("label.target_workspace", "Workspace"),
    ("label.ingestion_file", "Ingestion File"),
    ("label.auth_domain", "Domain"),
    ("label.auth_access_token", "Access Token"),
    ("label.auth_ssl", "Enforce SSL"),
    ("label.project_key", "Project Key"),
    ("label.image_name", "Image Name"),
    ("label.image_tag", "Image Tag"),
    ("label.image_type", "Image Type"),
    ("label.log_level", "Log Level"),
    ("label.fail_on_severity", "Fail on Severity"),
    // Placeholders
    ("step.unsupported", "Step type '{{type}}' is not supported by this build"),
];

impl StringTable {
    /// Empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with built-in English strings
    #[must_use]
    pub fn english() -> Self {
        let mut table = Self::new();
        for (key, value) in ENGLISH {
            table.insert(*key, *value);
        }
        table
    }

    /// Parse a flat YAML map of strings
    ///
    /// # Errors
    /// Returns error if the YAML is not a map of strings
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let entries: HashMap<String, String> = serde_yaml::from_str(yaml)?;
        Ok(Self { entries })
    }

    /// Insert or replace one entry
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Overlay another table on top of this one
    #[must_use]
    pub fn merged_with(mut self, overrides: Self) -> Self {
        self.entries.extend(overrides.entries);
        self
    }

    /// Check if key is present
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StringLookup for StringTable {
    fn get_string(&self, key: &str, vars: &[(&str, &str)]) -> String {
        let Some(template) = self.entries.get(key) else {
            tracing::debug!("missing string key '{}'", key);
            return key.to_string();
        };
        let mut out = template.clone();
        for (name, value) in vars {
            out = out.replace(&format!("{{{{{name}}}}}"), value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_variables() {
        let table = StringTable::english();
        assert_eq!(
            table.get_string("validation.required", &[("label", "Name")]),
            "Name is required"
        );
        assert_eq!(
            table.get_string("validation.timeout_min", &[("label", "Timeout"), ("min", "10s")]),
            "Timeout must be at least 10s"
        );
    }

    #[test]
    fn missing_key_returns_key() {
        let table = StringTable::new();
        assert_eq!(table.get_string("label.url", &[]), "label.url");
    }

    #[test]
    fn yaml_overrides() {
        let overrides = StringTable::from_yaml_str("label.url: Endpoint\n").unwrap();
        let table = StringTable::english().merged_with(overrides);
        assert_eq!(table.get_string("label.url", &[]), "Endpoint");
        assert_eq!(table.get_string("label.name", &[]), "Name");
    }
}
