//! Framework configuration
//!
//! Loaded from YAML; every key is optional.
//!
//! ```yaml
//! registration_policy: strict
//! min_timeout: 30s
//! debounce_ms: 300
//! strings_path: strings/en.yaml
//! log_filter: info,step_registry=debug
//! json_logs: false
//! ```

use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use step_model::{format_duration, parse_duration, StringTable, MIN_TIMEOUT};
use step_registry::RegistrationPolicy;

/// Framework configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// What to do when a step type is registered twice
    pub registration_policy: RegistrationPolicy,

    /// Smallest accepted step timeout
    #[serde(serialize_with = "write_duration", deserialize_with = "read_duration")]
    pub min_timeout: Duration,

    /// Quiet period before dropdown options are fetched
    pub debounce_ms: u64,

    /// YAML file with string overrides
    pub strings_path: Option<PathBuf>,

    /// Default tracing filter; `RUST_LOG` wins when set
    pub log_filter: String,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            registration_policy: RegistrationPolicy::Warn,
            min_timeout: MIN_TIMEOUT,
            debounce_ms: 300,
            strings_path: None,
            log_filter: "info".to_string(),
            json_logs: false,
        }
    }
}

impl FrameworkConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With registration policy
    #[inline]
    #[must_use]
    pub fn with_registration_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.registration_policy = policy;
        self
    }

    /// With minimum timeout
    #[inline]
    #[must_use]
    pub fn with_min_timeout(mut self, min: Duration) -> Self {
        self.min_timeout = min;
        self
    }

    /// With debounce window in milliseconds
    #[inline]
    #[must_use]
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// With string overrides file
    #[inline]
    #[must_use]
    pub fn with_strings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.strings_path = Some(path.into());
        self
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Debounce window
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parse configuration from YAML
    ///
    /// # Errors
    /// Returns error if the YAML is malformed or a value is out of range
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded framework config");
        Ok(config)
    }

    /// English strings merged with the overrides file, if configured
    ///
    /// # Errors
    /// Returns error if the overrides file cannot be read or parsed
    pub fn load_strings(&self) -> Result<StringTable> {
        let english = StringTable::english();
        let Some(path) = &self.strings_path else {
            return Ok(english);
        };
        let text = std::fs::read_to_string(path)?;
        let overrides = StringTable::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), keys = overrides.len(), "loaded string overrides");
        Ok(english.merged_with(overrides))
    }

    fn check(&self) -> Result<()> {
        if self.min_timeout.is_zero() {
            return Err(CoreError::Config("min_timeout must be positive".to_string()));
        }
        if self.log_filter.trim().is_empty() {
            return Err(CoreError::Config("log_filter must not be empty".to_string()));
        }
        Ok(())
    }
}

fn write_duration<S: Serializer>(value: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*value))
}

fn read_duration<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_duration(&text).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use step_model::StringLookup;

    #[test]
    fn defaults() {
        let config = FrameworkConfig::new();
        assert_eq!(config.min_timeout, Duration::from_secs(10));
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.registration_policy, RegistrationPolicy::Warn);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = FrameworkConfig::from_yaml_str("registration_policy: strict\nmin_timeout: 1m\n").unwrap();
        assert_eq!(config.registration_policy, RegistrationPolicy::Strict);
        assert_eq!(config.min_timeout, Duration::from_secs(60));
        assert_eq!(config.debounce_ms, 300);
    }

    #[test]
    fn bad_duration_rejected() {
        assert!(matches!(
            FrameworkConfig::from_yaml_str("min_timeout: soon\n"),
            Err(CoreError::Yaml(_))
        ));
        assert!(matches!(
            FrameworkConfig::from_yaml_str("min_timeout: 0s\n"),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn serializes_duration_as_text() {
        let yaml = serde_yaml::to_string(&FrameworkConfig::new().with_min_timeout(Duration::from_secs(90))).unwrap();
        assert!(yaml.contains("min_timeout: 1m30s"), "{yaml}");
    }

    #[test]
    fn strings_overrides_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "label.url: Endpoint").unwrap();
        let config = FrameworkConfig::new().with_strings_path(file.path());

        let strings = config.load_strings().unwrap();
        assert_eq!(strings.get_string("label.url", &[]), "Endpoint");
        assert_eq!(strings.get_string("label.name", &[]), "Name");
    }

    #[test]
    fn config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_ms: 50").unwrap();
        let config = FrameworkConfig::from_file(file.path()).unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(50));
    }
}
