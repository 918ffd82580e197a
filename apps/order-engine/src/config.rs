//! Configuration module for the order engine.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation for the session policy, replay and logging.
//!
//! # Usage
//!
//! ```rust,ignore
//! use order_engine::config::{EngineConfig, load_config};
//!
//! // Load from default path (order-engine.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/order-engine.yaml"))?;
//!
//! println!("async modify: {}", config.policy.async_modify);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "order-engine.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Session policy consulted by the order manager.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Replay driver configuration.
    #[serde(default)]
    pub replay: ReplayConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============================================
// Policy
// ============================================

/// Session policy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Send modifies before the new order is acknowledged.
    #[serde(default)]
    pub async_modify: bool,
    /// Send cancels before the new order is acknowledged.
    #[serde(default)]
    pub async_cancel: bool,
    /// Abnormal events tolerated before the session is flagged.
    #[serde(default)]
    pub abnormal_limit: Option<u32>,
}

// ============================================
// Replay
// ============================================

/// Replay driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Confirm transmission of queued requests after every step.
    #[serde(default = "default_true")]
    pub auto_send: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { auto_send: true }
    }
}

const fn default_true() -> bool {
    true
}

// ============================================
// Logging
// ============================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (`text` or `json`).
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Include span information.
    #[serde(default)]
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            include_spans: false,
        }
    }
}

impl LoggingConfig {
    /// Returns true if JSON output is configured.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "order-engine.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<EngineConfig, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: EngineConfig = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.policy.abnormal_limit == Some(0) {
        return Err(ConfigError::ValidationError(
            "policy.abnormal_limit must be positive".to_string(),
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "logging.level must be one of: {valid_levels:?}"
        )));
    }

    let valid_formats = ["text", "json"];
    if !valid_formats.contains(&config.logging.format.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "logging.format must be one of: {valid_formats:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert!(!config.policy.async_modify);
        assert!(!config.policy.async_cancel);
        assert_eq!(config.policy.abnormal_limit, None);
        assert!(config.replay.auto_send);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_load_empty_mapping_uses_defaults() {
        let config = match load_config_from_string("{}") {
            Ok(c) => c,
            Err(e) => panic!("should load empty config: {e}"),
        };
        assert!(config.replay.auto_send);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r"
policy:
  async_modify: true
  async_cancel: true
  abnormal_limit: 3
replay:
  auto_send: false
logging:
  level: debug
  format: json
  include_spans: true
";
        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load full config: {e}"),
        };
        assert!(config.policy.async_modify);
        assert!(config.policy.async_cancel);
        assert_eq!(config.policy.abnormal_limit, Some(3));
        assert!(!config.replay.auto_send);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.is_json());
        assert!(config.logging.include_spans);
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "level: ${ORDER_ENGINE_TEST_NONEXISTENT_VAR:-warn}";
        assert_eq!(interpolate_env_vars(input), "level: warn");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);
        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "level: ${ORDER_ENGINE_TEST_UNLIKELY_TO_EXIST}";
        assert_eq!(interpolate_env_vars(input), "level: ");
    }

    #[test]
    fn test_validation_zero_abnormal_limit() {
        let yaml = "policy:\n  abnormal_limit: 0\n";
        let result = load_config_from_string(yaml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let yaml = "logging:\n  level: loud\n";
        let result = load_config_from_string(yaml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_invalid_log_format() {
        let yaml = "logging:\n  format: xml\n";
        let result = load_config_from_string(yaml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let result = load_config_from_string("policy: [unterminated");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "policy:\n  async_cancel: true").unwrap();
        let path = file.path().to_str().unwrap();

        let config = load_config(Some(path)).unwrap();
        assert!(config.policy.async_cancel);
        assert!(!config.policy.async_modify);
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let result = load_config(path.to_str());
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
