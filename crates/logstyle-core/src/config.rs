//! Configuration types for logstyle.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::types::Severity;

/// Top-level configuration, as read from `logstyle.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Exit with failure when a violation at or above this severity is
    /// reported. Absent means report-only.
    #[serde(default)]
    pub fail_on: Option<Severity>,

    /// Loader configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Per-rule configurations, keyed by rule name.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a rule is enabled. Rules are enabled unless configured off.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        self.rules
            .get(rule_name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_name: &str) -> Option<Severity> {
        self.rules.get(rule_name).and_then(|c| c.severity)
    }

    /// Gets the configuration block of a rule.
    #[must_use]
    pub fn rule(&self, rule_name: &str) -> Option<&RuleConfig> {
        self.rules.get(rule_name)
    }
}

/// Package loading configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Extra build tags satisfied when evaluating `//go:build` lines.
    #[serde(default)]
    pub build_tags: Vec<String>,

    /// Also analyze in-package `_test.go` files.
    #[serde(default)]
    pub include_tests: bool,
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule-specific options.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl RuleConfig {
    /// Deserializes an option into `T`.
    ///
    /// Returns `Ok(None)` when the option is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] if the value has the wrong shape.
    pub fn option<T: serde::de::DeserializeOwned>(
        &self,
        rule: &str,
        key: &str,
    ) -> Result<Option<T>, ConfigError> {
        self.options
            .get(key)
            .map(|value| {
                value
                    .clone()
                    .try_into()
                    .map_err(|e: toml::de::Error| ConfigError::InvalidOption {
                        rule: rule.to_string(),
                        key: key.to_string(),
                        message: e.message().to_string(),
                    })
            })
            .transpose()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A rule option has the wrong shape.
    #[error("invalid option `{key}` for rule {rule}: {message}")]
    InvalidOption {
        /// Rule name.
        rule: String,
        /// Option key.
        key: String,
        /// Deserialization message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn default_config_is_report_only() {
        let config = Config::default();
        assert!(config.fail_on.is_none());
        assert!(config.rules.is_empty());
        assert!(config.is_rule_enabled("constant-message"));
        assert!(!config.analyzer.include_tests);
    }

    #[test]
    fn parses_full_config() {
        let toml = r#"
fail_on = "warning"

[analyzer]
build_tags = ["integration"]
include_tests = true

[rules.constant-message]
enabled = false
severity = "warning"

[[rules.constant-message.targets]]
package = "go.uber.org/zap"
type = "Logger"
methods = ["Info"]
"#;

        let config = Config::parse(toml).expect("parse");
        assert_eq!(config.fail_on, Some(Severity::Warning));
        assert_eq!(config.analyzer.build_tags, vec!["integration".to_string()]);
        assert!(config.analyzer.include_tests);
        assert!(!config.is_rule_enabled("constant-message"));
        assert_eq!(
            config.rule_severity("constant-message"),
            Some(Severity::Warning)
        );
        assert!(config
            .rule("constant-message")
            .is_some_and(|r| r.options.contains_key("targets")));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Target {
        package: String,
    }

    #[test]
    fn option_deserializes_or_reports_shape() {
        let config = Config::parse(
            r#"
[rules.r]
targets = [{ package = "a" }]
bad = 3
"#,
        )
        .expect("parse");
        let rule = config.rule("r").expect("rule");

        let targets: Option<Vec<Target>> = rule.option("r", "targets").expect("valid");
        assert_eq!(
            targets,
            Some(vec![Target {
                package: "a".to_string()
            }])
        );

        let missing: Option<Vec<Target>> = rule.option("r", "missing").expect("valid");
        assert!(missing.is_none());

        let bad = rule.option::<Vec<Target>>("r", "bad");
        assert!(matches!(bad, Err(ConfigError::InvalidOption { .. })));
    }

    #[test]
    fn rejects_unknown_severity() {
        let err = Config::parse("fail_on = \"fatal\"").expect_err("invalid");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
