//! Configuration types for cxxlint.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Default parameter count above which `long-parameter-list` fires.
pub const DEFAULT_PARAMETER_COUNT_THRESHOLD: usize = 4;

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per violation.
    #[default]
    Text,
    /// JSON array of violation records.
    Json,
    /// Rich terminal output with source snippets.
    Pretty,
}

/// Top-level configuration for cxxlint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Preset to use (e.g., "recommended", "strict", "minimal").
    #[serde(default)]
    pub preset: Option<String>,

    /// Fail the run when an error-severity violation remains.
    #[serde(default = "default_true")]
    pub fail_on_error: bool,

    /// Apply automatic fixes.
    #[serde(default)]
    pub fix: bool,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Parameter count tolerated before `long-parameter-list` fires.
    #[serde(default = "default_threshold")]
    pub parameter_count_threshold: usize,

    /// Report unrecognized regions as `unparsed-region` notes.
    #[serde(default)]
    pub report_unparsed: bool,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// External formatter configuration.
    #[serde(default)]
    pub formatter: FormatterConfig,

    /// Per-rule configurations, keyed by rule name.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,

    /// File this configuration was loaded from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preset: None,
            fail_on_error: true,
            fix: false,
            format: OutputFormat::default(),
            parameter_count_threshold: DEFAULT_PARAMETER_COUNT_THRESHOLD,
            report_unparsed: false,
            analyzer: AnalyzerConfig::default(),
            formatter: FormatterConfig::default(),
            rules: BTreeMap::new(),
            source: None,
        }
    }
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
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid, has unknown keys or
    /// malformed severities.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: None,
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
    pub fn rule_severity(&self, rule_name: &str) -> Option<crate::Severity> {
        self.rules.get(rule_name).and_then(|c| c.severity)
    }

    /// Gets the configuration block for a rule.
    #[must_use]
    pub fn rule_config(&self, rule_name: &str) -> Option<&RuleConfig> {
        self.rules.get(rule_name)
    }

    /// Rule names configured under `[rules.*]` that are not in `known`.
    #[must_use]
    pub fn unknown_rules<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        self.rules
            .keys()
            .map(String::as_str)
            .filter(|name| !known.contains(name))
            .collect()
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Glob patterns to include (if empty, every C++ source extension).
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns to exclude from analysis.
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Maximum number of parallel file analyses.
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Whole-run timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: default_excludes(),
            respect_gitignore: true,
            parallelism: None,
            timeout_secs: None,
        }
    }
}

/// External formatter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatterConfig {
    /// Run the formatter on every checked file.
    #[serde(default)]
    pub enabled: bool,

    /// Executable to run.
    #[serde(default = "default_formatter_command")]
    pub command: String,

    /// Arguments placed before the file path.
    #[serde(default)]
    pub args: Vec<String>,

    /// Treat formatting differences and failures as errors.
    #[serde(default)]
    pub required: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: default_formatter_command(),
            args: Vec::new(),
            required: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> usize {
    DEFAULT_PARAMETER_COUNT_THRESHOLD
}

fn default_excludes() -> Vec<String> {
    vec!["**/build/**".to_string(), "**/third_party/**".to_string()]
}

fn default_formatter_command() -> String {
    "clang-format".to_string()
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<crate::Severity>,

    /// Names the rule must never report.
    #[serde(default)]
    pub allow_names: Vec<String>,

    /// Rule-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl RuleConfig {
    /// Gets an option value as a specific type.
    #[must_use]
    pub fn get_option<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.options
            .get(key)
            .and_then(|v| v.clone().try_into().ok())
    }

    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Gets an integer option with a default value.
    #[must_use]
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.options
            .get(key)
            .and_then(toml::Value::as_integer)
            .unwrap_or(default)
    }

    /// Gets a string array option.
    #[must_use]
    pub fn get_str_array(&self, key: &str) -> Vec<String> {
        self.options
            .get(key)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config{}: {message}", path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    Parse {
        /// File being parsed, when known.
        path: Option<PathBuf>,
        /// Parse error message.
        message: String,
    },

    /// Preset name not recognized.
    #[error("Unknown preset `{name}` (expected one of: {expected})")]
    UnknownPreset {
        /// Name given in the configuration.
        name: String,
        /// Comma-separated list of valid presets.
        expected: String,
    },

    /// Invalid value for a known option.
    #[error("Invalid value for `{key}`: {message}")]
    InvalidValue {
        /// Option key.
        key: String,
        /// What is wrong with it.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.fail_on_error);
        assert!(!config.fix);
        assert_eq!(config.parameter_count_threshold, 4);
        assert!(config.analyzer.respect_gitignore);
        assert_eq!(config.formatter.command, "clang-format");
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_empty_document_matches_default() {
        let config = Config::parse("").expect("empty config parses");
        assert!(config.fail_on_error);
        assert_eq!(config.analyzer.exclude, default_excludes());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
preset = "strict"
fail_on_error = false
format = "json"
parameter_count_threshold = 6

[analyzer]
exclude = ["**/generated/**"]
timeout_secs = 30

[formatter]
enabled = true
args = ["--style=file"]

[rules.naming-casing]
severity = "warning"
allow_names = ["HRESULT_CALLBACK"]

[rules.long-parameter-list]
enabled = false
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.preset.as_deref(), Some("strict"));
        assert!(!config.fail_on_error);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.parameter_count_threshold, 6);
        assert_eq!(config.analyzer.timeout_secs, Some(30));
        assert_eq!(config.formatter.args, vec!["--style=file"]);
        assert!(config.is_rule_enabled("naming-casing"));
        assert!(!config.is_rule_enabled("long-parameter-list"));
        assert_eq!(config.rule_severity("naming-casing"), Some(Severity::Warning));
        let naming = config.rule_config("naming-casing").expect("naming config");
        assert_eq!(naming.allow_names, vec!["HRESULT_CALLBACK"]);
    }

    #[test]
    fn test_unknown_top_level_key_is_fatal() {
        let err = Config::parse("fail_on_eror = true").expect_err("typo must fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unknown_analyzer_key_is_fatal() {
        assert!(Config::parse("[analyzer]\nroot = \"src\"").is_err());
    }

    #[test]
    fn test_malformed_severity_is_fatal() {
        assert!(Config::parse("[rules.naming-casing]\nseverity = \"fatal\"").is_err());
    }

    #[test]
    fn test_unknown_rules_are_listed() {
        let config = Config::parse("[rules.naming-casing]\n[rules.no-such-rule]\n")
            .expect("rule tables parse");
        assert_eq!(config.unknown_rules(&["naming-casing"]), vec!["no-such-rule"]);
    }

    #[test]
    fn test_rule_options() {
        let config = Config::parse("[rules.x]\nstrict = true\nlimit = 3\nnames = [\"a\", \"b\"]\n")
            .expect("options parse");
        let rule = config.rule_config("x").expect("rule x");
        assert!(rule.get_bool("strict", false));
        assert_eq!(rule.get_int("limit", 0), 3);
        assert_eq!(rule.get_str_array("names"), vec!["a", "b"]);
        assert_eq!(rule.get_option::<i64>("limit"), Some(3));
    }

    #[test]
    fn test_from_file_records_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cxxlint.toml");
        std::fs::write(&path, "fix = true\n").expect("write config");
        let config = Config::from_file(&path).expect("config loads");
        assert!(config.fix);
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }
}
