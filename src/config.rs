//! Configuration module for tf-why.
//!
//! This module handles loading and validating configuration from:
//! - YAML configuration files (`tf-why.yaml`)
//! - Environment variables
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # tf-why.yaml
//!
//! # Analysis options
//! analysis:
//!   only_types: []          # resource types to include (empty = all)
//!   exclude_tags: [cost]    # drop findings carrying any of these tags
//!   max_findings: 20        # <= 0 means the default
//!
//! # Output options
//! output:
//!   colored: true
//!   pretty: true
//!   verbose: false
//!
//! # CI options
//! ci:
//!   enabled: ${TF_WHY_CI}   # Environment variable expansion
//!   fail_on: high
//! ```

use crate::error::{Result, ResultExt, TfWhyError};
use crate::types::Severity;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Findings kept when `max_findings` is not positive.
pub const DEFAULT_MAX_FINDINGS: usize = 20;

/// File names searched for in the working directory, in order.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["tf-why.yaml", "tf-why.yml", ".tf-why.yaml"];

/// Analysis options. This is the option set consumed by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Only evaluate resource changes of these types (empty = all).
    pub only_types: Vec<String>,

    /// Drop findings carrying any of these tags.
    pub exclude_tags: Vec<String>,

    /// Maximum number of findings to report.
    pub max_findings: i64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            only_types: Vec::new(),
            exclude_tags: Vec::new(),
            max_findings: default_max_findings(),
        }
    }
}

impl AnalysisOptions {
    /// Finding cap after applying the default for non-positive values.
    #[must_use]
    pub fn effective_max_findings(&self) -> usize {
        usize::try_from(self.max_findings)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_FINDINGS)
    }
}

/// Output options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Use colored output.
    pub colored: bool,

    /// Pretty-print JSON output.
    pub pretty: bool,

    /// Append the overview table to text reports.
    pub verbose: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            colored: true,
            pretty: true,
            verbose: false,
        }
    }
}

/// CI options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CiOptions {
    /// Turn severities into exit codes.
    pub enabled: bool,

    /// Lowest overall severity that fails the run.
    pub fail_on: String,
}

impl Default for CiOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            fail_on: Severity::High.to_string(),
        }
    }
}

impl CiOptions {
    /// Parse `fail_on` into a severity.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` if the name is not `low`, `medium` or `high`.
    pub fn threshold(&self) -> Result<Severity> {
        self.fail_on.parse().map_err(|message| {
            crate::err!(ConfigValue {
                key: "ci.fail_on".to_string(),
                message,
            })
        })
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis options
    pub analysis: AnalysisOptions,

    /// Output options
    pub output: OutputOptions,

    /// CI options
    pub ci: CiOptions,
}

fn default_max_findings() -> i64 {
    i64::try_from(DEFAULT_MAX_FINDINGS).unwrap_or(i64::MAX)
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a value is out of range.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content);

        // An empty or comment-only file is the default configuration.
        let config: Self = if expanded.lines().all(|l| {
            let l = l.trim();
            l.is_empty() || l.starts_with('#')
        }) {
            Self::default()
        } else {
            serde_yaml::from_str(&expanded).map_err(|e| {
                TfWhyError::config_parse(e.to_string(), Some(Box::new(e)), file!(), line!())
            })?
        };
        config.validate()?;

        tracing::debug!(
            only_types = config.analysis.only_types.len(),
            exclude_tags = config.analysis.exclude_tags.len(),
            max_findings = config.analysis.max_findings,
            ci = config.ci.enabled,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading configuration file");
        let content = std::fs::read_to_string(path).with_path(path)?;
        Self::from_yaml(&content)
    }

    /// Resolve and load the configuration.
    ///
    /// An explicit path wins. Otherwise the working directory is searched for
    /// [`DEFAULT_CONFIG_FILES`], then `<user config dir>/tf-why/config.yaml`.
    /// With no file found the defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be read or parsed.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let user_config = dirs::config_dir().map(|d| d.join("tf-why").join("config.yaml"));
        let candidates = DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .chain(user_config);

        for candidate in candidates {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "Found configuration file");
                return Self::from_file(&candidate);
            }
        }

        tracing::debug!("No configuration file found, using default configuration");
        Ok(Self::default())
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` for an unknown `ci.fail_on`.
    pub fn validate(&self) -> Result<()> {
        self.ci.threshold().map(|_| ())
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# tf-why configuration file

# Analysis options
analysis:
  # Only evaluate these resource types (empty = all)
  only_types: []
  #   - aws_db_instance
  #   - aws_security_group

  # Drop findings carrying any of these tags
  # (security, downtime, data, network, ops, capacity)
  exclude_tags: []

  # Maximum number of findings to report (<= 0 means 20)
  max_findings: 20

# Output options
output:
  # Use colored output in terminal (NO_COLOR also disables it)
  colored: true

  # Pretty-print JSON output
  pretty: true

  # Append an overview table to text reports
  verbose: false

# CI options
ci:
  # Exit non-zero when findings reach the threshold
  # (10 for low/medium, 20 for high)
  enabled: false

  # Threshold: low | medium | high
  fail_on: high
"#
        .to_string()
    }

    /// Merge CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &crate::cli::AnalyzeArgs) {
        if !args.only.is_empty() {
            self.analysis.only_types.clone_from(&args.only);
        }
        if !args.exclude_tags.is_empty() {
            self.analysis
                .exclude_tags
                .extend(args.exclude_tags.iter().cloned());
        }
        if let Some(max) = args.max_findings {
            self.analysis.max_findings = max;
        }
        if args.ci {
            self.ci.enabled = true;
        }
        if let Some(threshold) = args.fail_on {
            self.ci.fail_on = threshold.to_string();
        }
        if args.no_color {
            self.output.colored = false;
        }
    }
}

static BRACED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));
static BARE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"));

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unset variables are left as written.
fn expand_env_vars(content: &str) -> String {
    let substitute = |caps: &Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    };
    let braced = BRACED_VAR.replace_all(content, substitute);
    BARE_VAR.replace_all(&braced, substitute).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.analysis.only_types.is_empty());
        assert_eq!(config.analysis.max_findings, 20);
        assert!(config.output.colored);
        assert!(config.output.pretty);
        assert!(!config.ci.enabled);
        assert_eq!(config.ci.threshold().unwrap(), Severity::High);
    }

    #[test]
    fn test_config_from_yaml_nested() {
        let yaml = r"
analysis:
  only_types:
    - aws_db_instance
  exclude_tags: [ops]
  max_findings: 5
output:
  colored: false
ci:
  enabled: true
  fail_on: Medium
";

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.analysis.only_types, vec!["aws_db_instance"]);
        assert_eq!(config.analysis.exclude_tags, vec!["ops"]);
        assert_eq!(config.analysis.effective_max_findings(), 5);
        assert!(!config.output.colored);
        assert!(config.output.pretty);
        assert!(config.ci.enabled);
        assert_eq!(config.ci.threshold().unwrap(), Severity::Medium);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = Config::from_yaml("output:\n  verbose: true\n").unwrap();
        assert!(config.output.verbose);
        assert!(config.output.colored);
        assert_eq!(config.analysis, AnalysisOptions::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml("# nothing\n").unwrap(), Config::default());
    }

    #[test]
    fn test_non_positive_max_findings_defaults() {
        for max in [0, -3] {
            let options = AnalysisOptions { max_findings: max, ..AnalysisOptions::default() };
            assert_eq!(options.effective_max_findings(), DEFAULT_MAX_FINDINGS);
        }
    }

    #[test]
    fn test_unknown_threshold_rejected() {
        let err = Config::from_yaml("ci:\n  fail_on: critical\n").unwrap_err();
        assert!(matches!(err, TfWhyError::ConfigValue { .. }));
        assert!(err.to_string().contains("ci.fail_on"));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let err = Config::from_yaml("analysis: [unclosed").unwrap_err();
        assert!(matches!(err, TfWhyError::ConfigParse { .. }));
    }

    #[test]
    fn test_env_var_expansion_leaves_unset() {
        let content = "fail_on: ${TF_WHY_SURELY_UNSET_VAR} $ALSO_NOT_SET_TF_WHY";
        assert_eq!(expand_env_vars(content), content);
        assert_eq!(expand_env_vars("no vars here"), "no vars here");
    }

    #[test]
    fn test_env_var_expansion_reads_environment() {
        // PATH is set in any test environment.
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env_vars("${PATH}"), path);
        assert_eq!(expand_env_vars("$PATH"), path);
    }

    #[test]
    fn test_example_yaml_is_valid() {
        let config = Config::from_yaml(&Config::example_yaml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_merge_cli_args() {
        let cli = crate::cli::Cli::parse_from([
            "tf-why",
            "analyze",
            "--only",
            "aws_instance,aws_s3_bucket",
            "--exclude-tag",
            "ops",
            "--max-findings",
            "3",
            "--ci",
            "--fail-on",
            "low",
            "--no-color",
        ]);
        let crate::cli::Commands::Analyze(args) = cli.command else {
            panic!("Expected Analyze command");
        };

        let mut config = Config::from_yaml("analysis:\n  exclude_tags: [cost]\n").unwrap();
        config.merge_cli_args(&args);

        assert_eq!(config.analysis.only_types, vec!["aws_instance", "aws_s3_bucket"]);
        assert_eq!(config.analysis.exclude_tags, vec!["cost", "ops"]);
        assert_eq!(config.analysis.max_findings, 3);
        assert!(config.ci.enabled);
        assert_eq!(config.ci.threshold().unwrap(), Severity::Low);
        assert!(!config.output.colored);
    }
}
