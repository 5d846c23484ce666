//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options, plus the CI exit-code policy.
//!
//! # Commands
//!
//! - `analyze`: Explain a plan and report risk findings
//! - `init`: Create an example configuration file
//! - `validate`: Validate a configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Analyze a saved plan
//! terraform show -json tfplan > plan.json
//! tf-why analyze --plan plan.json
//!
//! # Pipe from stdin
//! terraform show -json tfplan | tf-why analyze
//!
//! # Let tf-why run terraform
//! tf-why analyze --run --dir ./infra
//!
//! # Fail a pipeline on medium or worse
//! tf-why analyze --plan plan.json --ci --fail-on medium
//!
//! # Initialize configuration
//! tf-why init
//! ```

use crate::types::{AnalysisResult, ReportFormat, Severity};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Exit code when CI mode fails on a high overall severity.
pub const EXIT_HIGH: u8 = 20;

/// Exit code when CI mode fails on a low or medium overall severity.
pub const EXIT_BELOW_HIGH: u8 = 10;

/// tf-why - explain Terraform/OpenTofu plans with risk findings.
#[derive(Parser, Debug)]
#[command(
    name = "tf-why",
    author,
    version,
    about = "Explain Terraform/OpenTofu plan changes with risk findings",
    long_about = "tf-why reads the JSON form of a Terraform/OpenTofu plan, evaluates each \
                  resource change against a catalogue of risk rules (IAM, security groups, \
                  databases, ECS, networking, KMS) and explains what will change, why it \
                  matters and what to do about it.",
    after_help = "Produce plan JSON with: terraform show -json <planfile>"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TF_WHY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a plan and report risk findings
    #[command(visible_alias = "a")]
    Analyze(AnalyzeArgs),

    /// Create an example configuration file
    Init,

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Arguments for the analyze command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Plan JSON file (reads stdin if omitted)
    #[arg(short, long, value_name = "FILE", conflicts_with = "run")]
    pub plan: Option<PathBuf>,

    /// Run `terraform plan` and `terraform show -json` to produce the plan
    #[arg(long)]
    pub run: bool,

    /// Terraform working directory for --run
    #[arg(short, long, value_name = "DIR", default_value = ".", requires = "run")]
    pub dir: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exit non-zero when the overall severity reaches --fail-on
    #[arg(long)]
    pub ci: bool,

    /// Severity threshold for CI mode
    #[arg(long, value_name = "SEVERITY", value_enum)]
    pub fail_on: Option<Severity>,

    /// Only evaluate these resource types (comma separated)
    #[arg(long, value_name = "TYPES", value_delimiter = ',')]
    pub only: Vec<String>,

    /// Drop findings carrying any of these tags (comma separated)
    #[arg(long = "exclude-tag", value_name = "TAGS", value_delimiter = ',')]
    pub exclude_tags: Vec<String>,

    /// Maximum number of findings to report (<= 0 means 20)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub max_findings: Option<i64>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE", default_value = "tf-why.yaml")]
    pub config: PathBuf,
}

/// Exit code for a CI run: 20 when a high overall severity meets the
/// threshold, 10 for any other severity that meets it, 0 otherwise.
#[must_use]
pub fn ci_exit_code(result: &AnalysisResult, threshold: Severity) -> u8 {
    match result.overall_severity {
        Some(overall) if overall >= threshold => {
            if overall == Severity::High {
                EXIT_HIGH
            } else {
                EXIT_BELOW_HIGH
            }
        }
        _ => 0,
    }
}
