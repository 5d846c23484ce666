//! Report generation module.
//!
//! This module provides report generation in multiple formats:
//! - JSON: Machine-readable structured output
//! - Text: Human-readable CLI output
//!
//! Neither format carries timestamps, so the same result always renders to
//! the same bytes.
//!
//! # Example
//!
//! ```rust
//! use tf_why::reporter::Reporter;
//! use tf_why::types::{AnalysisResult, ReportFormat};
//! use tf_why::Config;
//!
//! let mut config = Config::default();
//! config.output.colored = false;
//! let reporter = Reporter::new(&config);
//!
//! let text = reporter.generate(&AnalysisResult::default(), ReportFormat::Text).unwrap();
//! assert!(text.contains("TERRAFORM PLAN ANALYSIS"));
//! ```

mod json;
mod text;

use crate::config::Config;
use crate::error::Result;
use crate::types::{AnalysisResult, ReportFormat};

pub use json::{JsonReport, JsonReporter};
pub use text::TextReporter;

/// Report generator that supports multiple output formats.
#[derive(Debug, Clone)]
pub struct Reporter {
    config: Config,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    ///
    /// Colour is taken from `output.colored` as-is; callers resolve terminal
    /// and `NO_COLOR` detection before building the reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Generate a report in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn generate(&self, result: &AnalysisResult, format: ReportFormat) -> Result<String> {
        tracing::debug!(?format, findings = result.findings.len(), "Generating report");
        match format {
            ReportFormat::Json => JsonReporter::new(&self.config).generate(result),
            ReportFormat::Text => TextReporter::new(&self.config).generate(result),
        }
    }
}

/// Trait for report generators.
pub trait ReportGenerator {
    /// Generate a report from an analysis result.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn generate(&self, result: &AnalysisResult) -> Result<String>;
}
