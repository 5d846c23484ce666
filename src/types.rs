//! Core data types used throughout tf-why.
//!
//! This module defines the output side of the pipeline:
//! - Severity levels and their ordering
//! - Aggregated findings and the change-kind summary
//! - The final analysis result
//! - Report formats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity level for findings.
///
/// Totally ordered: `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth a look
    Low,
    /// Likely to cause disruption if not reviewed
    Medium,
    /// Security exposure, data loss or downtime
    High,
}

impl Severity {
    /// Lowercase name, as used in JSON output and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown severity '{other}' (expected low, medium or high)")),
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable terminal output
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// A single finding in the final result.
///
/// `address` is the only cross-reference back to the plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    /// Severity level
    pub severity: Severity,

    /// Classification tags (e.g. `security`, `downtime`)
    pub tags: Vec<String>,

    /// One-line headline
    pub title: String,

    /// Address of the resource change this finding refers to
    pub address: String,

    /// Rationale lines
    pub why: Vec<String>,

    /// Remediation hints
    pub recommendations: Vec<String>,
}

impl Finding {
    /// Returns true if the finding carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Counts of resource changes by kind. Reads and no-ops are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Resources to be created
    pub create: usize,
    /// Resources to be updated in place
    pub update: usize,
    /// Resources to be destroyed
    pub delete: usize,
    /// Resources to be destroyed and recreated
    pub replace: usize,
}

impl ChangeSummary {
    /// Total number of counted changes.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.create + self.update + self.delete + self.replace
    }
}

/// Result of analyzing a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Change-kind counts over the whole plan, independent of filters
    pub summary: ChangeSummary,

    /// Retained findings, sorted by severity (desc) then address (asc)
    pub findings: Vec<Finding>,

    /// Highest severity among retained findings; `None` when there are none
    pub overall_severity: Option<Severity>,
}

impl AnalysisResult {
    /// Returns true if no findings were retained.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns true if the overall severity reaches `threshold`.
    #[must_use]
    pub fn meets_threshold(&self, threshold: Severity) -> bool {
        self.overall_severity.is_some_and(|s| s >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!(Severity::Low.max(Severity::High), Severity::High);
    }

    #[test_case("low", Severity::Low)]
    #[test_case("LOW", Severity::Low)]
    #[test_case("Medium", Severity::Medium)]
    #[test_case(" high ", Severity::High)]
    fn test_severity_from_str(input: &str, expected: Severity) {
        assert_eq!(input.parse::<Severity>().unwrap(), expected);
    }

    #[test]
    fn test_severity_from_str_unknown() {
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }

    #[test]
    fn test_meets_threshold() {
        let mut result = AnalysisResult::default();
        assert!(!result.meets_threshold(Severity::Low));

        result.overall_severity = Some(Severity::Medium);
        assert!(result.meets_threshold(Severity::Low));
        assert!(result.meets_threshold(Severity::Medium));
        assert!(!result.meets_threshold(Severity::High));
    }

    #[test]
    fn test_summary_total() {
        let summary = ChangeSummary { create: 1, update: 2, delete: 3, replace: 4 };
        assert_eq!(summary.total(), 10);
    }
}
