//! JSON report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{AnalysisResult, ChangeSummary, Finding};
use serde::Serialize;

/// JSON report generator.
#[derive(Debug, Clone, Copy)]
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(&self, result: &AnalysisResult) -> Result<String> {
        let report = JsonReport::from(result);

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };

        json.map_err(|e| {
            crate::err!(ReportGeneration {
                message: format!("Failed to serialize JSON report: {e}"),
            })
        })
    }
}

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Change counts by kind
    pub summary: &'a ChangeSummary,
    /// Highest retained severity, or `"none"`
    pub overall_severity: &'static str,
    /// Number of retained findings
    pub findings_count: usize,
    /// Retained findings in report order
    pub findings: &'a [Finding],
}

impl<'a> From<&'a AnalysisResult> for JsonReport<'a> {
    fn from(result: &'a AnalysisResult) -> Self {
        Self {
            summary: &result.summary,
            overall_severity: result.overall_severity.map_or("none", |s| s.as_str()),
            findings_count: result.findings.len(),
            findings: &result.findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn sample() -> AnalysisResult {
        AnalysisResult {
            summary: ChangeSummary { create: 0, update: 1, delete: 0, replace: 0 },
            findings: vec![Finding {
                severity: Severity::Medium,
                tags: vec!["downtime".into()],
                title: "Database engine version change on aws_db_instance.main".into(),
                address: "aws_db_instance.main".into(),
                why: vec!["engine_version: \"14.1\" → \"14.6\"".into()],
                recommendations: vec!["Schedule during maintenance window".into()],
            }],
            overall_severity: Some(Severity::Medium),
        }
    }

    #[test]
    fn test_json_shape() {
        let output = JsonReporter::new(&Config::default()).generate(&sample()).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(
            value,
            json!({
                "summary": {"create": 0, "update": 1, "delete": 0, "replace": 0},
                "overall_severity": "medium",
                "findings_count": 1,
                "findings": [{
                    "severity": "medium",
                    "tags": ["downtime"],
                    "title": "Database engine version change on aws_db_instance.main",
                    "address": "aws_db_instance.main",
                    "why": ["engine_version: \"14.1\" → \"14.6\""],
                    "recommendations": ["Schedule during maintenance window"]
                }]
            })
        );
    }

    #[test]
    fn test_empty_result_reports_none() {
        let output = JsonReporter::new(&Config::default())
            .generate(&AnalysisResult::default())
            .unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["overall_severity"], "none");
        assert_eq!(value["findings_count"], 0);
        assert_eq!(value["findings"], json!([]));
    }

    #[test]
    fn test_compact_output() {
        let mut config = Config::default();
        config.output.pretty = false;
        let output = JsonReporter::new(&config).generate(&sample()).unwrap();
        assert!(!output.contains('\n'));
        assert!(output.starts_with("{\"summary\":"));
    }
}
