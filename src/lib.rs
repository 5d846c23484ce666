//! # tf-why
//!
//! Explain Terraform/OpenTofu plan changes with risk findings.
//!
//! tf-why reads the JSON form of a plan (`terraform show -json <planfile>`),
//! runs every resource change through a catalogue of risk rules and reports
//! what will change, why it matters and what to do about it.
//!
//! ## Features
//!
//! - **Plan model**: defensive decoding of `resource_changes`, action
//!   classification, sensitive and unknown value markers
//! - **Attribute diffs**: changed top-level attributes with secrets and
//!   unknown values masked
//! - **Rule catalogue**: IAM policies, security groups, databases, ECS
//!   services, networking, KMS and a generic replace/delete rule
//! - **Deterministic aggregation**: tag exclusion, type allow-list, stable
//!   severity ordering and truncation
//! - **Output formats**: colored text and JSON
//!
//! ## Example
//!
//! ```rust
//! use tf_why::config::AnalysisOptions;
//! use tf_why::Severity;
//!
//! let plan = br#"{"resource_changes":[{
//!     "address":"aws_db_instance.main","type":"aws_db_instance",
//!     "change":{"actions":["delete","create"]}}]}"#;
//!
//! let result = tf_why::explain(plan, &AnalysisOptions::default()).unwrap();
//! assert_eq!(result.overall_severity, Some(Severity::High));
//! assert_eq!(result.summary.replace, 1);
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod plan;
pub mod reporter;
pub mod rules;
pub mod terraform;
pub mod types;

// Re-export commonly used types at crate root
pub use analyzer::Analyzer;
pub use config::{AnalysisOptions, Config};
pub use error::{Result, TfWhyError};
pub use plan::Plan;
pub use types::{AnalysisResult, ChangeSummary, Finding, ReportFormat, Severity};

/// Decode plan JSON and analyze it in one step.
///
/// # Errors
///
/// Returns `EmptyInput` or `MalformedInput` if the bytes are not a plan.
/// Analysis itself cannot fail.
pub fn explain(bytes: &[u8], options: &AnalysisOptions) -> Result<AnalysisResult> {
    let plan = Plan::parse(bytes)?;
    Ok(Analyzer::new(options.clone()).analyze(&plan))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_empty_input() {
        let err = explain(b"", &AnalysisOptions::default()).unwrap_err();
        assert!(matches!(err, TfWhyError::EmptyInput { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_explain_malformed_input() {
        let err = explain(b"{not json", &AnalysisOptions::default()).unwrap_err();
        assert!(matches!(err, TfWhyError::MalformedInput { .. }));
    }

    #[test]
    fn test_explain_no_changes() {
        let result = explain(br#"{"format_version":"1.2"}"#, &AnalysisOptions::default()).unwrap();
        assert!(result.is_clean());
        assert_eq!(result.summary, ChangeSummary::default());
    }
}
