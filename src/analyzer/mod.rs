//! Plan analysis.
//!
//! The [`Analyzer`] runs the rule catalogue over every resource change of a
//! [`Plan`] and aggregates the findings into an [`AnalysisResult`].
//!
//! # Algorithm Overview
//!
//! ## Phase 1: Summary
//!
//! Count create/update/delete/replace actions over the whole plan. Filters
//! never affect the summary.
//!
//! ## Phase 2: Evaluation
//!
//! Every resource change that is not a no-op or read (and whose type passes
//! `only_types`) is run through all rules in catalogue order. Resource
//! changes are evaluated in parallel, but results are collected in plan
//! order.
//!
//! ## Phase 3: Aggregation
//!
//! ```text
//! evaluate → drop excluded tags → drop exact duplicates
//!          → stable sort (severity desc, address asc) → truncate
//! ```
//!
//! The stable sort is the only ordering guarantee, so repeated runs over the
//! same plan produce identical results.
//!
//! # Example
//!
//! ```rust
//! use tf_why::analyzer::Analyzer;
//! use tf_why::config::AnalysisOptions;
//! use tf_why::plan::Plan;
//!
//! let plan = Plan::parse(br#"{"resource_changes":[{"address":"aws_s3_bucket.logs",
//!     "type":"aws_s3_bucket","change":{"actions":["delete"]}}]}"#).unwrap();
//! let result = Analyzer::new(AnalysisOptions::default()).analyze(&plan);
//! assert_eq!(result.findings.len(), 1);
//! assert_eq!(result.summary.delete, 1);
//! ```

use crate::config::{AnalysisOptions, Config};
use crate::plan::{ActionKind, Plan, ResourceChange};
use crate::rules::{catalogue, Rule};
use crate::types::{AnalysisResult, ChangeSummary, Finding};
use rayon::prelude::*;
use std::collections::HashSet;

/// Runs the rule catalogue over a plan.
pub struct Analyzer {
    options: AnalysisOptions,
    rules: Vec<Box<dyn Rule>>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("options", &self.options)
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Analyzer {
    /// Create an analyzer with the full rule catalogue.
    #[must_use]
    pub fn new(options: AnalysisOptions) -> Self {
        Self::with_rules(options, catalogue())
    }

    /// Create an analyzer from the `analysis` section of a configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.analysis.clone())
    }

    /// Create an analyzer with a custom rule list, evaluated in the given order.
    #[must_use]
    pub fn with_rules(options: AnalysisOptions, rules: Vec<Box<dyn Rule>>) -> Self {
        Self { options, rules }
    }

    /// Analyze a plan. Never fails: rules that cannot decode a payload
    /// contribute nothing.
    #[must_use]
    pub fn analyze(&self, plan: &Plan) -> AnalysisResult {
        tracing::debug!(
            resource_changes = plan.resource_changes.len(),
            rules = self.rules.len(),
            "Starting analysis"
        );

        // Phase 1: Summary
        let summary = summarize(plan);
        tracing::debug!(
            create = summary.create,
            update = summary.update,
            delete = summary.delete,
            replace = summary.replace,
            "Change summary computed"
        );

        // Phase 2: Evaluation
        let candidates: Vec<&ResourceChange> = plan
            .resource_changes
            .iter()
            .filter(|rc| self.is_candidate(rc))
            .collect();
        tracing::debug!(candidates = candidates.len(), "Evaluating resource changes");

        let raw: Vec<Finding> = candidates
            .par_iter()
            .map(|rc| self.evaluate(rc))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();
        tracing::debug!(raw_findings = raw.len(), "Rule evaluation complete");

        // Phase 3: Aggregation
        let findings = self.aggregate(raw);
        let overall_severity = findings.iter().map(|f| f.severity).max();

        tracing::debug!(
            findings = findings.len(),
            overall = overall_severity.map_or("none", |s| s.as_str()),
            "Analysis complete"
        );

        AnalysisResult {
            summary,
            findings,
            overall_severity,
        }
    }

    fn is_candidate(&self, rc: &ResourceChange) -> bool {
        if rc.action().is_passive() {
            return false;
        }
        self.options.only_types.is_empty()
            || self.options.only_types.iter().any(|t| *t == rc.resource_type)
    }

    /// All rules in order against one resource change.
    fn evaluate(&self, rc: &ResourceChange) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            let hits = rule.evaluate(rc);
            if !hits.is_empty() {
                tracing::trace!(
                    address = %rc.address,
                    rule = rule.name(),
                    findings = hits.len(),
                    "Rule matched"
                );
            }
            findings.extend(hits.into_iter().map(Finding::from));
        }
        findings
    }

    fn aggregate(&self, raw: Vec<Finding>) -> Vec<Finding> {
        let excluded: HashSet<&str> = self
            .options
            .exclude_tags
            .iter()
            .map(String::as_str)
            .collect();

        let mut seen = HashSet::new();
        let mut findings: Vec<Finding> = raw
            .into_iter()
            .filter(|f| !f.tags.iter().any(|t| excluded.contains(t.as_str())))
            .filter(|f| seen.insert(f.clone()))
            .collect();

        findings.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.address.cmp(&b.address))
        });

        let max = self.options.effective_max_findings();
        if findings.len() > max {
            tracing::debug!(dropped = findings.len() - max, max, "Truncating findings");
            findings.truncate(max);
        }
        findings
    }
}

/// Count changes by kind over the whole plan.
#[must_use]
pub fn summarize(plan: &Plan) -> ChangeSummary {
    plan.resource_changes
        .iter()
        .fold(ChangeSummary::default(), |mut summary, rc| {
            match rc.action() {
                ActionKind::Create => summary.create += 1,
                ActionKind::Update => summary.update += 1,
                ActionKind::Delete => summary.delete += 1,
                ActionKind::Replace => summary.replace += 1,
                ActionKind::NoOp | ActionKind::Read => {}
            }
            summary
        })
}
