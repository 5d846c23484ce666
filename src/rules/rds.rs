//! Database (RDS) rule.

use super::{both_states, rationale_or, Rule, RuleFinding};
use crate::plan::{ActionKind, ResourceChange};
use crate::types::Severity;
use serde_json::Value;

/// Resource types owned by this rule.
pub(crate) const DATABASE_TYPES: &[&str] = &[
    "aws_db_instance",
    "aws_rds_cluster",
    "aws_rds_cluster_instance",
];

/// Flags database replacement and engine version changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseRule;

impl Rule for DatabaseRule {
    fn name(&self) -> &'static str {
        "database"
    }

    fn evaluate(&self, rc: &ResourceChange) -> Vec<RuleFinding> {
        if !DATABASE_TYPES.contains(&rc.resource_type.as_str()) {
            return Vec::new();
        }

        let action = rc.action();
        let mut findings = Vec::new();

        if action == ActionKind::Replace {
            findings.push(
                RuleFinding::new(
                    Severity::High,
                    &rc.address,
                    format!("Database {} will be replaced (potential data loss)", rc.address),
                )
                .tags(&["downtime", "data"])
                .why(rationale_or(rc, "Database resource will be destroyed and recreated"))
                .recommend([
                    "Take a snapshot before applying",
                    "Confirm rollback plan; expect downtime",
                    "Verify data migration strategy",
                ]),
            );
        }

        if matches!(action, ActionKind::Update | ActionKind::Replace) {
            findings.extend(engine_version_change(rc));
        }

        findings
    }
}

fn engine_version_change(rc: &ResourceChange) -> Option<RuleFinding> {
    let (before, after) = both_states(rc)?;
    let old = before.get("engine_version").and_then(Value::as_str)?;
    let new = after.get("engine_version").and_then(Value::as_str)?;
    if old.is_empty() || new.is_empty() || old == new {
        return None;
    }

    let (severity, title) = if is_major_bump(old, new) {
        (
            Severity::High,
            format!("Major database engine version upgrade on {}", rc.address),
        )
    } else {
        (
            Severity::Medium,
            format!("Database engine version change on {}", rc.address),
        )
    };

    Some(
        RuleFinding::new(severity, &rc.address, title)
            .tags(&["downtime"])
            .why([format!("engine_version: \"{old}\" → \"{new}\"")])
            .recommend([
                "Test the upgrade in a staging environment first",
                "Review engine changelog for breaking changes",
                "Schedule during maintenance window",
            ]),
    )
}

/// The leading dot-separated component differs ("11.9" vs "16.1").
fn is_major_bump(old: &str, new: &str) -> bool {
    let major = |v: &str| v.split('.').next().unwrap_or_default().to_string();
    let (a, b) = (major(old), major(new));
    !a.is_empty() && !b.is_empty() && a != b
}
