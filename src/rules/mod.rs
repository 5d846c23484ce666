//! Risk rule catalogue.
//!
//! Each rule looks at one [`ResourceChange`] in isolation and returns zero or
//! more [`RuleFinding`]s. Rules are pure: no I/O, no shared state. A rule
//! that cannot decode the payload it expects returns nothing instead of
//! failing, so one odd resource never aborts analysis of the rest.
//!
//! # Evaluation order
//!
//! [`catalogue`] returns the rules in their declared order. The order is
//! observable because [`GenericRule`] is a catch-all that explicitly skips
//! the type/action pairs owned by the specific rules before it.
//!
//! | Rule | Types | Actions |
//! |------|-------|---------|
//! | IAM policy | policies, bucket policies, public access blocks | any change |
//! | Security group | groups and ingress rules | create, update, replace |
//! | Database | RDS instances/clusters | update, delete, replace |
//! | ECS service | `aws_ecs_service` | update |
//! | Networking | routes, ACLs, listeners, NAT | update, delete, replace |
//! | KMS | keys and aliases | delete, replace |
//! | Generic | everything else | delete, replace |

mod ecs;
mod generic;
mod iam;
mod kms;
mod networking;
mod rds;
mod security_group;

pub use ecs::EcsServiceRule;
pub use generic::GenericRule;
pub use iam::IamPolicyRule;
pub use kms::KmsRule;
pub use networking::NetworkingRule;
pub use rds::DatabaseRule;
pub use security_group::SecurityGroupRule;

use crate::plan::{ActionKind, Diff, ResourceChange};
use crate::types::{Finding, Severity};
use serde_json::{Map, Value};

/// Diffs cited in a finding's rationale are capped at this many.
pub const MAX_RATIONALE_DIFFS: usize = 10;

/// A finding as produced by a single rule, before aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFinding {
    /// Severity level
    pub severity: Severity,
    /// Classification tags
    pub tags: Vec<String>,
    /// One-line headline
    pub title: String,
    /// Address of the resource change
    pub address: String,
    /// Rationale lines
    pub why: Vec<String>,
    /// Remediation hints
    pub recommendations: Vec<String>,
}

impl RuleFinding {
    /// Start a finding for `address` with a severity and title.
    #[must_use]
    pub fn new(severity: Severity, address: &str, title: impl Into<String>) -> Self {
        Self {
            severity,
            tags: Vec::new(),
            title: title.into(),
            address: address.to_string(),
            why: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// Set the tags.
    #[must_use]
    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(ToString::to_string).collect();
        self
    }

    /// Set the rationale lines.
    #[must_use]
    pub fn why<I, S>(mut self, why: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.why = why.into_iter().map(Into::into).collect();
        self
    }

    /// Set the recommendation lines.
    #[must_use]
    pub fn recommend<I, S>(mut self, recommendations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recommendations = recommendations.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if the finding carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl From<RuleFinding> for Finding {
    fn from(f: RuleFinding) -> Self {
        Self {
            severity: f.severity,
            tags: f.tags,
            title: f.title,
            address: f.address,
            why: f.why,
            recommendations: f.recommendations,
        }
    }
}

/// A risk heuristic evaluated against one resource change at a time.
pub trait Rule: Send + Sync {
    /// Short stable identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Evaluate a resource change.
    fn evaluate(&self, change: &ResourceChange) -> Vec<RuleFinding>;
}

/// All rules in evaluation order. The catch-all runs last.
#[must_use]
pub fn catalogue() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(IamPolicyRule),
        Box::new(SecurityGroupRule),
        Box::new(DatabaseRule),
        Box::new(EcsServiceRule),
        Box::new(NetworkingRule),
        Box::new(KmsRule),
        Box::new(GenericRule),
    ]
}

/// Rationale lines for a change: rendered diffs followed by replace triggers.
pub(crate) fn change_rationale(rc: &ResourceChange) -> Vec<String> {
    rationale_from_diffs(rc, &rc.change.diffs(MAX_RATIONALE_DIFFS))
}

/// [`change_rationale`] over diffs the caller already extracted.
pub(crate) fn rationale_from_diffs(rc: &ResourceChange, diffs: &[Diff]) -> Vec<String> {
    let mut why: Vec<String> = diffs.iter().map(ToString::to_string).collect();
    why.extend(
        rc.change
            .replace_paths()
            .into_iter()
            .map(|p| format!("replace triggered by: {p}")),
    );
    why
}

/// Like [`change_rationale`], with `fallback` when there is nothing to cite.
pub(crate) fn rationale_or(rc: &ResourceChange, fallback: impl Into<String>) -> Vec<String> {
    let why = change_rationale(rc);
    if why.is_empty() {
        vec![fallback.into()]
    } else {
        why
    }
}

/// Both prior and planned attribute maps, when both exist.
pub(crate) fn both_states(rc: &ResourceChange) -> Option<(&Map<String, Value>, &Map<String, Value>)> {
    Some((rc.change.before_map()?, rc.change.after_map()?))
}

/// Integer view of a JSON number. Non-numbers are `None`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn as_int(value: Option<&Value>) -> Option<i64> {
    let n = value?.as_number()?;
    n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))
}

/// Returns true when the change is not a no-op or read.
pub(crate) fn is_active(action: ActionKind) -> bool {
    !action.is_passive()
}
