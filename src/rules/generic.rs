//! Catch-all rule for destructive actions.

use super::kms::KMS_TYPES;
use super::networking::NETWORKING_TYPES;
use super::rds::DATABASE_TYPES;
use super::{rationale_or, Rule, RuleFinding};
use crate::plan::{ActionKind, ResourceChange};
use crate::types::Severity;

/// Flags any replace or delete not already reported by a dedicated rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericRule;

impl Rule for GenericRule {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn evaluate(&self, rc: &ResourceChange) -> Vec<RuleFinding> {
        let action = rc.action();
        if !matches!(action, ActionKind::Replace | ActionKind::Delete)
            || owned_by_dedicated_rule(&rc.resource_type, action)
        {
            return Vec::new();
        }

        let finding = if action == ActionKind::Replace {
            RuleFinding::new(
                Severity::High,
                &rc.address,
                format!("Resource {} will be replaced (destroy + recreate)", rc.address),
            )
            .tags(&["downtime"])
            .why(rationale_or(rc, "Resource will be destroyed and recreated"))
            .recommend([
                "Confirm rollback plan; expect downtime",
                "Verify no dependent resources will break",
            ])
        } else {
            RuleFinding::new(
                Severity::High,
                &rc.address,
                format!("Resource {} will be deleted", rc.address),
            )
            .tags(&["ops"])
            .why(rationale_or(rc, "Resource will be destroyed"))
            .recommend([
                "Confirm resource is safe to destroy",
                "Check for dependent resources or data loss",
            ])
        };
        vec![finding]
    }
}

/// Type/action pairs reported elsewhere in the catalogue.
///
/// Databases are only claimed on replace: a plain database delete still
/// falls through to this rule.
fn owned_by_dedicated_rule(resource_type: &str, action: ActionKind) -> bool {
    (DATABASE_TYPES.contains(&resource_type) && action == ActionKind::Replace)
        || NETWORKING_TYPES.contains(&resource_type)
        || KMS_TYPES.contains(&resource_type)
}
