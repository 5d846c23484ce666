//! KMS key rule.

use super::{rationale_or, Rule, RuleFinding};
use crate::plan::{ActionKind, ResourceChange};
use crate::types::Severity;

/// Resource types owned by this rule.
pub(crate) const KMS_TYPES: &[&str] = &["aws_kms_key", "aws_kms_alias"];

/// Flags destruction of KMS keys and aliases.
#[derive(Debug, Clone, Copy, Default)]
pub struct KmsRule;

impl Rule for KmsRule {
    fn name(&self) -> &'static str {
        "kms"
    }

    fn evaluate(&self, rc: &ResourceChange) -> Vec<RuleFinding> {
        if !KMS_TYPES.contains(&rc.resource_type.as_str()) {
            return Vec::new();
        }
        let action = rc.action();
        if !matches!(action, ActionKind::Replace | ActionKind::Delete) {
            return Vec::new();
        }

        vec![RuleFinding::new(
            Severity::High,
            &rc.address,
            format!(
                "KMS resource {} will be {} (encrypted data at risk)",
                rc.address,
                action.past_tense()
            ),
        )
        .tags(&["security", "ops"])
        .why(rationale_or(rc, format!("KMS resource will be {}", action.past_tense())))
        .recommend([
            "Verify no data is encrypted with this key before destroying",
            "Consider scheduling key deletion with a waiting period",
            "Ensure key aliases are updated if key is being replaced",
        ])]
    }
}
