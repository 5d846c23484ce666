//! Networking rule.

use super::{rationale_from_diffs, Rule, RuleFinding, MAX_RATIONALE_DIFFS};
use crate::plan::{ActionKind, ResourceChange};
use crate::types::Severity;

/// Resource types owned by this rule.
pub(crate) const NETWORKING_TYPES: &[&str] = &[
    "aws_route",
    "aws_route_table",
    "aws_network_acl",
    "aws_lb_listener",
    "aws_lb_listener_rule",
    "aws_nat_gateway",
];

/// Flags changes to routing, ACLs, listeners and NAT gateways.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkingRule;

impl Rule for NetworkingRule {
    fn name(&self) -> &'static str {
        "networking"
    }

    fn evaluate(&self, rc: &ResourceChange) -> Vec<RuleFinding> {
        if !NETWORKING_TYPES.contains(&rc.resource_type.as_str()) {
            return Vec::new();
        }

        let action = rc.action();
        let diffs = rc.change.diffs(MAX_RATIONALE_DIFFS);
        let mut why = rationale_from_diffs(rc, &diffs);
        match action {
            ActionKind::Replace | ActionKind::Delete => {
                if why.is_empty() {
                    why.push(format!("Networking resource will be {}", action.past_tense()));
                }
                vec![RuleFinding::new(
                    Severity::High,
                    &rc.address,
                    format!("Networking resource {} will be {}", rc.address, action.past_tense()),
                )
                .tags(&["network"])
                .why(why)
                .recommend([
                    "Verify network connectivity will not be disrupted",
                    "Plan for potential service interruption",
                    "Confirm dependent services can tolerate the change",
                ])]
            }
            // An update with no observable attribute change is not reported.
            ActionKind::Update if !diffs.is_empty() => {
                vec![RuleFinding::new(
                    Severity::Medium,
                    &rc.address,
                    format!("Networking resource {} will be updated", rc.address),
                )
                .tags(&["network"])
                .why(why)
                .recommend(["Review network attribute changes for connectivity impact"])]
            }
            _ => Vec::new(),
        }
    }
}
