//! ECS service capacity rule.

use super::{as_int, both_states, Rule, RuleFinding};
use crate::plan::{ActionKind, ResourceChange};
use crate::types::Severity;
use serde_json::{Map, Value};

const MIN_HEALTHY: &str = "deployment_minimum_healthy_percent";

/// Flags in-place ECS service updates that reduce capacity or deployment safety.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcsServiceRule;

impl Rule for EcsServiceRule {
    fn name(&self) -> &'static str {
        "ecs_service"
    }

    fn evaluate(&self, rc: &ResourceChange) -> Vec<RuleFinding> {
        if rc.resource_type != "aws_ecs_service" || rc.action() != ActionKind::Update {
            return Vec::new();
        }
        let Some((before, after)) = both_states(rc) else {
            return Vec::new();
        };

        let mut findings = Vec::new();

        if let Some((old, new)) = decreased(
            as_int(before.get("desired_count")),
            as_int(after.get("desired_count")),
        ) {
            findings.push(
                RuleFinding::new(
                    Severity::Medium,
                    &rc.address,
                    format!("ECS desired_count decreased on {}", rc.address),
                )
                .tags(&["ops", "capacity"])
                .why([format!("desired_count: {old} → {new}")])
                .recommend([
                    "Verify capacity is sufficient for current load",
                    "Consider scaling down gradually",
                ]),
            );
        }

        if let Some((old, new)) = decreased(min_healthy_percent(before), min_healthy_percent(after)) {
            findings.push(
                RuleFinding::new(
                    Severity::Medium,
                    &rc.address,
                    format!("ECS {MIN_HEALTHY} decreased on {}", rc.address),
                )
                .tags(&["ops"])
                .why([format!("{MIN_HEALTHY}: {old} → {new}")])
                .recommend([
                    "Lower minimum healthy percent increases risk of downtime during deployments",
                    "Ensure health checks and rollback are configured",
                ]),
            );
        }

        findings
    }
}

/// `Some((old, new))` when a positive value went down to a non-negative one.
fn decreased(old: Option<i64>, new: Option<i64>) -> Option<(i64, i64)> {
    match (old?, new?) {
        (old, new) if old > 0 && new >= 0 && new < old => Some((old, new)),
        _ => None,
    }
}

/// Top level first, then `deployment_configuration` as an object or a
/// single-element list.
fn min_healthy_percent(attrs: &Map<String, Value>) -> Option<i64> {
    as_int(attrs.get(MIN_HEALTHY)).or_else(|| {
        let nested = match attrs.get("deployment_configuration")? {
            Value::Object(m) => m,
            Value::Array(items) => items.first()?.as_object()?,
            _ => return None,
        };
        as_int(nested.get(MIN_HEALTHY))
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::change;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scale_down() {
        let rc = change(
            "aws_ecs_service",
            &["update"],
            Some(json!({"desired_count": 4})),
            Some(json!({"desired_count": 1})),
        );
        let findings = EcsServiceRule.evaluate(&rc);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].tags, vec!["ops", "capacity"]);
        assert_eq!(findings[0].why, vec!["desired_count: 4 → 1"]);
    }

    #[test]
    fn test_scale_up_and_zero_baseline_quiet() {
        let up = change(
            "aws_ecs_service",
            &["update"],
            Some(json!({"desired_count": 1})),
            Some(json!({"desired_count": 3})),
        );
        assert!(EcsServiceRule.evaluate(&up).is_empty());

        let from_zero = change(
            "aws_ecs_service",
            &["update"],
            Some(json!({"desired_count": 0})),
            Some(json!({"desired_count": 0})),
        );
        assert!(EcsServiceRule.evaluate(&from_zero).is_empty());
    }

    #[test]
    fn test_min_healthy_locations() {
        let top = json!({MIN_HEALTHY: 100});
        let nested = json!({"deployment_configuration": {MIN_HEALTHY: 50}});
        let listed = json!({"deployment_configuration": [{MIN_HEALTHY: 25}]});

        assert_eq!(min_healthy_percent(top.as_object().unwrap()), Some(100));
        assert_eq!(min_healthy_percent(nested.as_object().unwrap()), Some(50));
        assert_eq!(min_healthy_percent(listed.as_object().unwrap()), Some(25));
        assert_eq!(min_healthy_percent(&Map::new()), None);
    }

    #[test]
    fn test_min_healthy_decrease() {
        let rc = change(
            "aws_ecs_service",
            &["update"],
            Some(json!({"desired_count": 2, MIN_HEALTHY: 100})),
            Some(json!({"desired_count": 2, "deployment_configuration": {MIN_HEALTHY: 50}})),
        );
        let findings = EcsServiceRule.evaluate(&rc);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].tags, vec!["ops"]);
        assert_eq!(findings[0].why, vec!["deployment_minimum_healthy_percent: 100 → 50"]);
    }

    #[test]
    fn test_only_updates() {
        let rc = change(
            "aws_ecs_service",
            &["delete", "create"],
            Some(json!({"desired_count": 4})),
            Some(json!({"desired_count": 1})),
        );
        assert!(EcsServiceRule.evaluate(&rc).is_empty());
    }
}
