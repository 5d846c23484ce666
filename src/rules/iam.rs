//! IAM and bucket policy rule.

use super::{is_active, Rule, RuleFinding};
use crate::plan::ResourceChange;
use crate::types::Severity;
use serde_json::{Map, Value};
use std::collections::HashSet;

const POLICY_TYPES: &[&str] = &[
    "aws_iam_policy",
    "aws_iam_role_policy",
    "aws_iam_user_policy",
    "aws_iam_group_policy",
    "aws_s3_bucket_policy",
    "aws_s3_bucket_public_access_block",
];

const PUBLIC_ACCESS_BLOCK: &str = "aws_s3_bucket_public_access_block";

const PUBLIC_ACCESS_FIELDS: &[&str] = &[
    "block_public_acls",
    "block_public_policy",
    "ignore_public_acls",
    "restrict_public_buckets",
];

/// Flags wildcard and privilege-escalating statements in policy documents,
/// and weakened S3 public access blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct IamPolicyRule;

impl Rule for IamPolicyRule {
    fn name(&self) -> &'static str {
        "iam_policy"
    }

    fn evaluate(&self, rc: &ResourceChange) -> Vec<RuleFinding> {
        if !POLICY_TYPES.contains(&rc.resource_type.as_str()) || !is_active(rc.action()) {
            return Vec::new();
        }
        let Some(after) = rc.change.after_map() else {
            return Vec::new();
        };

        let mut findings = Vec::new();
        if let Some(document) = policy_document(after, &rc.address) {
            findings.extend(analyze_document(&document, &rc.address));
        }
        if rc.resource_type == PUBLIC_ACCESS_BLOCK {
            findings.extend(check_public_access_block(after, &rc.address));
        }
        findings
    }
}

/// Locate the policy document under `policy` or `document`.
///
/// Terraform usually stores it as a JSON string; an already-decoded object
/// is accepted as well.
fn policy_document(after: &Map<String, Value>, address: &str) -> Option<Value> {
    let raw = ["policy", "document"]
        .iter()
        .find_map(|key| after.get(*key).filter(|v| v.is_string() || v.is_object()))?;

    match raw {
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::debug!(address, error = %e, "Ignoring undecodable policy document");
                None
            }
        },
        other => Some(other.clone()),
    }
}

/// `Statement` may be a single object or a list of them.
fn statements(document: &Value) -> Vec<&Map<String, Value>> {
    match document.get("Statement") {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
        Some(Value::Object(single)) => vec![single],
        _ => Vec::new(),
    }
}

/// String or list-of-strings field; anything else is empty.
fn string_list(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn analyze_document(document: &Value, address: &str) -> Vec<RuleFinding> {
    let mut findings = Vec::new();

    for (i, statement) in statements(document).into_iter().enumerate() {
        for action in string_list(statement.get("Action")) {
            if action == "*" {
                findings.push(
                    RuleFinding::new(
                        Severity::High,
                        address,
                        format!("Wildcard Action \"*\" in IAM policy on {address}"),
                    )
                    .tags(&["security"])
                    .why([format!(
                        "Statement[{i}].Action includes \"*\" (allows all API actions)"
                    )])
                    .recommend([
                        "Restrict Action to specific API calls following least-privilege",
                        "Use IAM Access Analyzer to scope down permissions",
                    ]),
                );
            } else if action.ends_with(":*") {
                findings.push(
                    RuleFinding::new(
                        Severity::High,
                        address,
                        format!("Wildcard service Action \"{action}\" in IAM policy on {address}"),
                    )
                    .tags(&["security"])
                    .why([format!(
                        "Statement[{i}].Action includes \"{action}\" (allows all actions for service)"
                    )])
                    .recommend(["Restrict Action to specific API calls following least-privilege"]),
                );
            }

            let lower = action.to_ascii_lowercase();
            if lower == "iam:passrole" || lower == "sts:assumerole" {
                findings.push(
                    RuleFinding::new(
                        Severity::High,
                        address,
                        format!("Dangerous action \"{action}\" in IAM policy on {address}"),
                    )
                    .tags(&["security"])
                    .why([format!(
                        "Statement[{i}].Action includes \"{action}\" (privilege escalation risk)"
                    )])
                    .recommend([
                        "Restrict Resource to specific role/user ARNs",
                        "Add conditions to limit scope",
                    ]),
                );
            }
        }

        if string_list(statement.get("Resource")).contains(&"*") {
            findings.push(
                RuleFinding::new(
                    Severity::High,
                    address,
                    format!("Wildcard Resource \"*\" in IAM policy on {address}"),
                )
                .tags(&["security"])
                .why([format!(
                    "Statement[{i}].Resource is \"*\" (applies to all resources)"
                )])
                .recommend(["Restrict Resource to specific ARNs"]),
            );
        }
    }

    // First occurrence of each title wins.
    let mut seen = HashSet::new();
    findings.retain(|f| seen.insert(f.title.clone()));
    findings
}

fn check_public_access_block(after: &Map<String, Value>, address: &str) -> Option<RuleFinding> {
    let why: Vec<String> = PUBLIC_ACCESS_FIELDS
        .iter()
        .filter(|field| after.get(**field) == Some(&Value::Bool(false)))
        .map(|field| format!("{field} is false (public access not blocked)"))
        .collect();

    if why.is_empty() {
        return None;
    }

    Some(
        RuleFinding::new(
            Severity::High,
            address,
            format!("S3 public access protections weakened on {address}"),
        )
        .tags(&["security"])
        .why(why)
        .recommend([
            "Ensure all block_public_* and restrict_public_buckets are true",
            "Review bucket policy for unintended public access",
        ]),
    )
}

#[cfg(test)]
mod tests {
    use super::super::test_support::change;
    use super::*;
    use serde_json::json;

    fn policy_change(resource_type: &str, policy: &Value) -> ResourceChange {
        change(
            resource_type,
            &["update"],
            Some(json!({"policy": "{}"})),
            Some(json!({ "policy": policy.to_string() })),
        )
    }

    #[test]
    fn test_wildcard_action_and_resource() {
        let rc = policy_change(
            "aws_iam_policy",
            &json!({"Statement": [{"Effect": "Allow", "Action": "*", "Resource": "*"}]}),
        );
        let findings = IamPolicyRule.evaluate(&rc);

        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.severity == Severity::High && f.has_tag("security")));
        assert_eq!(
            findings[0].title,
            "Wildcard Action \"*\" in IAM policy on aws_iam_policy.test"
        );
        assert_eq!(
            findings[0].why,
            vec!["Statement[0].Action includes \"*\" (allows all API actions)"]
        );
        assert_eq!(
            findings[1].why,
            vec!["Statement[0].Resource is \"*\" (applies to all resources)"]
        );
    }

    #[test]
    fn test_service_wildcard_and_dangerous_actions() {
        let rc = policy_change(
            "aws_iam_role_policy",
            &json!({"Statement": [{"Action": ["s3:*", "iam:PassRole"], "Resource": "arn:aws:s3:::b"}]}),
        );
        let findings = IamPolicyRule.evaluate(&rc);
        let titles: Vec<_> = findings.iter().map(|f| f.title.as_str()).collect();

        assert_eq!(
            titles,
            vec![
                "Wildcard service Action \"s3:*\" in IAM policy on aws_iam_role_policy.test",
                "Dangerous action \"iam:PassRole\" in IAM policy on aws_iam_role_policy.test",
            ]
        );
    }

    #[test]
    fn test_single_statement_object_and_decoded_policy() {
        let rc = change(
            "aws_iam_group_policy",
            &["create"],
            None,
            Some(json!({"policy": {"Statement": {"Action": "sts:AssumeRole", "Resource": "*"}}})),
        );
        let findings = IamPolicyRule.evaluate(&rc);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].title.starts_with("Dangerous action \"sts:AssumeRole\""));
    }

    #[test]
    fn test_duplicate_titles_collapse() {
        let rc = policy_change(
            "aws_iam_policy",
            &json!({"Statement": [
                {"Action": "*", "Resource": "*"},
                {"Action": "*", "Resource": "*"}
            ]}),
        );
        let findings = IamPolicyRule.evaluate(&rc);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].why[0].starts_with("Statement[0]"));
    }

    #[test]
    fn test_invalid_policy_yields_nothing() {
        let rc = change(
            "aws_iam_policy",
            &["update"],
            None,
            Some(json!({"policy": "{not json"})),
        );
        assert!(IamPolicyRule.evaluate(&rc).is_empty());
    }

    #[test]
    fn test_document_field_fallback() {
        let doc = json!({"Statement": [{"Action": "*"}]}).to_string();
        let rc = change(
            "aws_s3_bucket_policy",
            &["update"],
            None,
            Some(json!({"document": doc})),
        );
        assert_eq!(IamPolicyRule.evaluate(&rc).len(), 1);
    }

    #[test]
    fn test_public_access_block() {
        let rc = change(
            "aws_s3_bucket_public_access_block",
            &["update"],
            Some(json!({"block_public_acls": true})),
            Some(json!({
                "block_public_acls": false,
                "block_public_policy": true,
                "ignore_public_acls": false,
                "restrict_public_buckets": null
            })),
        );
        let findings = IamPolicyRule.evaluate(&rc);

        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].why,
            vec![
                "block_public_acls is false (public access not blocked)",
                "ignore_public_acls is false (public access not blocked)",
            ]
        );
    }

    #[test]
    fn test_ignores_other_types_and_passive_actions() {
        let policy = json!({"Statement": [{"Action": "*"}]});
        assert!(IamPolicyRule.evaluate(&policy_change("aws_instance", &policy)).is_empty());

        let mut rc = policy_change("aws_iam_policy", &policy);
        rc.change.actions = vec!["no-op".into()];
        assert!(IamPolicyRule.evaluate(&rc).is_empty());
    }
}
