//! Security group ingress rule.

use super::{as_int, Rule, RuleFinding};
use crate::plan::{ActionKind, ResourceChange};
use crate::types::Severity;
use serde_json::{Map, Value};

/// Ports that should never be reachable from the whole internet.
const DANGEROUS_PORTS: &[(i64, &str)] = &[
    (22, "SSH"),
    (3389, "RDP"),
    (5432, "PostgreSQL"),
    (3306, "MySQL"),
    (9200, "Elasticsearch"),
    (6379, "Redis"),
];

const OPEN_CIDRS: &[&str] = &["0.0.0.0/0", "::/0"];

/// An ingress rule normalized across the three resource shapes.
#[derive(Debug)]
struct Ingress<'a> {
    cidrs: Vec<&'a str>,
    protocol: &'a str,
    from_port: i64,
    to_port: i64,
}

impl<'a> Ingress<'a> {
    /// `aws_security_group_rule` and inline `ingress` blocks.
    fn from_classic(attrs: &'a Map<String, Value>) -> Self {
        let cidrs = ["cidr_blocks", "ipv6_cidr_blocks"]
            .iter()
            .filter_map(|key| attrs.get(*key).and_then(Value::as_array))
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        Self {
            cidrs,
            protocol: attrs.get("protocol").and_then(Value::as_str).unwrap_or_default(),
            from_port: as_int(attrs.get("from_port")).unwrap_or(0),
            to_port: as_int(attrs.get("to_port")).unwrap_or(0),
        }
    }

    /// `aws_vpc_security_group_ingress_rule`.
    fn from_vpc_rule(attrs: &'a Map<String, Value>) -> Self {
        let cidrs = ["cidr_ipv4", "cidr_ipv6"]
            .iter()
            .filter_map(|key| attrs.get(*key).and_then(Value::as_str))
            .collect();
        Self {
            cidrs,
            protocol: attrs.get("ip_protocol").and_then(Value::as_str).unwrap_or_default(),
            from_port: as_int(attrs.get("from_port")).unwrap_or(0),
            to_port: as_int(attrs.get("to_port")).unwrap_or(0),
        }
    }

    fn open_cidrs(&self) -> Vec<&'a str> {
        self.cidrs
            .iter()
            .copied()
            .filter(|c| OPEN_CIDRS.contains(c))
            .collect()
    }

    fn all_ports(&self) -> bool {
        matches!(self.protocol, "-1" | "all")
    }

    fn covers(&self, port: i64) -> bool {
        self.all_ports() || (self.from_port..=self.to_port).contains(&port)
    }
}

/// Flags internet-facing ingress on well-known administrative and database ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityGroupRule;

impl Rule for SecurityGroupRule {
    fn name(&self) -> &'static str {
        "security_group"
    }

    fn evaluate(&self, rc: &ResourceChange) -> Vec<RuleFinding> {
        if !matches!(
            rc.action(),
            ActionKind::Create | ActionKind::Update | ActionKind::Replace
        ) {
            return Vec::new();
        }
        let Some(after) = rc.change.after_map() else {
            return Vec::new();
        };

        let rules: Vec<Ingress<'_>> = match rc.resource_type.as_str() {
            "aws_security_group_rule" => {
                if after.get("type").and_then(Value::as_str) != Some("ingress") {
                    return Vec::new();
                }
                vec![Ingress::from_classic(after)]
            }
            "aws_security_group" => after
                .get("ingress")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_object)
                .map(Ingress::from_classic)
                .collect(),
            "aws_vpc_security_group_ingress_rule" => vec![Ingress::from_vpc_rule(after)],
            _ => return Vec::new(),
        };

        rules
            .iter()
            .flat_map(|ingress| exposed_ports(ingress, &rc.address))
            .collect()
    }
}

fn exposed_ports(ingress: &Ingress<'_>, address: &str) -> Vec<RuleFinding> {
    let open = ingress.open_cidrs();
    if open.is_empty() {
        return Vec::new();
    }
    let cidrs = open.join(", ");
    let protocol = ingress.protocol;

    DANGEROUS_PORTS
        .iter()
        .filter(|(port, _)| ingress.covers(*port))
        .map(|(port, service)| {
            RuleFinding::new(
                Severity::High,
                address,
                format!("{service} port {port} ({protocol}) open to the internet on {address}"),
            )
            .tags(&["security"])
            .why([
                format!("CIDR {cidrs} allows inbound traffic on port {port} ({service})"),
                format!(
                    "Protocol: {protocol}, Port range: {}-{}",
                    ingress.from_port, ingress.to_port
                ),
            ])
            .recommend([
                format!("Restrict CIDR to specific IP ranges instead of {cidrs}"),
                format!("Use a bastion host or VPN for {service} access"),
            ])
        })
        .collect()
}
