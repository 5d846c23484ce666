//! Terraform plan model.
//!
//! Typed view of the JSON produced by `terraform show -json <planfile>`.
//! Only the shape is decoded: unknown fields are ignored and missing or
//! `null` fields fall back to empty values. Attribute payloads (`before`,
//! `after`, markers) stay as [`serde_json::Value`] trees because their shape
//! depends on the resource type; every consumer pattern-matches them and
//! treats a type mismatch as "not applicable".
//!
//! # Example
//!
//! ```rust
//! use tf_why::plan::{ActionKind, Plan};
//!
//! let plan = Plan::parse(br#"{"resource_changes":[{"address":"aws_instance.web",
//!     "type":"aws_instance","change":{"actions":["delete","create"]}}]}"#).unwrap();
//! assert_eq!(plan.resource_changes[0].action(), ActionKind::Replace);
//! ```

pub mod diff;

pub use diff::{extract_diffs, extract_replace_paths, render_value, Diff};

use crate::error::Result;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// A parsed plan. Immutable once constructed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Plan {
    /// Plan JSON format version (e.g. "1.2")
    #[serde(default, deserialize_with = "null_as_default")]
    pub format_version: String,

    /// Terraform version that produced the plan
    #[serde(default, deserialize_with = "null_as_default")]
    pub terraform_version: String,

    /// Resource changes, in plan order
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_changes: Vec<ResourceChange>,
}

impl Plan {
    /// Decode a plan from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` when `bytes` is empty, and `MalformedInput` when
    /// it is not JSON of the expected shape. Whitespace alone is malformed.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(crate::err!(EmptyInput));
        }

        let plan: Self = serde_json::from_slice(bytes).map_err(|e| {
            crate::err!(MalformedInput {
                message: e.to_string(),
                source: e,
            })
        })?;

        tracing::debug!(
            format_version = %plan.format_version,
            resource_changes = plan.resource_changes.len(),
            "Parsed plan"
        );
        Ok(plan)
    }
}

/// One resource's proposed transition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceChange {
    /// Full resource address (e.g. `module.db.aws_db_instance.main`)
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,

    /// Resource type (e.g. `aws_db_instance`)
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub resource_type: String,

    /// Resource name label
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Provider that manages the resource
    #[serde(rename = "provider_name", default, deserialize_with = "null_as_default")]
    pub provider: String,

    /// The before/after change record
    #[serde(default, deserialize_with = "null_as_default")]
    pub change: Change,
}

impl ResourceChange {
    /// Canonical action kind for this change.
    #[must_use]
    pub fn action(&self) -> ActionKind {
        ActionKind::from_actions(&self.change.actions)
    }
}

/// Before/after state for a resource change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Change {
    /// Raw action tokens, e.g. `["delete", "create"]`
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<String>,

    /// Prior attribute values; `None` when the resource does not exist yet
    #[serde(default)]
    pub before: Option<Value>,

    /// Planned attribute values; `None` when the resource is being destroyed
    #[serde(default)]
    pub after: Option<Value>,

    /// Which planned attributes are only known after apply
    #[serde(default)]
    pub after_unknown: Option<Value>,

    /// Which prior attributes are sensitive (bool or map)
    #[serde(default)]
    pub before_sensitive: Option<Value>,

    /// Which planned attributes are sensitive (bool or map)
    #[serde(default)]
    pub after_sensitive: Option<Value>,

    /// Attribute paths that force replacement
    #[serde(default)]
    pub replace_paths: Option<Value>,
}

impl Change {
    /// Prior state as an attribute map, if it is one.
    #[must_use]
    pub fn before_map(&self) -> Option<&serde_json::Map<String, Value>> {
        self.before.as_ref().and_then(Value::as_object)
    }

    /// Planned state as an attribute map, if it is one.
    #[must_use]
    pub fn after_map(&self) -> Option<&serde_json::Map<String, Value>> {
        self.after.as_ref().and_then(Value::as_object)
    }

    /// Attribute-level diffs for this change, at most `max` (0 = unlimited).
    ///
    /// Keys marked sensitive on either side of the change are masked.
    #[must_use]
    pub fn diffs(&self, max: usize) -> Vec<Diff> {
        let sensitive = Marker::sensitive(self.before_sensitive.as_ref())
            .union(Marker::sensitive(self.after_sensitive.as_ref()));
        let unknown = Marker::unknown(self.after_unknown.as_ref());
        diff::extract_with_markers(self.before.as_ref(), self.after.as_ref(), &sensitive, &unknown, max)
    }

    /// Replace-trigger paths rendered as dotted strings.
    #[must_use]
    pub fn replace_paths(&self) -> Vec<String> {
        extract_replace_paths(self.replace_paths.as_ref())
    }
}

/// Canonical classification of a raw action token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActionKind {
    /// Nothing changes (also the fallback for unrecognized token lists)
    #[default]
    NoOp,
    /// Resource will be created
    Create,
    /// Resource will be updated in place
    Update,
    /// Resource will be destroyed
    Delete,
    /// Resource will be destroyed and recreated (either order)
    Replace,
    /// Data source will be read
    Read,
}

impl ActionKind {
    /// Classify a raw action token list.
    ///
    /// Never fails: any shape that is not recognized is a no-op.
    #[must_use]
    pub fn from_actions<S: AsRef<str>>(actions: &[S]) -> Self {
        match actions {
            [single] => match single.as_ref() {
                "create" => Self::Create,
                "delete" => Self::Delete,
                "update" => Self::Update,
                "read" => Self::Read,
                _ => Self::NoOp,
            },
            [first, second] => match (first.as_ref(), second.as_ref()) {
                ("delete", "create") | ("create", "delete") => Self::Replace,
                _ => Self::NoOp,
            },
            _ => Self::NoOp,
        }
    }

    /// Returns true for kinds that describe no real infrastructure change.
    #[must_use]
    pub const fn is_passive(self) -> bool {
        matches!(self, Self::NoOp | Self::Read)
    }

    /// Lowercase name of this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Replace => "replace",
            Self::Read => "read",
        }
    }

    /// Past participle used in finding text ("deleted", "replaced").
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::NoOp => "left unchanged",
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
            Self::Replace => "replaced",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sensitivity or unknown-value marker payload.
///
/// Terraform emits either a bare boolean (`true` = the whole object) or a map
/// mirroring the attribute tree. Only the top level is inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Marker {
    /// Nothing is marked
    #[default]
    Unmarked,
    /// Every key is marked
    AllMarked,
    /// Exactly these top-level keys are marked
    Keyed(BTreeSet<String>),
}

impl Marker {
    /// Decode a `before_sensitive`/`after_sensitive` payload.
    ///
    /// Every key present in a map is marked, whatever its value.
    #[must_use]
    pub fn sensitive(value: Option<&Value>) -> Self {
        Self::decode(value, |_| true)
    }

    /// Decode an `after_unknown` payload.
    ///
    /// Only keys whose value is `true` are marked.
    #[must_use]
    pub fn unknown(value: Option<&Value>) -> Self {
        Self::decode(value, |v| *v == Value::Bool(true))
    }

    fn decode(value: Option<&Value>, marks: impl Fn(&Value) -> bool) -> Self {
        match value {
            Some(Value::Bool(true)) => Self::AllMarked,
            Some(Value::Object(map)) => {
                let keys: BTreeSet<String> = map
                    .iter()
                    .filter(|(_, v)| marks(v))
                    .map(|(k, _)| k.clone())
                    .collect();
                if keys.is_empty() {
                    Self::Unmarked
                } else {
                    Self::Keyed(keys)
                }
            }
            _ => Self::Unmarked,
        }
    }

    /// Returns true if `key` is marked.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        match self {
            Self::Unmarked => false,
            Self::AllMarked => true,
            Self::Keyed(keys) => keys.contains(key),
        }
    }

    /// Combine two markers; a key is marked if either marks it.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        match (self, other) {
            (Self::AllMarked, _) | (_, Self::AllMarked) => Self::AllMarked,
            (Self::Unmarked, m) | (m, Self::Unmarked) => m,
            (Self::Keyed(mut a), Self::Keyed(b)) => {
                a.extend(b);
                Self::Keyed(a)
            }
        }
    }
}

/// Deserialize `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
