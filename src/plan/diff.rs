//! Attribute-level diff extraction.
//!
//! Turns the opaque `before`/`after` trees of a change into a short, ordered
//! list of rendered differences suitable for finding rationale. Keys are
//! visited in lexicographic order so output is stable across runs, and only
//! the top level of the attribute map is compared.

use super::Marker;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Placeholder for values that must never be rendered.
pub const SENSITIVE: &str = "<sensitive>";
/// Placeholder for values only known after apply.
pub const UNKNOWN: &str = "<unknown>";
/// Placeholder for a key absent before the change.
pub const NOT_SET: &str = "(not set)";
/// Placeholder for a key absent after the change.
pub const REMOVED: &str = "(removed)";

/// Composite values longer than this are truncated.
const MAX_RENDERED_LEN: usize = 120;

/// One rendered attribute difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    /// Top-level attribute name
    pub path: String,
    /// Rendered prior value or placeholder
    pub before: String,
    /// Rendered planned value or placeholder
    pub after: String,
}

impl Diff {
    fn new(path: &str, before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            before: before.into(),
            after: after.into(),
        }
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} → {}", self.path, self.before, self.after)
    }
}

/// Extract attribute diffs between two state trees.
///
/// `after_sensitive` and `after_unknown` are raw marker payloads (bool or
/// map). Every key listed in a sensitive map is masked; a key is unknown only
/// when its `after_unknown` entry is `true`. At most `max` diffs are returned; `0` means unlimited. Returns an
/// empty list when neither side is an attribute map.
#[must_use]
pub fn extract_diffs(
    before: Option<&Value>,
    after: Option<&Value>,
    after_sensitive: Option<&Value>,
    after_unknown: Option<&Value>,
    max: usize,
) -> Vec<Diff> {
    let sensitive = Marker::sensitive(after_sensitive);
    let unknown = Marker::unknown(after_unknown);
    extract_with_markers(before, after, &sensitive, &unknown, max)
}

pub(crate) fn extract_with_markers(
    before: Option<&Value>,
    after: Option<&Value>,
    sensitive: &Marker,
    unknown: &Marker,
    max: usize,
) -> Vec<Diff> {
    let before_map = before.and_then(Value::as_object);
    let after_map = after.and_then(Value::as_object);

    if before_map.is_none() && after_map.is_none() {
        return Vec::new();
    }

    let keys: BTreeSet<&String> = before_map
        .into_iter()
        .chain(after_map)
        .flat_map(|m| m.keys())
        .collect();

    let mut diffs = Vec::new();
    for key in keys {
        if max > 0 && diffs.len() >= max {
            break;
        }

        let old = before_map.and_then(|m| m.get(key));
        let new = after_map.and_then(|m| m.get(key));

        if sensitive.contains(key) {
            match (old, new) {
                (Some(_), Some(_)) => diffs.push(Diff::new(key, SENSITIVE, SENSITIVE)),
                (None, Some(_)) => diffs.push(Diff::new(key, NOT_SET, SENSITIVE)),
                (Some(_), None) => diffs.push(Diff::new(key, SENSITIVE, REMOVED)),
                (None, None) => {}
            }
            continue;
        }

        if unknown.contains(key) {
            let rendered = old.map_or_else(|| NOT_SET.to_string(), render_value);
            diffs.push(Diff::new(key, rendered, UNKNOWN));
            continue;
        }

        match (old, new) {
            (None, Some(a)) => diffs.push(Diff::new(key, NOT_SET, render_value(a))),
            (Some(b), None) => diffs.push(Diff::new(key, render_value(b), REMOVED)),
            (Some(b), Some(a)) => {
                if canonical(b) != canonical(a) {
                    diffs.push(Diff::new(key, render_value(b), render_value(a)));
                }
            }
            (None, None) => {}
        }
    }

    diffs
}

/// Render `replace_paths` (a list of segment lists) as dotted strings.
///
/// Anything that is not a list of lists yields an empty result; individual
/// malformed entries are skipped.
#[must_use]
pub fn extract_replace_paths(raw: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(paths)) = raw else {
        return Vec::new();
    };

    paths
        .iter()
        .filter_map(Value::as_array)
        .map(|segments| {
            segments
                .iter()
                .map(|seg| match seg {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect()
}

/// Render a single attribute value for display.
///
/// Strings are quoted, integral numbers lose their decimal point, and
/// lists/maps become compact JSON truncated to 120 characters.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(_) => canonical(value),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        Value::Array(_) | Value::Object(_) => truncate(&canonical(value), MAX_RENDERED_LEN),
    }
}

// serde_json maps are key-sorted, so this is stable for equal trees.
fn canonical(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}
