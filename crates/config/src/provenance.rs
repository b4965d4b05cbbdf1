//! Provenance utilities for operational debugging.
//!
//! Responsibilities:
//! - Emit and render the sorted `key=value` view of a set.
//! - Copy single keys between sets while keeping their earliest origin.
//! - Produce a machine-readable provenance report.
//!
//! Invariants:
//! - `render_as_text` output is deterministic for a given set of key/value
//!   pairs and independent of origins.

use serde::Serialize;

use crate::constants::DEFAULT_ORIGIN;
use crate::set::ConfigSet;

/// Log every `key=value` pair at info level in sorted key order, and return
/// the sorted keys.
pub fn dump_sorted(set: &ConfigSet) -> Vec<String> {
    let keys: Vec<String> = set.sorted_keys().into_iter().map(str::to_string).collect();
    for key in &keys {
        if let Some(value) = set.get(key) {
            tracing::info!("{}={}", key, value);
        }
    }
    keys
}

/// Render `set` as newline-terminated `key=value` lines in sorted key order.
///
/// # Example
///
/// ```
/// use strata_config::{ConfigSet, provenance::render_as_text};
///
/// let mut set = ConfigSet::new();
/// set.set("b", "2", "x");
/// set.set("a", "1", "y");
/// assert_eq!(render_as_text(&set), "a=1\nb=2\n");
/// ```
pub fn render_as_text(set: &ConfigSet) -> String {
    let mut output = String::new();
    for (key, value) in set.entries() {
        output.push_str(&format!("{key}={value}\n"));
    }
    output
}

/// Copy `key` from `src` into `dest`.
///
/// The copied value is recorded with the earliest origin `src` holds for the
/// key. Returns whether the key was present and copied.
///
/// Every stored key has at least one origin, so the `"programmatically"`
/// label is only a fallback for that invariant and is not reached by sets
/// built through this crate.
pub fn propagate(dest: &mut ConfigSet, src: &ConfigSet, key: &str) -> bool {
    let Some(value) = src.get(key) else {
        return false;
    };
    let origin = src
        .origins_of(key)
        .first()
        .map(String::as_str)
        .unwrap_or(DEFAULT_ORIGIN);
    dest.set(key, value, origin);
    true
}

/// Value and origin history of one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyProvenance {
    pub key: String,
    pub value: String,
    /// Oldest first; the last entry is the current origin.
    pub origins: Vec<String>,
    #[serde(rename = "final")]
    pub is_final: bool,
}

/// Provenance of every key, in sorted key order.
pub fn provenance_report(set: &ConfigSet) -> Vec<PropertyProvenance> {
    set.raw_entries()
        .map(|(key, entry)| PropertyProvenance {
            key: key.clone(),
            value: entry.value.clone(),
            origins: entry.origins.clone(),
            is_final: entry.is_final,
        })
        .collect()
}

/// [`provenance_report`] rendered as pretty-printed JSON.
pub fn render_report_json(set: &ConfigSet) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&provenance_report(set))
}
