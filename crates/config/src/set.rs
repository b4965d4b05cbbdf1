//! The configuration set: key/value pairs with per-key provenance.
//!
//! Responsibilities:
//! - Store string values by unique key.
//! - Record, per key, the ordered history of origin labels that set it.
//! - Carry the pass-through `final` flag of each property.
//!
//! Does NOT handle:
//! - Reading or writing documents (see `loader.rs` and `persistence.rs`).
//! - Bulk merging (see `merge.rs`).
//!
//! Invariants:
//! - Every stored value has at least one origin; the last one is current.
//! - Absent values are rejected by `try_set`, never stored.
//! - Origins only move together with a value; there is no way to edit the
//!   history of a key without setting it.
//! - A set is not synchronized; concurrent mutation must be serialized by
//!   the caller.

use std::collections::BTreeMap;

use crate::error::{ConfigError, Result};

/// A stored value together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) value: String,
    pub(crate) origins: Vec<String>,
    pub(crate) is_final: bool,
}

/// A mapping from key to value, tracking the origin history of every key.
///
/// # Example
///
/// ```
/// use strata_config::ConfigSet;
///
/// let mut set = ConfigSet::new();
/// set.set("fs.default", "hdfs://nn:8020", "site.xml");
/// set.set("fs.default", "file:///", "override");
///
/// assert_eq!(set.get("fs.default"), Some("file:///"));
/// assert_eq!(set.origins_of("fs.default"), ["site.xml", "override"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSet {
    entries: BTreeMap<String, Entry>,
}

impl ConfigSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|entry| entry.value.as_str())
    }

    /// Whether `key` has a value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `value` under `key` and append `origin` to the key's history.
    ///
    /// A key that is new starts a fresh history with `origin` as its only
    /// entry.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        origin: impl Into<String>,
    ) {
        let entry = self.entries.entry(key.into()).or_insert_with(|| Entry {
            value: String::new(),
            origins: Vec::new(),
            is_final: false,
        });
        entry.value = value.into();
        entry.origins.push(origin.into());
    }

    /// Store a value that may be absent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming `key` if `value` is `None`;
    /// the set is left untouched in that case.
    pub fn try_set<K, V>(
        &mut self,
        key: K,
        value: Option<V>,
        origin: impl Into<String>,
    ) -> Result<()>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        match value {
            Some(value) => {
                self.set(key, value, origin);
                Ok(())
            }
            None => Err(ConfigError::invalid_value(key)),
        }
    }

    /// Iterate over `(key, value)` pairs.
    ///
    /// Iteration order is stable for a given set of keys but callers should
    /// not rely on it matching insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry.value.as_str()))
    }

    /// Keys in ascending lexicographic order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Origin history of `key`, oldest first. Empty if the key is absent.
    pub fn origins_of(&self, key: &str) -> &[String] {
        self.entries
            .get(key)
            .map(|entry| entry.origins.as_slice())
            .unwrap_or_default()
    }

    /// The most recently recorded origin of `key`.
    pub fn current_origin(&self, key: &str) -> Option<&str> {
        self.origins_of(key).last().map(String::as_str)
    }

    /// Mark an existing key final (or not). Returns false if the key is absent.
    ///
    /// The flag is carried through parse and serialize; this crate does not
    /// otherwise act on it.
    pub fn set_final(&mut self, key: &str, is_final: bool) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.is_final = is_final;
                true
            }
            None => false,
        }
    }

    /// Whether `key` is marked final.
    pub fn is_final(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.is_final)
    }

    /// Copy the key/value pairs into a plain map, dropping provenance.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    /// Replace whatever `key` holds with a single-origin entry.
    pub(crate) fn reset(&mut self, key: String, value: String, origin: &str, is_final: bool) {
        self.entries.insert(
            key,
            Entry {
                value,
                origins: vec![origin.to_string()],
                is_final,
            },
        );
    }

    pub(crate) fn raw_entries(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }
}
