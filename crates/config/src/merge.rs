//! Configuration merge logic.
//!
//! Implements layered override merging:
//! - Later writes win; the caller-supplied origin becomes the key's current
//!   origin.
//! - Earlier origins stay in each key's history.
//! - Absent values fail fast and nothing already applied is rolled back.

use crate::error::Result;
use crate::set::ConfigSet;

/// Set every `(key, value)` pair of `entries` in `dest` with `origin`.
///
/// Pairs are applied in iteration order. An absent value stops the call with
/// `ConfigError::InvalidValue` naming its key; pairs applied before it stay
/// applied.
///
/// # Example
///
/// ```
/// use strata_config::{ConfigError, ConfigSet, merge::set_many};
///
/// let mut set = ConfigSet::new();
/// let result = set_many(&mut set, [("a", Some("1")), ("b", None)], "literal");
///
/// assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
/// assert_eq!(set.get("a"), Some("1"));
/// assert!(!set.contains("b"));
/// ```
pub fn set_many<I, K, V>(dest: &mut ConfigSet, entries: I, origin: &str) -> Result<()>
where
    I: IntoIterator<Item = (K, Option<V>)>,
    K: Into<String>,
    V: Into<String>,
{
    for (key, value) in entries {
        dest.try_set(key, value, origin)?;
    }
    Ok(())
}

/// Merge `overlay` into `base` in place and return `base`.
///
/// Shared keys take the overlay's value, and `origin` is appended to their
/// history. The overlay's own origins are not consulted. Use [`merged`] to
/// leave `base` untouched.
pub fn merge_into<'a>(base: &'a mut ConfigSet, overlay: &ConfigSet, origin: &str) -> &'a mut ConfigSet {
    for (key, value) in overlay.entries() {
        base.set(key, value, origin);
    }
    base
}

/// Copying variant of [`merge_into`].
pub fn merged(base: &ConfigSet, overlay: &ConfigSet, origin: &str) -> ConfigSet {
    let mut result = base.clone();
    merge_into(&mut result, overlay, origin);
    result
}

/// Merge `(set, origin)` layers into a fresh set, lowest precedence first.
pub fn merge_layers<'a, I>(layers: I) -> ConfigSet
where
    I: IntoIterator<Item = (&'a ConfigSet, &'a str)>,
{
    layers
        .into_iter()
        .fold(ConfigSet::new(), |mut acc, (layer, origin)| {
            merge_into(&mut acc, layer, origin);
            acc
        })
}
