//! Configuration loader.
//!
//! Responsibilities:
//! - Load configuration sets from filesystem locations, local files and
//!   embedded resources.
//! - Merge the registered default resources into one set.
//!
//! Does NOT handle:
//! - Choosing between a deployed file and a bundled default (see `template.rs`).
//! - Writing sets back out (see `persistence.rs`).
//!
//! Invariants:
//! - Every key of a freshly loaded set has exactly one origin: the source
//!   identifier. Origins a document claims for itself are discarded.
//! - An optional resource that does not resolve yields an empty set.
//! - Any read failure, including a short read, fails the whole load.

use std::path::Path;

use crate::document::{DocumentOptions, DocumentSource, ParsedProperty, parse_document};
use crate::error::{ConfigError, Result};
use crate::fs::{FileSystem, LocalFileSystem, Location, read_fully};
use crate::resources::ResourceNamespace;
use crate::set::ConfigSet;

/// Load the document at `path` on `fs`.
///
/// Every key's origin is the string form of `path`.
///
/// # Errors
///
/// Returns `ConfigError::Io` if the content cannot be read in full and
/// `ConfigError::Parse` if it is not a well-formed document.
pub fn load_from_path(fs: &dyn FileSystem, path: &Location) -> Result<ConfigSet> {
    load_from_path_with_options(fs, path, &DocumentOptions::default())
}

/// [`load_from_path`] with explicit parse options.
pub fn load_from_path_with_options(
    fs: &dyn FileSystem,
    path: &Location,
    options: &DocumentOptions,
) -> Result<ConfigSet> {
    let bytes = read_fully(fs, path)?;
    tracing::trace!(path = %path, content = %String::from_utf8_lossy(&bytes), "Read configuration document");

    let properties = parse_document(
        &bytes,
        DocumentSource::Located { fs, location: path },
        options,
    )?;
    let set = build_set(properties, path.as_str());
    tracing::debug!(path = %path, keys = set.len(), "Loaded configuration");
    Ok(set)
}

/// Load a document from the local filesystem.
///
/// The origin of every key is the absolute form of `file`.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if `file` does not exist, otherwise
/// fails as [`load_from_path`] does.
pub fn load_from_local_file(file: &Path) -> Result<ConfigSet> {
    load_from_local_file_with_options(file, &DocumentOptions::default())
}

/// [`load_from_local_file`] with explicit parse options.
pub fn load_from_local_file_with_options(
    file: &Path,
    options: &DocumentOptions,
) -> Result<ConfigSet> {
    let absolute = std::path::absolute(file).map_err(|e| ConfigError::io(file.display(), e))?;
    let location = Location::from(absolute.as_path());
    let fs = LocalFileSystem::new();

    if !fs.exists(&location).map_err(|e| ConfigError::io(&location, e))? {
        return Err(ConfigError::not_found(&location));
    }
    load_from_path_with_options(&fs, &location, options)
}

/// Load the embedded resource called `name`.
///
/// The origin of every key is `name`. A resource that does not resolve is
/// an error only if `mandatory`; otherwise an empty set is returned so that
/// optional defaults can be probed.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` for a missing mandatory resource and
/// `ConfigError::Parse` if the resource is not a well-formed document.
pub fn load_from_embedded_resource(
    resources: &ResourceNamespace,
    name: &str,
    mandatory: bool,
) -> Result<ConfigSet> {
    load_from_embedded_resource_with_options(resources, name, mandatory, &DocumentOptions::default())
}

/// [`load_from_embedded_resource`] with explicit parse options.
pub fn load_from_embedded_resource_with_options(
    resources: &ResourceNamespace,
    name: &str,
    mandatory: bool,
    options: &DocumentOptions,
) -> Result<ConfigSet> {
    let Some(bytes) = resources.fetch(name) else {
        if mandatory {
            return Err(ConfigError::not_found(name));
        }
        tracing::debug!(resource = %name, "Optional resource not found; using empty configuration");
        return Ok(ConfigSet::new());
    };
    tracing::trace!(resource = %name, content = %String::from_utf8_lossy(&bytes), "Read resource");

    let properties = parse_document(&bytes, DocumentSource::Detached { label: name }, options)?;
    let set = build_set(properties, name);
    tracing::debug!(resource = %name, keys = set.len(), "Loaded configuration resource");
    Ok(set)
}

/// Merge every registered default resource, in registration order.
///
/// A key set by several defaults keeps the value of the last one, with one
/// origin entry per resource that set it.
pub fn load_defaults(resources: &ResourceNamespace) -> Result<ConfigSet> {
    let mut set = ConfigSet::new();
    for name in resources.default_resources() {
        let defaults = load_from_embedded_resource(resources, &name, false)?;
        for (key, entry) in defaults.raw_entries() {
            set.set(key.as_str(), entry.value.as_str(), name.as_str());
            if entry.is_final {
                set.set_final(key, true);
            }
        }
    }
    Ok(set)
}

fn build_set(properties: Vec<ParsedProperty>, origin: &str) -> ConfigSet {
    let mut set = ConfigSet::new();
    for property in properties {
        if set.is_final(&property.name) {
            tracing::warn!(
                source = %origin,
                key = %property.name,
                "Ignoring redefinition of final property"
            );
            continue;
        }
        if !property.claimed_sources.is_empty() {
            tracing::trace!(
                source = %origin,
                key = %property.name,
                claimed = ?property.claimed_sources,
                "Discarding origins claimed by document"
            );
        }

        // A fresh set holds one origin per key, however often the key repeats.
        set.reset(property.name, property.value, origin, property.is_final);
    }
    set
}
