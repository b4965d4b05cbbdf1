//! Template resolution: a deployed document, or a bundled default.
//!
//! Responsibilities:
//! - Load the primary location when it exists, otherwise a mandatory
//!   fallback resource.
//! - Record which of the two was used under the reserved
//!   `template-origin` key.
//!
//! Does NOT handle:
//! - Materializing the chosen template on shared storage (see `persistence.rs`).
//!
//! Invariants:
//! - The resolved set always contains `template-origin`, overwriting any
//!   value the loaded document carried for it.

use crate::constants::{RESOURCE_ORIGIN_PREFIX, TEMPLATE_ORIGIN_KEY};
use crate::error::{ConfigError, Result};
use crate::fs::{FileSystem, Location};
use crate::loader::{load_from_embedded_resource, load_from_path};
use crate::resources::ResourceNamespace;
use crate::set::ConfigSet;

/// Resolve the configuration template.
///
/// 1. If `primary` exists on `fs`, it is loaded; the origin label is its
///    string form.
/// 2. Otherwise, if `fallback_resource` is non-empty, that resource is
///    loaded as mandatory; the origin label is `"Resource " + name`.
/// 3. Otherwise the call fails with `ConfigError::NotFound` naming `primary`.
///
/// # Errors
///
/// Besides the not-found case above, any load error of the chosen source
/// is returned unchanged.
pub fn resolve_template(
    fs: &dyn FileSystem,
    primary: &Location,
    fallback_resource: &str,
    resources: &ResourceNamespace,
) -> Result<ConfigSet> {
    let exists = fs
        .exists(primary)
        .map_err(|e| ConfigError::io(primary, e))?;

    let (mut set, origin) = if exists {
        tracing::debug!(path = %primary, "Loading template from primary location");
        (load_from_path(fs, primary)?, primary.to_string())
    } else if !fallback_resource.is_empty() {
        tracing::debug!(
            path = %primary,
            resource = %fallback_resource,
            "Primary template not found; loading fallback resource"
        );
        (
            load_from_embedded_resource(resources, fallback_resource, true)?,
            format!("{RESOURCE_ORIGIN_PREFIX}{fallback_resource}"),
        )
    } else {
        return Err(ConfigError::not_found(primary));
    };

    set.set(TEMPLATE_ORIGIN_KEY, origin.as_str(), origin.as_str());
    Ok(set)
}

/// [`resolve_template`] with the primary location `conf_dir/template_filename`.
pub fn resolve_template_in(
    fs: &dyn FileSystem,
    conf_dir: &Location,
    template_filename: &str,
    fallback_resource: &str,
    resources: &ResourceNamespace,
) -> Result<ConfigSet> {
    resolve_template(
        fs,
        &conf_dir.join(template_filename),
        fallback_resource,
        resources,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::resources::EmbeddedResources;

    fn resources() -> ResourceNamespace {
        ResourceNamespace::new(EmbeddedResources::new().with_static(
            "template.xml",
            b"<configuration><property><name>role</name><value>default</value></property></configuration>",
        ))
    }

    #[test]
    fn test_primary_wins_when_present() {
        let fs = MemoryFileSystem::new();
        fs.insert(
            "/conf/template.xml",
            "<configuration><property><name>role</name><value>deployed</value></property></configuration>",
        );

        let set = resolve_template(&fs, &Location::new("/conf/template.xml"), "template.xml", &resources())
            .unwrap();
        assert_eq!(set.get("role"), Some("deployed"));
        assert_eq!(set.get(TEMPLATE_ORIGIN_KEY), Some("/conf/template.xml"));
    }

    #[test]
    fn test_fallback_resource_when_primary_missing() {
        let fs = MemoryFileSystem::new();

        let set = resolve_template(&fs, &Location::new("/conf/template.xml"), "template.xml", &resources())
            .unwrap();
        assert_eq!(set.get("role"), Some("default"));
        assert_eq!(set.get(TEMPLATE_ORIGIN_KEY), Some("Resource template.xml"));
        assert_eq!(set.origins_of(TEMPLATE_ORIGIN_KEY), ["Resource template.xml"]);
    }

    #[test]
    fn test_missing_fallback_resource_is_not_found() {
        let fs = MemoryFileSystem::new();

        let err = resolve_template(&fs, &Location::new("/conf/template.xml"), "absent.xml", &resources())
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert_eq!(err.subject(), "absent.xml");
    }

    #[test]
    fn test_no_primary_and_no_fallback() {
        let fs = MemoryFileSystem::new();

        let err = resolve_template(&fs, &Location::new("/conf/template.xml"), "", &resources())
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert_eq!(err.subject(), "/conf/template.xml");
    }

    #[test]
    fn test_reserved_key_is_overwritten() {
        let fs = MemoryFileSystem::new();
        fs.insert(
            "/conf/template.xml",
            "<configuration><property><name>template-origin</name><value>stale</value></property></configuration>",
        );

        let set = resolve_template_in(&fs, &Location::new("/conf"), "template.xml", "", &resources())
            .unwrap();
        assert_eq!(set.get(TEMPLATE_ORIGIN_KEY), Some("/conf/template.xml"));
        assert_eq!(
            set.origins_of(TEMPLATE_ORIGIN_KEY),
            ["/conf/template.xml", "/conf/template.xml"]
        );
    }
}
