//! Embedded resource namespace and default-resource registry.
//!
//! Responsibilities:
//! - Resolve resource names to bytes through a pluggable `ResourceSource`.
//! - Keep the list of registered default resources.
//!
//! Does NOT handle:
//! - Parsing resource content (see `loader.rs`).
//! - Unregistering defaults: the registry is additive-only.
//!
//! Invariants:
//! - A name is registered at most once; registration order is preserved.
//! - Only resolvable names are registered.
//! - Registration is serialized by a mutex, so a registration completed on
//!   one thread happens-before any later load that reads the registry.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A read-only, name-addressed source of bytes.
pub trait ResourceSource: Send + Sync {
    /// Bytes of the resource called `name`, or `None` if there is no such
    /// resource.
    fn fetch(&self, name: &str) -> Option<Cow<'_, [u8]>>;
}

/// Resources bundled into the program, typically via `include_bytes!`.
///
/// # Example
///
/// ```
/// use strata_config::EmbeddedResources;
///
/// let resources = EmbeddedResources::new()
///     .with_static("defaults.xml", b"<configuration/>");
/// assert!(resources.contains("defaults.xml"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: BTreeMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedResources {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource backed by static bytes.
    pub fn with_static(mut self, name: impl Into<String>, bytes: &'static [u8]) -> Self {
        self.entries.insert(name.into(), Cow::Borrowed(bytes));
        self
    }

    /// Add a resource backed by owned bytes.
    pub fn with_bytes(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(name.into(), Cow::Owned(bytes.into()));
        self
    }

    /// Whether a resource called `name` is bundled.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl ResourceSource for EmbeddedResources {
    fn fetch(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        self.entries
            .get(name)
            .map(|bytes| Cow::Borrowed(bytes.as_ref()))
    }
}

/// Resources resolved as files below a root directory.
///
/// Names are relative paths; names that would escape the root are treated
/// as missing.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    /// Resolve resources below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl ResourceSource for DirectoryResources {
    fn fetch(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        let path = self.path_for(name)?;
        match std::fs::read(&path) {
            Ok(bytes) => Some(Cow::Owned(bytes)),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Could not read resource file; treating as missing"
                    );
                }
                None
            }
        }
    }
}

/// The resource namespace consulted by the loader, with its registry of
/// default resources.
///
/// Construct one per program (or per test) and pass it to the loader and
/// template resolver explicitly.
pub struct ResourceNamespace {
    source: Box<dyn ResourceSource>,
    defaults: Mutex<Vec<String>>,
}

impl ResourceNamespace {
    /// Create a namespace over `source` with an empty default registry.
    pub fn new(source: impl ResourceSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            defaults: Mutex::new(Vec::new()),
        }
    }

    /// Bytes of the resource called `name`.
    pub fn fetch(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        self.source.fetch(name)
    }

    /// Whether `name` resolves.
    pub fn exists(&self, name: &str) -> bool {
        self.source.fetch(name).is_some()
    }

    /// Register `name` as a default resource.
    ///
    /// Returns whether the resource resolves. Unresolvable names are not
    /// registered; registering a name twice keeps its first position.
    pub fn register_default(&self, name: &str) -> bool {
        if !self.exists(name) {
            tracing::debug!(resource = %name, "Default resource not found; not registered");
            return false;
        }
        let mut defaults = self.lock_defaults();
        if !defaults.iter().any(|registered| registered == name) {
            defaults.push(name.to_string());
            tracing::debug!(resource = %name, "Registered default resource");
        }
        true
    }

    /// Registered default resources in registration order.
    pub fn default_resources(&self) -> Vec<String> {
        self.lock_defaults().clone()
    }

    fn lock_defaults(&self) -> MutexGuard<'_, Vec<String>> {
        self.defaults.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ResourceNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceNamespace")
            .field("defaults", &self.default_resources())
            .finish_non_exhaustive()
    }
}
