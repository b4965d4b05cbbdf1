//! Addressable locations on a filesystem collaborator.
//!
//! A `Location` is kept in string form because it may name something other
//! than a local path (`hdfs://namenode:8020/conf/site.xml`). Its `Display`
//! output is the origin label recorded for values loaded from it.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

/// A location addressable through a [`FileSystem`](super::FileSystem).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(String);

impl Location {
    /// Wrap a location string.
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// The string form of this location.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this location carries a scheme (`scheme://...`).
    pub fn is_uri(&self) -> bool {
        self.0.contains("://")
    }

    /// Append a child name, e.g. `conf_dir.join("site.xml")`.
    pub fn join(&self, name: &str) -> Location {
        let name = name.trim_start_matches('/');
        if self.0.ends_with('/') {
            Location(format!("{}{}", self.0, name))
        } else {
            Location(format!("{}/{}", self.0, name))
        }
    }

    /// The directory containing this location, if it has one.
    pub fn parent(&self) -> Option<Location> {
        let trimmed = self.0.trim_end_matches('/');
        let root_end = self.root_len();
        let idx = trimmed.rfind('/')?;
        if idx < root_end.saturating_sub(1) || trimmed.len() <= root_end {
            return None;
        }
        if idx < root_end {
            return Some(Location(trimmed[..root_end].to_string()));
        }
        Some(Location(trimmed[..idx].to_string()))
    }

    /// Resolve a reference found inside the document at this location.
    ///
    /// Absolute references (`/abs/path`, `scheme://...`) are returned as-is
    /// (an absolute path under a URI base keeps the base's scheme and
    /// authority); relative references are resolved against this location's
    /// directory.
    pub fn resolve(&self, reference: &str) -> Result<Location, String> {
        if reference.contains("://") {
            return Ok(Location::new(reference));
        }
        if self.is_uri() {
            let base = Url::parse(&self.0).map_err(|e| format!("invalid base '{}': {e}", self))?;
            let joined = base
                .join(reference)
                .map_err(|e| format!("cannot resolve '{reference}' against '{}': {e}", self))?;
            return Ok(Location(joined.to_string()));
        }
        if reference.starts_with('/') {
            return Ok(Location(normalize(reference)));
        }
        let base = self.parent().map(|p| p.0).unwrap_or_default();
        let combined = if base.is_empty() {
            reference.to_string()
        } else {
            format!("{}/{}", base.trim_end_matches('/'), reference)
        };
        Ok(Location(normalize(&combined)))
    }

    /// Map this location onto the local filesystem.
    ///
    /// `file://` URIs are stripped to their path; anything else is used
    /// verbatim.
    pub fn to_local_path(&self) -> PathBuf {
        match self.0.strip_prefix("file://") {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.0),
        }
    }

    /// Length of the part of the location that `parent` never strips:
    /// `scheme://authority/` for URIs, `/` for absolute paths.
    fn root_len(&self) -> usize {
        if let Some(scheme_end) = self.0.find("://") {
            let after = scheme_end + 3;
            return match self.0[after..].find('/') {
                Some(slash) => after + slash + 1,
                None => self.0.len(),
            };
        }
        usize::from(self.0.starts_with('/'))
    }
}

/// Lexically collapse `.` and `..` segments.
fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(location: &str) -> Self {
        Location::new(location)
    }
}

impl From<String> for Location {
    fn from(location: String) -> Self {
        Location(location)
    }
}

impl From<&Path> for Location {
    fn from(path: &Path) -> Self {
        Location(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Location::from(path.as_path())
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
