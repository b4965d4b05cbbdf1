//! Configuration persistence.
//!
//! Responsibilities:
//! - Write a configuration set as a document to `directory/filename` on a
//!   filesystem collaborator or the local filesystem.
//!
//! Does NOT handle:
//! - Rendering the document itself (see `document`).
//!
//! Invariants:
//! - The stream is closed on every exit path, including after a failed write;
//!   closing a stream that failed a write does not commit its content.
//! - A write failure is reported in preference to a close failure.
//! - On the local filesystem the destination is replaced atomically.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::document::to_document_string;
use crate::error::{ConfigError, Result};
use crate::fs::{FileSystem, LocalFileSystem, Location};
use crate::set::ConfigSet;

/// Save `set` to `directory/filename` on `fs` and return the destination.
///
/// # Errors
///
/// Returns `ConfigError::Io` naming the destination if the stream cannot be
/// opened, written or closed.
pub fn save_to(
    fs: &dyn FileSystem,
    directory: &Location,
    filename: &str,
    set: &ConfigSet,
) -> Result<Location> {
    let destination = directory.join(filename);
    let document = to_document_string(set);

    let mut stream = fs
        .create(&destination)
        .map_err(|e| ConfigError::io(&destination, e))?;
    let written = stream
        .write_all(document.as_bytes())
        .and_then(|()| stream.flush());
    let closed = stream.close();

    match (written, closed) {
        (Err(e), closed) => {
            if let Err(close_error) = closed {
                tracing::warn!(
                    path = %destination,
                    error = %close_error,
                    "Close also failed after write error"
                );
            }
            Err(ConfigError::io(&destination, e))
        }
        (Ok(()), Err(e)) => Err(ConfigError::io(&destination, e)),
        (Ok(()), Ok(())) => {
            tracing::debug!(path = %destination, keys = set.len(), "Saved configuration");
            Ok(destination)
        }
    }
}

/// Save `set` to `directory/filename` on the local filesystem.
pub fn save_to_local_file(set: &ConfigSet, directory: &Path, filename: &str) -> Result<PathBuf> {
    let destination = save_to(
        &LocalFileSystem::new(),
        &Location::from(directory),
        filename,
        set,
    )?;
    Ok(destination.to_local_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{Fault, MemoryFileSystem};
    use crate::loader::{load_from_local_file, load_from_path};
    use tempfile::TempDir;

    fn sample() -> ConfigSet {
        let mut set = ConfigSet::new();
        set.set("b", "2", "test");
        set.set("a", "1 < 2 & 3", "test");
        set
    }

    #[test]
    fn test_save_to_returns_destination() {
        let fs = MemoryFileSystem::new();
        let destination = save_to(&fs, &Location::new("hdfs://nn/conf"), "site.xml", &sample()).unwrap();

        assert_eq!(destination.as_str(), "hdfs://nn/conf/site.xml");
        let loaded = load_from_path(&fs, &destination).unwrap();
        assert_eq!(loaded.to_map(), sample().to_map());
    }

    #[test]
    fn test_write_failure_is_io_error() {
        let fs = MemoryFileSystem::new();
        fs.inject_fault("/conf/site.xml", Fault::Write);

        let err = save_to(&fs, &Location::new("/conf"), "site.xml", &sample()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert_eq!(err.subject(), "/conf/site.xml");
        assert!(err.to_string().contains("injected write failure"));
        assert!(fs.contents("/conf/site.xml").is_none());
    }

    #[test]
    fn test_failed_save_keeps_previous_document() {
        let fs = MemoryFileSystem::new();
        fs.insert("/conf/site.xml", "<configuration/>");
        fs.inject_fault("/conf/site.xml", Fault::Write);

        assert!(save_to(&fs, &Location::new("/conf"), "site.xml", &sample()).is_err());
        assert_eq!(fs.contents("/conf/site.xml").unwrap(), b"<configuration/>");
    }

    #[test]
    fn test_close_failure_is_io_error() {
        let fs = MemoryFileSystem::new();
        fs.inject_fault("/conf/site.xml", Fault::Close);

        let err = save_to(&fs, &Location::new("/conf"), "site.xml", &sample()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("injected close failure"));
    }

    #[test]
    fn test_save_to_local_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();

        let path = save_to_local_file(&sample(), temp_dir.path(), "site.xml").unwrap();
        assert_eq!(path, temp_dir.path().join("site.xml"));

        let loaded = load_from_local_file(&path).unwrap();
        assert_eq!(loaded.get("a"), Some("1 < 2 & 3"));
        assert_eq!(loaded.get("b"), Some("2"));
    }
}
