//! Filesystem collaborator abstraction.
//!
//! Responsibilities:
//! - Define the capabilities the core needs from a filesystem: existence
//!   check, byte-length query, full-content read, and write-stream open.
//! - Provide a local implementation and an in-memory implementation.
//!
//! Does NOT handle:
//! - Remote transport, credentials or timeouts (belong to the implementor).
//! - Parsing or serializing documents (see `document`).
//!
//! Invariants:
//! - Reads are all-or-nothing from the caller's point of view.
//! - A write stream is only durable once `close` returns `Ok`.

mod local;
mod location;
mod memory;

use std::io::{self, Write};

use crate::error::{ConfigError, Result};

pub use local::LocalFileSystem;
pub use location::Location;
pub use memory::{Fault, MemoryFileSystem};

/// A filesystem that configuration documents can be read from and written to.
///
/// Implementations may address anything a [`Location`] can name, not only
/// local paths.
pub trait FileSystem: Send + Sync {
    /// Whether something exists at `location`.
    fn exists(&self, location: &Location) -> io::Result<bool>;

    /// Length in bytes of the content at `location`.
    fn len(&self, location: &Location) -> io::Result<u64>;

    /// Read the full content at `location`.
    fn read(&self, location: &Location) -> io::Result<Vec<u8>>;

    /// Open a stream that replaces the content at `location`.
    fn create(&self, location: &Location) -> io::Result<Box<dyn WriteStream>>;
}

/// A write-capable stream with an explicit, fallible close.
///
/// Dropping a stream without closing it abandons the write.
pub trait WriteStream: Write + Send {
    /// Flush and commit everything written so far.
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Read the full content at `location`, failing on any read error.
///
/// The content must be as long as the filesystem reports; a short read is
/// an error rather than a truncated document.
pub(crate) fn read_fully(fs: &dyn FileSystem, location: &Location) -> Result<Vec<u8>> {
    let expected = fs.len(location).map_err(|e| ConfigError::io(location, e))?;
    let data = fs.read(location).map_err(|e| ConfigError::io(location, e))?;
    if data.len() as u64 != expected {
        return Err(ConfigError::io(
            location,
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("read {} of {} bytes", data.len(), expected),
            ),
        ));
    }
    Ok(data)
}
