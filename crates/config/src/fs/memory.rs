//! In-memory filesystem.
//!
//! Stands in for a remote filesystem in tests and tooling. Content written
//! through a stream becomes visible when the stream is closed. Faults can be
//! injected per location to exercise error paths.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{FileSystem, Location, WriteStream};

/// A failure to inject at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `read` fails.
    Read,
    /// `read` returns fewer bytes than `len` reports.
    ShortRead,
    /// Writes to a stream opened at the location fail.
    Write,
    /// Closing a stream opened at the location fails.
    Close,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<Location, Vec<u8>>,
    faults: BTreeMap<Location, Fault>,
}

/// A thread-safe, in-memory filesystem keyed by [`Location`].
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` at `location`, replacing anything already there.
    pub fn insert(&self, location: impl Into<Location>, content: impl Into<Vec<u8>>) {
        self.lock().files.insert(location.into(), content.into());
    }

    /// Current content at `location`.
    pub fn contents(&self, location: impl Into<Location>) -> Option<Vec<u8>> {
        self.lock().files.get(&location.into()).cloned()
    }

    /// Locations that currently hold content, in sorted order.
    pub fn locations(&self) -> Vec<Location> {
        self.lock().files.keys().cloned().collect()
    }

    /// Make subsequent operations on `location` fail as described by `fault`.
    pub fn inject_fault(&self, location: impl Into<Location>, fault: Fault) {
        self.lock().faults.insert(location.into(), fault);
    }

    /// Remove any fault injected at `location`.
    pub fn clear_fault(&self, location: impl Into<Location>) {
        self.lock().faults.remove(&location.into());
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(location: &Location) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{location} not found"))
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, location: &Location) -> io::Result<bool> {
        Ok(self.lock().files.contains_key(location))
    }

    fn len(&self, location: &Location) -> io::Result<u64> {
        self.lock()
            .files
            .get(location)
            .map(|content| content.len() as u64)
            .ok_or_else(|| not_found(location))
    }

    fn read(&self, location: &Location) -> io::Result<Vec<u8>> {
        let state = self.lock();
        let content = state.files.get(location).ok_or_else(|| not_found(location))?;
        match state.faults.get(location) {
            Some(Fault::Read) => Err(io::Error::other(format!("injected read failure at {location}"))),
            Some(Fault::ShortRead) => Ok(content[..content.len() / 2].to_vec()),
            _ => Ok(content.clone()),
        }
    }

    fn create(&self, location: &Location) -> io::Result<Box<dyn WriteStream>> {
        let fault = self.lock().faults.get(location).copied();
        Ok(Box::new(MemoryWriteStream {
            fs: self.clone(),
            location: location.clone(),
            buffer: Vec::new(),
            fault,
            failed: false,
        }))
    }
}

struct MemoryWriteStream {
    fs: MemoryFileSystem,
    location: Location,
    buffer: Vec<u8>,
    fault: Option<Fault>,
    failed: bool,
}

impl Write for MemoryWriteStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fault == Some(Fault::Write) {
            self.failed = true;
            return Err(io::Error::other(format!(
                "injected write failure at {}",
                self.location
            )));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteStream for MemoryWriteStream {
    fn close(self: Box<Self>) -> io::Result<()> {
        if self.fault == Some(Fault::Close) {
            return Err(io::Error::other(format!(
                "injected close failure at {}",
                self.location
            )));
        }
        let MemoryWriteStream {
            fs,
            location,
            buffer,
            failed,
            ..
        } = *self;
        // A stream that failed a write is released without committing.
        if !failed {
            fs.insert(location, buffer);
        }
        Ok(())
    }
}
