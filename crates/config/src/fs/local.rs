//! Local filesystem implementation.
//!
//! Writes are atomic: content goes to a sibling temporary file which is
//! renamed over the destination on `close`, so a destination is never left
//! partially written.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use super::{FileSystem, Location, WriteStream};
use crate::constants::TEMP_FILE_EXTENSION;

/// The local filesystem, addressed by path or `file://` URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create a handle to the local filesystem.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn exists(&self, location: &Location) -> io::Result<bool> {
        location.to_local_path().try_exists()
    }

    fn len(&self, location: &Location) -> io::Result<u64> {
        Ok(std::fs::metadata(location.to_local_path())?.len())
    }

    fn read(&self, location: &Location) -> io::Result<Vec<u8>> {
        std::fs::read(location.to_local_path())
    }

    fn create(&self, location: &Location) -> io::Result<Box<dyn WriteStream>> {
        Ok(Box::new(LocalWriteStream::open(location.to_local_path())?))
    }
}

struct LocalWriteStream {
    target: PathBuf,
    temp_path: PathBuf,
    writer: Option<BufWriter<File>>,
    committed: bool,
    failed: bool,
}

impl LocalWriteStream {
    fn open(target: PathBuf) -> io::Result<Self> {
        let file_name = target.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} does not name a file", target.display()),
            )
        })?;

        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut temp_name = file_name.to_os_string();
        temp_name.push(".");
        temp_name.push(TEMP_FILE_EXTENSION);
        let temp_path = target.with_file_name(temp_name);

        let file = File::create(&temp_path)?;
        Ok(Self {
            target,
            temp_path,
            writer: Some(BufWriter::new(file)),
            committed: false,
            failed: false,
        })
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("write stream already closed"))
    }
}

impl Write for LocalWriteStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.writer()?.write(buf);
        self.failed |= result.is_err();
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.writer()?.flush();
        self.failed |= result.is_err();
        result
    }
}

impl WriteStream for LocalWriteStream {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| io::Error::other("write stream already closed"))?;
        if self.failed {
            // Drop removes the temporary file; the destination is untouched.
            drop(writer);
            tracing::debug!(
                path = %self.target.display(),
                "Discarding config write after failed write"
            );
            return Ok(());
        }
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&self.temp_path, &self.target)?;
        self.committed = true;

        tracing::debug!(
            path = %self.target.display(),
            "Config file written atomically"
        );
        Ok(())
    }
}

impl Drop for LocalWriteStream {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        self.writer.take();
        if let Err(e) = std::fs::remove_file(&self.temp_path)
            && e.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!(
                path = %self.temp_path.display(),
                error = %e,
                "Could not remove abandoned temporary config file"
            );
        }
    }
}
