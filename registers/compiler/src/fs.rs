// Licensed under the Apache-2.0 license

//! File-system collaborator.
//!
//! The compiler never touches the disk directly; every read and write goes
//! through a [`FileSystem`]. [`OsFileSystem`] persists files atomically, and
//! [`MemoryFileSystem`] keeps everything in memory for tests and dry runs.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Named-file storage used by the crate-root operations.
pub trait FileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Replace the contents of `path`. A failed write leaves any previous
    /// contents in place.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The host file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| io_error(path, e))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        // Stage next to the target so the final rename stays on one device.
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_error(path, e))?;
        staged
            .write_all(contents.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| io_error(path, e))?;
        staged.persist(path).map_err(|e| io_error(path, e.error))?;
        log::debug!("wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }
}

/// An in-memory file system.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.lock().insert(path.into(), contents.to_string());
        self
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.lock().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, String>> {
        // A poisoned map is still a consistent map: every insert is a single call.
        self.files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.contents(path).ok_or_else(|| {
            io_error(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )
        })
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.lock().insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
