//! Filesystem abstraction used by the traversal.
//!
//! Every file and directory read performed while building a graph goes
//! through the [`Runtime`] trait, so hosts can back the graph with a real
//! disk, an in-memory tree or a virtual filesystem.

#[cfg(not(target_family = "wasm"))]
pub mod native;

#[cfg(any(
    all(test, not(target_family = "wasm")),
    all(feature = "test-utils", not(target_family = "wasm"))
))]
pub mod test_utils;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// File or directory not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

impl RuntimeError {
    /// Map a `std::io::Error` for `path` onto a runtime error.
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            RuntimeError::FileNotFound(path.to_path_buf())
        } else {
            RuntimeError::Io(format!("{}: {error}", path.display()))
        }
    }
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    /// Sockets, devices and anything else that is neither a file nor a directory.
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Platform runtime trait
///
/// Paths passed to the runtime are absolute: the traversal joins module
/// paths onto [`Runtime::get_cwd`] before calling in.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file from the filesystem
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// List a directory, symlinks followed
    async fn read_dir(&self, path: &Path) -> RuntimeResult<Vec<DirEntry>>;

    /// Get the current working directory
    ///
    /// Module paths stored in a graph are relative to this directory.
    fn get_cwd(&self) -> RuntimeResult<PathBuf>;
}
