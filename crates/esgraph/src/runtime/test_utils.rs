//! Test runtime rooted at a fixed directory.
//!
//! Tests build small projects inside a `tempfile::TempDir` and point a
//! [`TestRuntime`] at it. Reads are counted so tests can assert that the
//! directory and module caches never issue the same read twice.

// Test utilities are allowed to use std::fs since they only run on native platforms
#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::runtime::{DirEntry, EntryKind, Runtime, RuntimeError, RuntimeResult};

/// Simple test runtime that wraps std::fs for native tests.
#[derive(Debug)]
pub struct TestRuntime {
    cwd: PathBuf,
    reads: Mutex<FxHashMap<PathBuf, usize>>,
}

impl TestRuntime {
    /// Create a new test runtime with the specified working directory.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            reads: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of times `path` (file or directory) was read.
    pub fn read_count(&self, path: &Path) -> usize {
        self.reads
            .lock()
            .map(|reads| reads.get(path).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn record(&self, path: &Path) {
        if let Ok(mut reads) = self.reads.lock() {
            *reads.entry(path.to_path_buf()).or_default() += 1;
        }
    }
}

#[async_trait]
impl Runtime for TestRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.record(path);
        std::fs::read(path).map_err(|e| RuntimeError::from_io(path, e))
    }

    async fn read_dir(&self, path: &Path) -> RuntimeResult<Vec<DirEntry>> {
        self.record(path);
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path).map_err(|e| RuntimeError::from_io(path, e))? {
            let entry = entry.map_err(|e| RuntimeError::from_io(path, e))?;
            let kind = match std::fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => EntryKind::File,
                Ok(meta) if meta.is_dir() => EntryKind::Directory,
                _ => EntryKind::Other,
            };
            entries.push(DirEntry::new(
                entry.file_name().to_string_lossy().into_owned(),
                kind,
            ));
        }
        Ok(entries)
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.cwd.clone())
    }
}
