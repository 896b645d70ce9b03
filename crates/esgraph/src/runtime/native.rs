//! Native runtime backed by `std::fs`.
//!
//! Blocking filesystem calls are moved onto tokio's blocking pool with
//! `spawn_blocking` so the traversal never stalls its executor.

// std::fs is the point of this runtime
#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::task;

use crate::runtime::{DirEntry, EntryKind, Runtime, RuntimeError, RuntimeResult};

/// Native filesystem Runtime implementation using `std::fs`.
///
/// # Example
///
/// ```rust,no_run
/// use esgraph::runtime::{native::NativeRuntime, Runtime};
///
/// # async fn example() -> esgraph::runtime::RuntimeResult<()> {
/// let runtime = NativeRuntime::with_cwd("/path/to/project");
/// let entries = runtime.read_dir(&runtime.get_cwd()?).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeRuntime {
    cwd: Option<PathBuf>,
}

impl NativeRuntime {
    /// Create a runtime rooted at the process working directory.
    pub fn new() -> Self {
        Self { cwd: None }
    }

    /// Create a runtime rooted at `cwd`.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
        }
    }
}

fn join_error(error: task::JoinError) -> RuntimeError {
    RuntimeError::Other(format!("Blocking task failed: {error}"))
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || std::fs::read(&path).map_err(|e| RuntimeError::from_io(&path, e)))
            .await
            .map_err(join_error)?
    }

    async fn read_dir(&self, path: &Path) -> RuntimeResult<Vec<DirEntry>> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(&path).map_err(|e| RuntimeError::from_io(&path, e))? {
                let entry = entry.map_err(|e| RuntimeError::from_io(&path, e))?;
                let name = entry.file_name().to_string_lossy().into_owned();
                // `metadata` follows symlinks, `DirEntry::file_type` does not
                let kind = match std::fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => EntryKind::File,
                    Ok(meta) if meta.is_dir() => EntryKind::Directory,
                    _ => EntryKind::Other,
                };
                entries.push(DirEntry::new(name, kind));
            }
            Ok(entries)
        })
        .await
        .map_err(join_error)?
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir()
                .map_err(|e| RuntimeError::Io(format!("Failed to get current directory: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.ts");
        fs::write(&file, "export const a = 1;").unwrap();

        let runtime = NativeRuntime::with_cwd(temp.path());
        let content = runtime.read_file(&file).await.unwrap();
        assert_eq!(content, b"export const a = 1;");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let temp = TempDir::new().unwrap();
        let runtime = NativeRuntime::new();

        let result = runtime.read_file(&temp.path().join("missing.ts")).await;
        assert!(matches!(result, Err(RuntimeError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_read_dir_kinds() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("index.ts"), "").unwrap();
        fs::create_dir(temp.path().join("lib")).unwrap();

        let runtime = NativeRuntime::with_cwd(temp.path());
        let mut entries = runtime.read_dir(temp.path()).await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(
            entries,
            vec![
                DirEntry::new("index.ts", EntryKind::File),
                DirEntry::new("lib", EntryKind::Directory),
            ]
        );
    }

    #[test]
    fn test_cwd_override() {
        let runtime = NativeRuntime::with_cwd("/virtual/root");
        assert_eq!(runtime.get_cwd().unwrap(), PathBuf::from("/virtual/root"));
    }
}
