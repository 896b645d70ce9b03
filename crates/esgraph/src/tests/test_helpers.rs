//! Shared test utilities for traversal and resolution tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::config::GraphConfig;
use crate::graph::{Graph, Module, ModulePath};
use crate::hooks::{DefaultHooks, GraphHooks, HookError, HookFuture, ready};
use crate::parse::OxcParser;
use crate::runtime::test_utils::TestRuntime;
use crate::{Result, get_modules_graph};

/// Create a test project with the given files.
///
/// # Arguments
/// * `temp` - Temporary directory
/// * `files` - Array of (path, content) tuples
///
/// # Returns
/// The root path of the created project
pub fn create_test_project(temp: &TempDir, files: &[(&str, &str)]) -> PathBuf {
    let root = temp.path().to_path_buf();

    for (path, content) in files {
        let file_path = root.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("Failed to create parent directory for {path}: {e}"));
        }
        fs::write(&file_path, content).unwrap_or_else(|e| panic!("Failed to write file {path}: {e}"));
    }

    root
}

pub fn seeds(modules: &[&str]) -> GraphConfig {
    GraphConfig {
        modules: modules.iter().map(|m| m.to_string()).collect(),
        ..GraphConfig::default()
    }
}

/// Build with default hooks over a [`TestRuntime`] rooted at `root`.
pub async fn build_graph(root: &Path, config: &GraphConfig) -> Graph {
    build_with_runtime(Arc::new(TestRuntime::new(root)), config).await
}

pub async fn build_with_runtime(runtime: Arc<TestRuntime>, config: &GraphConfig) -> Graph {
    get_modules_graph(
        config,
        Arc::new(DefaultHooks::with_extensions(config.extensions.clone())),
        runtime,
        Arc::new(OxcParser::new()),
    )
    .await
    .expect("graph build should succeed")
}

pub async fn build_with_hooks<H: GraphHooks>(
    root: &Path,
    config: &GraphConfig,
    hooks: Arc<H>,
) -> Result<Graph<H::SourceData, H::DependenciesData>> {
    get_modules_graph(
        config,
        hooks,
        Arc::new(TestRuntime::new(root)),
        Arc::new(OxcParser::new()),
    )
    .await
}

/// Hooks that record what the traversal hands them.
///
/// Source data is the transformed source length; dependency data is the
/// list of modules the module imports. `__DEP__` in a source is rewritten
/// to `./b` before parsing.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    pub completed: Mutex<Vec<ModulePath>>,
    pub fail_on_add_module: Option<&'static str>,
}

impl GraphHooks for RecordingHooks {
    type SourceData = usize;
    type DependenciesData = Vec<ModulePath>;

    fn resolve_path(&self, module_path: &str, raw_path: &str) -> std::result::Result<Option<String>, HookError> {
        if raw_path.starts_with("virtual:") {
            return Ok(None);
        }
        if raw_path == "broken:" {
            return Err(HookError::new("cannot resolve broken:"));
        }
        if raw_path.starts_with('.') {
            Ok(Some(crate::paths::resolve_relative(module_path, raw_path)))
        } else {
            Ok(Some(raw_path.to_string()))
        }
    }

    fn transform_source(&self, _module_path: &str, source: String) -> std::result::Result<String, HookError> {
        Ok(source.replace("__DEP__", "./b"))
    }

    fn on_add_module(
        &self,
        module: &Module<usize, Vec<ModulePath>>,
        transformed_source: &str,
        _original_source: &str,
    ) -> HookFuture<usize> {
        if self.fail_on_add_module == Some(module.path.as_str()) {
            let message = format!("refusing {}", module.path);
            return Box::pin(async move { Err(HookError::new(message)) });
        }
        let length = transformed_source.len();
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(length)
        })
    }

    fn on_add_dependencies(&self, module: &Module<usize, Vec<ModulePath>>) -> HookFuture<Vec<ModulePath>> {
        if let Ok(mut completed) = self.completed.lock() {
            completed.push(module.path.clone());
        }
        ready(module.imported_modules.keys().cloned().collect())
    }
}
