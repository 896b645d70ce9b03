//! Caller policy and enrichment hooks.
//!
//! [`GraphHooks`] gathers every decision the traversal delegates to its
//! caller. Policy methods are synchronous and have defaults that follow the
//! usual ESM layout (relative paths, extension probing, `index` files).
//! Enrichment hooks always return a [`HookFuture`], whether the caller's
//! work is immediate or not.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::graph::Module;
use crate::paths::{ParsedPath, resolve_relative};
use crate::runtime::EntryKind;

/// Deferred result of an enrichment hook.
pub type HookFuture<T> = Pin<Box<dyn Future<Output = Result<T, HookError>> + Send + 'static>>;

/// Directory listing handed to module choosers: entry name -> kind.
pub type DirectoryContent = BTreeMap<String, EntryKind>;

/// Extensions probed by the default module choosers, in priority order.
pub const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Failure reported by a caller hook.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Wrap an immediately available value as a [`HookFuture`].
pub fn ready<T: Send + 'static>(value: T) -> HookFuture<T> {
    Box::pin(std::future::ready(Ok(value)))
}

/// Callbacks consulted while a graph is built.
///
/// `SourceData` is what [`on_add_module`](GraphHooks::on_add_module) derives
/// from a module's source; `DependenciesData` is what
/// [`on_add_dependencies`](GraphHooks::on_add_dependencies) derives once all
/// of the module's dependencies are complete. Both end up on the module.
pub trait GraphHooks: Send + Sync + 'static {
    type SourceData: Send + 'static;
    type DependenciesData: Send + 'static;

    /// Map a raw path to a project path (starting with `.`), a package path
    /// (anything else), or `None` to skip the edge.
    fn resolve_path(&self, module_path: &str, raw_path: &str) -> Result<Option<String>, HookError> {
        if raw_path.starts_with('.') {
            Ok(Some(resolve_relative(module_path, raw_path)))
        } else {
            Ok(Some(raw_path.to_string()))
        }
    }

    /// Pick the entry of `parsed_path.dir` that `resolved_path` refers to.
    ///
    /// Returning a directory continues with
    /// [`choose_index_module`](GraphHooks::choose_index_module) inside it.
    fn choose_module(
        &self,
        resolved_path: &str,
        parsed_path: &ParsedPath,
        directory_content: &DirectoryContent,
    ) -> Result<String, HookError> {
        choose_module_with_extensions(resolved_path, parsed_path, directory_content, DEFAULT_EXTENSIONS)
    }

    /// Pick the module file inside a directory chosen by `choose_module`.
    fn choose_index_module(
        &self,
        resolved_path: &str,
        directory_path: &str,
        directory_content: &DirectoryContent,
    ) -> Result<String, HookError> {
        choose_index_with_extensions(resolved_path, directory_path, directory_content, DEFAULT_EXTENSIONS)
    }

    /// Prune a directory from the directory walk.
    fn skip_directory(&self, _directory_path: &str, directory_name: &str) -> bool {
        directory_name == "node_modules" || directory_name.starts_with('.')
    }

    /// Prune a file from the directory walk.
    fn skip_module(&self, _module_path: &str, module_name: &str) -> bool {
        !has_module_extension(module_name, DEFAULT_EXTENSIONS)
    }

    /// Rewrite module source before it is parsed.
    fn transform_source(&self, _module_path: &str, source: String) -> Result<String, HookError> {
        Ok(source)
    }

    /// Called once a module is parsed and merged, before its dependencies load.
    fn on_add_module(
        &self,
        module: &Module<Self::SourceData, Self::DependenciesData>,
        transformed_source: &str,
        original_source: &str,
    ) -> HookFuture<Self::SourceData>;

    /// Called once every dependency of the module has completed (or the
    /// module was released by the cycle breaker).
    fn on_add_dependencies(
        &self,
        module: &Module<Self::SourceData, Self::DependenciesData>,
    ) -> HookFuture<Self::DependenciesData>;
}

/// True for `name.<ext>` with a known extension; declaration files excluded.
pub fn has_module_extension(name: &str, extensions: &[impl AsRef<str>]) -> bool {
    if name.ends_with(".d.ts") {
        return false;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            extensions.iter().any(|candidate| candidate.as_ref() == ext)
        }
        _ => false,
    }
}

/// Default module choice: the exact entry if it is a file, then
/// `<base>.<ext>` files in extension order, then a directory named `<base>`.
pub fn choose_module_with_extensions(
    resolved_path: &str,
    parsed_path: &ParsedPath,
    directory_content: &DirectoryContent,
    extensions: &[impl AsRef<str>],
) -> Result<String, HookError> {
    let base = &parsed_path.base;
    if directory_content.get(base) == Some(&EntryKind::File) {
        return Ok(base.clone());
    }
    for ext in extensions {
        let candidate = format!("{base}.{}", ext.as_ref());
        if directory_content.get(&candidate) == Some(&EntryKind::File) {
            return Ok(candidate);
        }
    }
    // `./b.js` written for a `b.ts` source
    if !parsed_path.ext.is_empty() {
        for ext in extensions {
            let candidate = format!("{}.{}", parsed_path.name, ext.as_ref());
            if directory_content.get(&candidate) == Some(&EntryKind::File) {
                return Ok(candidate);
            }
        }
    }
    if directory_content.get(base) == Some(&EntryKind::Directory) {
        return Ok(base.clone());
    }
    Err(HookError::new(format!(
        "Cannot find module for resolved path `{resolved_path}`"
    )))
}

/// Default index choice: the first `index.<ext>` file in extension order.
pub fn choose_index_with_extensions(
    resolved_path: &str,
    directory_path: &str,
    directory_content: &DirectoryContent,
    extensions: &[impl AsRef<str>],
) -> Result<String, HookError> {
    extensions
        .iter()
        .map(|ext| format!("index.{}", ext.as_ref()))
        .find(|candidate| directory_content.get(candidate) == Some(&EntryKind::File))
        .ok_or_else(|| {
            HookError::new(format!(
                "Cannot find index module in directory `{directory_path}` for resolved path `{resolved_path}`"
            ))
        })
}

/// Hooks with default policy, a configurable extension list and no payloads.
#[derive(Debug, Clone)]
pub struct DefaultHooks {
    extensions: Vec<String>,
}

impl DefaultHooks {
    pub fn new() -> Self {
        Self::with_extensions(DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()))
    }

    pub fn with_extensions(extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl Default for DefaultHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphHooks for DefaultHooks {
    type SourceData = ();
    type DependenciesData = ();

    fn choose_module(
        &self,
        resolved_path: &str,
        parsed_path: &ParsedPath,
        directory_content: &DirectoryContent,
    ) -> Result<String, HookError> {
        choose_module_with_extensions(resolved_path, parsed_path, directory_content, self.extensions.as_slice())
    }

    fn choose_index_module(
        &self,
        resolved_path: &str,
        directory_path: &str,
        directory_content: &DirectoryContent,
    ) -> Result<String, HookError> {
        choose_index_with_extensions(resolved_path, directory_path, directory_content, self.extensions.as_slice())
    }

    fn skip_module(&self, _module_path: &str, module_name: &str) -> bool {
        !has_module_extension(module_name, self.extensions.as_slice())
    }

    fn on_add_module(&self, _module: &Module, _transformed: &str, _original: &str) -> HookFuture<()> {
        ready(())
    }

    fn on_add_dependencies(&self, _module: &Module) -> HookFuture<()> {
        ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(entries: &[(&str, EntryKind)]) -> DirectoryContent {
        entries
            .iter()
            .map(|(name, kind)| (name.to_string(), *kind))
            .collect()
    }

    #[test]
    fn test_default_resolve_path() {
        let hooks = DefaultHooks::new();
        assert_eq!(
            hooks.resolve_path("src/a.ts", "./b").unwrap().as_deref(),
            Some("./src/b")
        );
        assert_eq!(
            hooks.resolve_path("src/a.ts", "node:fs").unwrap().as_deref(),
            Some("node:fs")
        );
    }

    #[test]
    fn test_choose_module_prefers_files() {
        let listing = content(&[
            ("b", EntryKind::Directory),
            ("b.js", EntryKind::File),
            ("b.ts", EntryKind::File),
        ]);
        let parsed = ParsedPath::parse("./b");
        assert_eq!(
            choose_module_with_extensions("./b", &parsed, &listing, DEFAULT_EXTENSIONS).unwrap(),
            "b.ts"
        );
    }

    #[test]
    fn test_choose_module_maps_js_to_ts() {
        let listing = content(&[("b.ts", EntryKind::File)]);
        let parsed = ParsedPath::parse("./b.js");
        assert_eq!(
            choose_module_with_extensions("./b.js", &parsed, &listing, DEFAULT_EXTENSIONS).unwrap(),
            "b.ts"
        );
    }

    #[test]
    fn test_choose_module_falls_back_to_directory() {
        let listing = content(&[("lib", EntryKind::Directory)]);
        let parsed = ParsedPath::parse("./lib");
        assert_eq!(
            choose_module_with_extensions("./lib", &parsed, &listing, DEFAULT_EXTENSIONS).unwrap(),
            "lib"
        );

        let parsed = ParsedPath::parse("./missing");
        let error =
            choose_module_with_extensions("./missing", &parsed, &listing, DEFAULT_EXTENSIONS).unwrap_err();
        assert!(error.message().contains("./missing"));
    }

    #[test]
    fn test_choose_index_module() {
        let listing = content(&[("index.js", EntryKind::File), ("index.ts", EntryKind::File)]);
        assert_eq!(
            choose_index_with_extensions("./lib", "lib", &listing, DEFAULT_EXTENSIONS).unwrap(),
            "index.ts"
        );
        assert!(choose_index_with_extensions("./lib", "lib", &DirectoryContent::new(), DEFAULT_EXTENSIONS).is_err());
    }

    #[test]
    fn test_skip_predicates() {
        let hooks = DefaultHooks::with_extensions(["ts"]);
        assert!(hooks.skip_directory("", "node_modules"));
        assert!(hooks.skip_directory("", ".git"));
        assert!(!hooks.skip_directory("", "src"));
        assert!(hooks.skip_module("a.js", "a.js"));
        assert!(hooks.skip_module("types.d.ts", "types.d.ts"));
        assert!(!hooks.skip_module("a.ts", "a.ts"));
    }

    #[tokio::test]
    async fn test_ready_future() {
        let value = ready(42).await.unwrap();
        assert_eq!(value, 42);
    }
}
