//! Concurrent module graph traversal.
//!
//! One driver owns all traversal state. File reads, directory reads and
//! enrichment hooks run as tasks in a [`JoinSet`]; each task reports back
//! with an [`Event`] and the driver applies it synchronously. The graph is
//! complete when the set is empty: work added while draining is awaited
//! like any other task.

mod cache;
mod circular;
mod completion;
mod directories;
mod loader;
mod resolver;

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::task::JoinSet;
use tracing::{debug, info_span, Instrument};

use crate::error::{GraphError, Result};
use crate::graph::{Graph, ModulePath, RawPath};
use crate::hooks::{DirectoryContent, GraphHooks, HookError};
use crate::parse::{ParseOptions, SourceParser};
use crate::paths::normalize_path;
use crate::runtime::{DirEntry, Runtime, RuntimeResult};

use cache::CacheEntry;
pub(crate) use completion::CompletionMode;

/// Which record of the parent module an edge comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeKind {
    Import,
    Reexport,
}

/// A relative import or re-export waiting for its target module.
#[derive(Debug, Clone)]
pub(crate) struct Edge {
    pub(crate) parent: ModulePath,
    pub(crate) raw_path: RawPath,
    pub(crate) kind: EdgeKind,
}

#[derive(Debug)]
enum ModuleState {
    /// Read, parse or `on_add_module` still in flight.
    Loading {
        waiters: Vec<Edge>,
        /// Completions that arrived before the module finished loading.
        deferred_completions: usize,
    },
    Loaded,
}

/// Why a directory listing was requested.
#[derive(Debug)]
enum DirectoryWaiter {
    /// Pick the module a resolved path refers to.
    Resolve { resolved_path: String },
    /// Pick the index module of a directory chosen for a resolved path.
    Index {
        resolved_path: String,
        directory: String,
    },
    /// Directory walk discovery.
    Walk,
}

type DirectoryListing = std::result::Result<Arc<DirectoryContent>, String>;

enum Event<S, D> {
    SourceRead {
        path: ModulePath,
        source: RuntimeResult<Vec<u8>>,
    },
    DirectoryRead {
        path: String,
        entries: RuntimeResult<Vec<DirEntry>>,
    },
    ModuleAdded {
        path: ModulePath,
        data: std::result::Result<S, HookError>,
    },
    DependenciesAdded {
        path: ModulePath,
        data: std::result::Result<D, HookError>,
    },
}

pub(crate) struct Traversal<H: GraphHooks> {
    hooks: Arc<H>,
    runtime: Arc<dyn Runtime>,
    parser: Arc<dyn SourceParser>,
    parse_options: ParseOptions,
    cwd: PathBuf,
    graph: Graph<H::SourceData, H::DependenciesData>,
    modules: FxHashMap<ModulePath, ModuleState>,
    directories: FxHashMap<String, CacheEntry<DirectoryListing, DirectoryWaiter>>,
    /// Resolved path -> module path, or the reason it could not be resolved.
    resolved_paths: FxHashMap<String, CacheEntry<std::result::Result<ModulePath, String>, Edge>>,
    tasks: JoinSet<Event<H::SourceData, H::DependenciesData>>,
}

pub(crate) fn consistency(message: impl Into<String>) -> GraphError {
    GraphError::Consistency(message.into())
}

fn hook_failed(hook: &'static str, path: &str) -> impl FnOnce(HookError) -> GraphError {
    let path = path.to_string();
    move |source| GraphError::Hook { hook, path, source }
}

impl<H: GraphHooks> Traversal<H> {
    pub(crate) fn new(
        hooks: Arc<H>,
        runtime: Arc<dyn Runtime>,
        parser: Arc<dyn SourceParser>,
        parse_options: ParseOptions,
    ) -> Result<Self> {
        let cwd = runtime.get_cwd()?;
        Ok(Self {
            hooks,
            runtime,
            parser,
            parse_options,
            cwd,
            graph: Graph::new(),
            modules: FxHashMap::default(),
            directories: FxHashMap::default(),
            resolved_paths: FxHashMap::default(),
            tasks: JoinSet::new(),
        })
    }

    /// Load every module reachable from the seeds and close out completion.
    pub(crate) async fn run(
        mut self,
        modules: &[String],
        directories: &[String],
    ) -> Result<Graph<H::SourceData, H::DependenciesData>> {
        let span = info_span!("traversal", seeds = modules.len(), directories = directories.len());
        async move {
            for directory in directories {
                self.request_directory(normalize_path(directory), DirectoryWaiter::Walk)?;
            }
            for module in modules {
                self.request_module(normalize_path(module), None)?;
            }

            self.drain().await?;
            self.break_cycles()?;
            self.drain().await?;

            debug!(
                modules = self.graph.modules.len(),
                packages = self.graph.packages.len(),
                cycles = self.graph.circular_dependencies.len(),
                "module graph complete"
            );
            Ok(self.graph)
        }
        .instrument(span)
        .await
    }

    async fn drain(&mut self) -> Result<()> {
        while let Some(joined) = self.tasks.join_next().await {
            let event = joined.map_err(|e| GraphError::Task(e.to_string()))?;
            self.handle(event)?;
        }
        Ok(())
    }

    fn handle(&mut self, event: Event<H::SourceData, H::DependenciesData>) -> Result<()> {
        match event {
            Event::SourceRead { path, source } => self.on_source_read(path, source),
            Event::DirectoryRead { path, entries } => self.on_directory_read(path, entries),
            Event::ModuleAdded { path, data } => {
                let data = data.map_err(hook_failed("on_add_module", &path))?;
                self.on_module_added(path, data)
            }
            Event::DependenciesAdded { path, data } => {
                let data = data.map_err(hook_failed("on_add_dependencies", &path))?;
                let module = self
                    .graph
                    .modules
                    .get_mut(&path)
                    .ok_or_else(|| consistency(format!("Dependencies added to unknown module `{path}`")))?;
                module.dependencies_data = Some(data);
                Ok(())
            }
        }
    }

    fn spawn_read_module(&mut self, path: ModulePath) {
        let runtime = Arc::clone(&self.runtime);
        let full_path = self.cwd.join(&path);
        self.tasks.spawn(async move {
            let source = runtime.read_file(&full_path).await;
            Event::SourceRead { path, source }
        });
    }

    fn spawn_read_directory(&mut self, path: String) {
        let runtime = Arc::clone(&self.runtime);
        let full_path = self.cwd.join(&path);
        self.tasks.spawn(async move {
            let entries = runtime.read_dir(&full_path).await;
            Event::DirectoryRead { path, entries }
        });
    }

    fn spawn_dependencies_added(&mut self, path: &str) -> Result<()> {
        let module = self
            .graph
            .modules
            .get(path)
            .ok_or_else(|| consistency(format!("Cannot find completed module `{path}`")))?;
        let future = self.hooks.on_add_dependencies(module);
        let path = path.to_string();
        self.tasks.spawn(async move {
            let data = future.await;
            Event::DependenciesAdded { path, data }
        });
        Ok(())
    }
}
