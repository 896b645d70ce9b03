//! Entry points for building a module graph.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::GraphConfig;
use crate::error::Result;
use crate::graph::Graph;
use crate::hooks::{DefaultHooks, GraphHooks};
use crate::parse::{OxcParser, SourceParser};
use crate::runtime::Runtime;
use crate::walker::Traversal;

/// Build the module graph described by `config`.
///
/// Every module reachable from `config.modules`, plus every module found
/// under `config.directories`, ends up in the graph exactly once. Problems
/// confined to one module are recorded on that module; only hook failures
/// and broken traversal bookkeeping abort the build.
pub async fn get_modules_graph<H: GraphHooks>(
    config: &GraphConfig,
    hooks: Arc<H>,
    runtime: Arc<dyn Runtime>,
    parser: Arc<dyn SourceParser>,
) -> Result<Graph<H::SourceData, H::DependenciesData>> {
    config.validate()?;
    Traversal::new(hooks, runtime, parser, config.parse_options())?
        .run(&config.modules, &config.directories)
        .await
}

/// Typestate marker for a builder without seeds.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured;

/// Typestate marker for a builder with at least one seed module or directory.
#[derive(Debug, Clone, Copy)]
pub struct Configured;

/// Fluent front end over [`get_modules_graph`].
///
/// `build()` only exists once a seed has been given.
///
/// ```rust,no_run
/// use esgraph::GraphBuilder;
///
/// # async fn example() -> esgraph::Result<()> {
/// let graph = GraphBuilder::new()
///     .module("src/index.ts")
///     .include_dynamic_imports(true)
///     .build()
///     .await?;
/// println!("{} modules", graph.modules.len());
/// # Ok(())
/// # }
/// ```
pub struct GraphBuilder<H: GraphHooks = DefaultHooks, State = Unconfigured> {
    config: GraphConfig,
    hooks: Arc<H>,
    runtime: Option<Arc<dyn Runtime>>,
    parser: Option<Arc<dyn SourceParser>>,
    _state: PhantomData<State>,
}

impl GraphBuilder<DefaultHooks, Unconfigured> {
    pub fn new() -> Self {
        Self {
            config: GraphConfig::default(),
            hooks: Arc::new(DefaultHooks::new()),
            runtime: None,
            parser: None,
            _state: PhantomData,
        }
    }

    /// Start from a loaded configuration, seeds included.
    pub fn from_config(config: GraphConfig) -> GraphBuilder<DefaultHooks, Configured> {
        let hooks = Arc::new(DefaultHooks::with_extensions(config.extensions.clone()));
        GraphBuilder {
            config,
            hooks,
            runtime: None,
            parser: None,
            _state: PhantomData,
        }
    }
}

impl Default for GraphBuilder<DefaultHooks, Unconfigured> {
    fn default() -> Self {
        Self::new()
    }
}

impl<State> GraphBuilder<DefaultHooks, State> {
    /// Extensions probed by the default hooks, without leading dot.
    pub fn extensions(mut self, extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.extensions = extensions.into_iter().map(Into::into).collect();
        self.hooks = Arc::new(DefaultHooks::with_extensions(self.config.extensions.clone()));
        self
    }
}

impl<H: GraphHooks, State> GraphBuilder<H, State> {
    fn into_state<Next>(self) -> GraphBuilder<H, Next> {
        GraphBuilder {
            config: self.config,
            hooks: self.hooks,
            runtime: self.runtime,
            parser: self.parser,
            _state: PhantomData,
        }
    }

    /// Add a seed module.
    pub fn module(mut self, path: impl Into<String>) -> GraphBuilder<H, Configured> {
        self.config.modules.push(path.into());
        self.into_state()
    }

    pub fn modules(
        mut self,
        paths: impl IntoIterator<Item = impl Into<String>>,
    ) -> GraphBuilder<H, Configured> {
        self.config.modules.extend(paths.into_iter().map(Into::into));
        self.into_state()
    }

    /// Add a directory whose modules are all seeds.
    pub fn directory(mut self, path: impl Into<String>) -> GraphBuilder<H, Configured> {
        self.config.directories.push(path.into());
        self.into_state()
    }

    /// Treat `import('x')` with a static string as a namespace import (default: false).
    pub fn include_dynamic_imports(mut self, include: bool) -> Self {
        self.config.include_dynamic_imports = include;
        self
    }

    /// Treat `require('x')` with a static string as a namespace import (default: false).
    pub fn include_requires(mut self, include: bool) -> Self {
        self.config.include_requires = include;
        self
    }

    /// Set the runtime for filesystem operations.
    ///
    /// If not set, the native runtime rooted at the process cwd is used.
    pub fn runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Replace the oxc-based parser.
    pub fn parser(mut self, parser: Arc<dyn SourceParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Replace the hooks; their data types become the graph's data types.
    pub fn hooks<H2: GraphHooks>(self, hooks: Arc<H2>) -> GraphBuilder<H2, State> {
        GraphBuilder {
            config: self.config,
            hooks,
            runtime: self.runtime,
            parser: self.parser,
            _state: PhantomData,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }
}

impl<H: GraphHooks> GraphBuilder<H, Configured> {
    pub async fn build(self) -> Result<Graph<H::SourceData, H::DependenciesData>> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => default_runtime()?,
        };
        let parser = self
            .parser
            .unwrap_or_else(|| Arc::new(OxcParser) as Arc<dyn SourceParser>);
        get_modules_graph(&self.config, self.hooks, runtime, parser).await
    }
}

#[cfg(not(target_family = "wasm"))]
fn default_runtime() -> Result<Arc<dyn Runtime>> {
    Ok(Arc::new(crate::runtime::native::NativeRuntime::new()))
}

#[cfg(target_family = "wasm")]
fn default_runtime() -> Result<Arc<dyn Runtime>> {
    Err(crate::runtime::RuntimeError::Other(
        "Runtime is required in WASM environment".to_string(),
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_seeds() {
        let builder = GraphBuilder::new()
            .module("src/a.ts")
            .modules(["src/b.ts"])
            .directory("lib")
            .include_requires(true)
            .extensions(["ts"]);

        let config = builder.config();
        assert_eq!(config.modules, vec!["src/a.ts", "src/b.ts"]);
        assert_eq!(config.directories, vec!["lib"]);
        assert!(config.include_requires);
        assert!(!config.include_dynamic_imports);
        assert_eq!(builder.hooks.extensions(), ["ts".to_string()]);
    }

    #[test]
    fn test_from_config_uses_configured_extensions() {
        let config = GraphConfig {
            modules: vec!["a.ts".into()],
            extensions: vec!["js".into()],
            ..GraphConfig::default()
        };
        let builder = GraphBuilder::from_config(config);
        assert_eq!(builder.hooks.extensions(), ["js".to_string()]);
    }
}
