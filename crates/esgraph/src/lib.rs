//! # esgraph
//!
//! Module graphs for ES/TypeScript projects.
//!
//! Starting from seed modules (or whole directories), esgraph reads each
//! module through a [`Runtime`], extracts its imports, exports and
//! re-exports, follows relative paths to further modules and treats bare
//! specifiers as opaque packages. The result is a [`Graph`] keyed by module
//! path in which every edge is recorded on both ends.
//!
//! ## Overview
//!
//! - **Traversal**: [`get_modules_graph`] / [`GraphBuilder`] load every
//!   reachable module concurrently, reading each file and directory once.
//! - **Completion**: a module is complete once all of its dependencies are;
//!   [`GraphHooks::on_add_dependencies`] runs at that point. Circular
//!   dependencies are detected and broken, and listed on the graph.
//! - **Resolution**: [`resolve_one_import`], [`resolve_imports`] and
//!   [`resolve_reexports`] trace names through re-export chains to their
//!   origin, caching every answer on the graph.
//!
//! Problems local to one module (unreadable file, duplicate names, syntax
//! errors, unresolvable imports) are recorded as diagnostics on the module,
//! never as a failed build.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use esgraph::{GraphBuilder, resolve_imports};
//!
//! # async fn example() -> esgraph::Result<()> {
//! let mut graph = GraphBuilder::new().module("src/index.ts").build().await?;
//! resolve_imports(&mut graph, "src/index.ts")?;
//!
//! for (path, module) in &graph.modules {
//!     for (position, message) in module.errors.iter() {
//!         eprintln!("{path}:{position}: {message}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! esgraph emits `tracing` events. Enable the `logging` feature for a
//! ready-made subscriber in [`logging`].

pub mod builder;
pub mod config;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod merge;
pub mod parse;
pub mod paths;
pub mod resolve;
pub mod runtime;

mod walker;

#[cfg(feature = "logging")]
pub mod logging;

pub use builder::{Configured, GraphBuilder, Unconfigured, get_modules_graph};
pub use config::{ConfigError, GraphConfig};
pub use error::{GraphError, Result};
pub use graph::{Graph, Link, Module, Package, ResolvedImport};
pub use hooks::{DefaultHooks, GraphHooks, HookError, HookFuture};
pub use parse::{OxcParser, ParseOptions, SourceParser};
pub use resolve::{ImportResolver, resolve_imports, resolve_one_import, resolve_reexports};
pub use runtime::{Runtime, RuntimeError, RuntimeResult};

#[cfg(not(target_family = "wasm"))]
pub use runtime::native::NativeRuntime;

#[cfg(any(
    all(test, not(target_family = "wasm")),
    all(feature = "test-utils", not(target_family = "wasm"))
))]
pub use runtime::test_utils::TestRuntime;

#[cfg(test)]
mod tests;
