//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::hooks::HookError;
use crate::runtime::RuntimeError;

/// Errors that abort a whole graph build or resolution call.
///
/// Problems confined to one module (unreadable source, duplicate names,
/// unresolvable edges) never surface here; they are recorded on the module.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The runtime could not provide a working directory.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A caller-supplied hook failed.
    #[error("Hook `{hook}` failed for `{path}`")]
    Hook {
        hook: &'static str,
        path: String,
        #[source]
        source: HookError,
    },

    /// Traversal bookkeeping contradicts itself.
    #[error("Inconsistent module graph: {0}")]
    Consistency(String),

    /// A module path that is not part of the graph.
    #[error("Cannot find module `{0}` in graph")]
    UnknownModule(String),

    /// A spawned traversal task panicked or was cancelled.
    #[error("Traversal task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
