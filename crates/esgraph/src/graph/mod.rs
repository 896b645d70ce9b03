//! Graph data model.
//!
//! Modules and packages refer to each other by path, never by reference:
//! every edge is a key into [`Graph::modules`] or [`Graph::packages`].

mod diagnostics;
mod export;
mod import;
mod module;
mod package;
mod reexport;
mod resolved;

pub use diagnostics::Diagnostics;
pub use export::{DeclarationKind, DefaultExport, Export};
pub use import::{Import, ImportedName, NamespaceBinding};
pub use module::Module;
pub use package::Package;
pub use reexport::{NAMESPACE_DEFAULT, Reexport, ReexportedName, ReexportedNamespace};
pub use resolved::ResolvedImport;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Normalized, `/`-separated path of a module relative to the runtime cwd.
pub type ModulePath = String;
/// Bare specifier of an external package, as returned by path resolution.
pub type PackagePath = String;
/// The literal string after `from` (or inside `import()`/`require()`).
pub type RawPath = String;
pub type Name = String;
/// Byte offset of a statement in the (transformed) module source.
pub type Position = u32;

/// Edge map: other end of the edge -> raw paths producing it.
pub type Edges = BTreeMap<String, BTreeSet<RawPath>>;
/// Exported name -> dependent module -> how it expects the name.
pub type ExpectedExports = BTreeMap<Name, BTreeMap<ModulePath, ExpectedExportKind>>;
/// Dependent module -> how it expects the default export.
pub type ExpectedDefaultExport = BTreeMap<ModulePath, ExpectedExportKind>;

/// How a dependent module expects a name from its dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedExportKind {
    Import,
    Reexport,
    Both,
}

/// What a raw path of an import or re-export turned out to point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Link {
    Module(ModulePath),
    Package(PackagePath),
    /// Path resolution declined to follow the edge.
    Skipped,
    /// The edge could not be resolved to a module file.
    Failed(String),
}

impl Link {
    pub fn module_path(&self) -> Option<&str> {
        match self {
            Link::Module(path) => Some(path),
            _ => None,
        }
    }

    pub fn package_path(&self) -> Option<&str> {
        match self {
            Link::Package(path) => Some(path),
            _ => None,
        }
    }

    /// True if the edge leads nowhere resolvable.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Link::Skipped | Link::Failed(_))
    }
}

/// A finished module graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph<S = (), D = ()> {
    pub modules: BTreeMap<ModulePath, Module<S, D>>,
    pub packages: BTreeMap<PackagePath, Package>,
    /// Failures that belong to no single module.
    pub errors: Vec<String>,
    /// Each cycle found by the breaker, in chain order.
    pub circular_dependencies: Vec<Vec<ModulePath>>,
}

impl<S, D> Default for Graph<S, D> {
    fn default() -> Self {
        Self {
            modules: BTreeMap::new(),
            packages: BTreeMap::new(),
            errors: Vec::new(),
            circular_dependencies: Vec::new(),
        }
    }
}

impl<S, D> Graph<S, D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(&self, path: &str) -> Option<&Module<S, D>> {
        self.modules.get(path)
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules carrying at least one error, parse error or warning.
    pub fn modules_with_diagnostics(&self) -> impl Iterator<Item = &Module<S, D>> {
        self.modules.values().filter(|module| module.has_diagnostics())
    }
}
