use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    DefaultExport, Diagnostics, Edges, ExpectedDefaultExport, ExpectedExports, Export, Import,
    ModulePath, Name, RawPath, Reexport,
};

/// One source file of the graph.
///
/// Adjacency maps are keyed by the module (or package) path on the other end
/// of the edge and hold the raw paths that produced the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module<S = (), D = ()> {
    pub path: ModulePath,
    /// Relative dependencies whose own subtree has not completed yet.
    pub uncompleted_dependencies_count: usize,
    pub imports: IndexMap<RawPath, Import>,
    pub reexports: IndexMap<RawPath, Reexport>,
    pub exports: IndexMap<Name, Export>,
    pub default_export: Option<DefaultExport>,
    pub imported_modules: Edges,
    pub imported_by_modules: Edges,
    pub reexported_modules: Edges,
    pub reexported_by_modules: Edges,
    pub imported_packages: Edges,
    pub reexported_packages: Edges,
    pub expected_exports: ExpectedExports,
    pub expected_default_export: ExpectedDefaultExport,
    pub errors: Diagnostics,
    pub parse_errors: Diagnostics,
    pub warnings: Diagnostics,
    pub source_data: Option<S>,
    pub dependencies_data: Option<D>,
}

impl<S, D> Module<S, D> {
    pub fn new(path: impl Into<ModulePath>) -> Self {
        Self {
            path: path.into(),
            uncompleted_dependencies_count: 0,
            imports: IndexMap::new(),
            reexports: IndexMap::new(),
            exports: IndexMap::new(),
            default_export: None,
            imported_modules: Edges::new(),
            imported_by_modules: Edges::new(),
            reexported_modules: Edges::new(),
            reexported_by_modules: Edges::new(),
            imported_packages: Edges::new(),
            reexported_packages: Edges::new(),
            expected_exports: ExpectedExports::new(),
            expected_default_export: ExpectedDefaultExport::new(),
            errors: Diagnostics::new(),
            parse_errors: Diagnostics::new(),
            warnings: Diagnostics::new(),
            source_data: None,
            dependencies_data: None,
        }
    }

    /// True if some `export * from '...'` could supply names not listed in `exports`.
    pub fn has_star_reexport(&self) -> bool {
        self.reexports.values().any(|reexport| reexport.star)
    }

    /// True if `name` is available from this module without star re-exports.
    pub fn exports_name(&self, name: &str) -> bool {
        if name == "default" {
            self.default_export.is_some()
        } else {
            self.exports.contains_key(name)
        }
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.errors.is_empty() || !self.parse_errors.is_empty() || !self.warnings.is_empty()
    }
}
