use serde::{Deserialize, Serialize};

use super::{Edges, ExpectedDefaultExport, ExpectedExports, PackagePath};

/// An external dependency: recorded, never traversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub path: PackagePath,
    pub expected_exports: ExpectedExports,
    pub expected_default_export: ExpectedDefaultExport,
    pub imported_by_modules: Edges,
    pub reexported_by_modules: Edges,
}

impl Package {
    pub fn new(path: impl Into<PackagePath>) -> Self {
        Self {
            path: path.into(),
            expected_exports: ExpectedExports::new(),
            expected_default_export: ExpectedDefaultExport::new(),
            imported_by_modules: Edges::new(),
            reexported_by_modules: Edges::new(),
        }
    }
}
