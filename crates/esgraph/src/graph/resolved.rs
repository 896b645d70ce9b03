use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ModulePath, Name, PackagePath};

/// Where an imported or re-exported name ultimately comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResolvedImport {
    /// The name cannot be traced to any origin.
    Error,
    /// Resolution returned to a `(module, name)` pair it was already following.
    Circular { module_path: ModulePath, name: Name },
    /// The default export of a module.
    Default { module_path: ModulePath },
    /// The namespace object of a module.
    Namespace { module_path: ModulePath },
    /// A named export declared in a module.
    Name { module_path: ModulePath, name: Name },
    DefaultFromPackage { package_path: PackagePath },
    NamespaceFromPackage { package_path: PackagePath },
    NameFromPackage { package_path: PackagePath, name: Name },
    /// Only star re-exports of packages could supply the name; which one does
    /// can only be told by reading the packages themselves.
    FromPackages {
        name: Name,
        packages_paths: Vec<PackagePath>,
    },
}

impl ResolvedImport {
    pub fn is_error(&self) -> bool {
        matches!(self, ResolvedImport::Error)
    }

    pub fn is_circular(&self) -> bool {
        matches!(self, ResolvedImport::Circular { .. })
    }

    /// True for answers that point at an actual origin.
    pub fn is_found(&self) -> bool {
        !self.is_error() && !self.is_circular()
    }
}

impl fmt::Display for ResolvedImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedImport::Error => write!(f, "error"),
            ResolvedImport::Circular { module_path, name } => {
                write!(f, "circular `{name}` in `{module_path}`")
            }
            ResolvedImport::Default { module_path } => write!(f, "default of `{module_path}`"),
            ResolvedImport::Namespace { module_path } => {
                write!(f, "namespace of `{module_path}`")
            }
            ResolvedImport::Name { module_path, name } => {
                write!(f, "`{name}` from `{module_path}`")
            }
            ResolvedImport::DefaultFromPackage { package_path } => {
                write!(f, "default from package `{package_path}`")
            }
            ResolvedImport::NamespaceFromPackage { package_path } => {
                write!(f, "namespace from package `{package_path}`")
            }
            ResolvedImport::NameFromPackage { package_path, name } => {
                write!(f, "`{name}` from package `{package_path}`")
            }
            ResolvedImport::FromPackages {
                name,
                packages_paths,
            } => write!(f, "`{name}` from one of packages {}", packages_paths.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_kind_tag() {
        let resolved = ResolvedImport::NameFromPackage {
            package_path: "pkg".to_string(),
            name: "x".to_string(),
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["kind"], "name-from-package");
        assert_eq!(json["package_path"], "pkg");
        assert_eq!(json["name"], "x");

        let json = serde_json::to_value(ResolvedImport::Error).unwrap();
        assert_eq!(json["kind"], "error");
    }

    #[test]
    fn test_found_excludes_error_and_circular() {
        assert!(!ResolvedImport::Error.is_found());
        assert!(
            !ResolvedImport::Circular {
                module_path: "a.ts".into(),
                name: "x".into()
            }
            .is_found()
        );
        assert!(
            ResolvedImport::Default {
                module_path: "a.ts".into()
            }
            .is_found()
        );
    }
}
