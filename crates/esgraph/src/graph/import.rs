use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Link, Name, Position, ResolvedImport};

/// How a whole module namespace is bound by an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "kebab-case")]
pub enum NamespaceBinding {
    /// `import * as ns from '...'`
    Import(Name),
    /// `import('...')` with a static string
    DynamicImport,
    /// `require('...')` with a static string
    Require,
}

/// One name imported with `import {name as local}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedName {
    /// Local binding, when it differs from the imported name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<Name>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedImport>,
}

/// Everything a module imports from one raw path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Start of the first statement importing this raw path.
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Name>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<NamespaceBinding>,
    /// Keyed by the imported (exported-side) name.
    pub names: IndexMap<Name, ImportedName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_default: Option<ResolvedImport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl Import {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            default: None,
            namespace: None,
            names: IndexMap::new(),
            resolved_default: None,
            link: None,
        }
    }

    /// Names this import expects the target to export; `default` included.
    pub fn expected_names(&self) -> BTreeSet<Name> {
        let mut expected: BTreeSet<Name> = self.names.keys().cloned().collect();
        if self.default.is_some() {
            expected.insert("default".to_string());
        }
        expected
    }
}
