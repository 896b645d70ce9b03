use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Link, Name, Position, ResolvedImport};

/// One name forwarded with `export {by as name} from '...'`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReexportedName {
    /// Name in the source module, when it differs from the exported name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<Name>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedImport>,
}

impl ReexportedName {
    /// Name looked up in the source module for the exported `name`.
    pub fn source_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.by.as_deref().unwrap_or(name)
    }
}

/// One `export * as ns from '...'`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReexportedNamespace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedImport>,
}

/// Everything a module re-exports from one raw path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reexport {
    pub position: Position,
    /// What is re-exported as this module's default: a source name, or `*`
    /// for `export * as default from '...'`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Name>,
    /// Keyed by the exported name.
    pub names: IndexMap<Name, ReexportedName>,
    pub namespaces: IndexMap<Name, ReexportedNamespace>,
    /// `export * from '...'`
    pub star: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_default: Option<ResolvedImport>,
    /// Lazily filled answers for names looked up through the star re-export.
    pub resolved_through_star: BTreeMap<Name, ResolvedImport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

/// Marker stored in [`Reexport::default`] for a namespace re-exported as default.
pub const NAMESPACE_DEFAULT: &str = "*";

impl Reexport {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            default: None,
            names: IndexMap::new(),
            namespaces: IndexMap::new(),
            star: false,
            resolved_default: None,
            resolved_through_star: BTreeMap::new(),
            link: None,
        }
    }

    /// Names this re-export expects the target to export; `default` included.
    pub fn expected_names(&self) -> BTreeSet<Name> {
        let mut expected: BTreeSet<Name> = self
            .names
            .iter()
            .map(|(name, entry)| entry.source_name(name).to_string())
            .collect();
        if let Some(default) = &self.default {
            if default != NAMESPACE_DEFAULT {
                expected.insert(default.clone());
            }
        }
        expected
    }
}
