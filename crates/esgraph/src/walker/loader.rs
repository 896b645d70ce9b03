//! Loading one module and wiring it into its neighbours.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use super::{consistency, hook_failed, Edge, EdgeKind, Event, ModuleState, Traversal};
use crate::error::Result;
use crate::graph::{
    Edges, ExpectedExportKind, Link, Module, ModulePath, Name, Package, PackagePath, Position,
    RawPath, ResolvedImport,
};
use crate::hooks::GraphHooks;
use crate::merge::merge_imports_exports;
use crate::runtime::RuntimeResult;

impl From<EdgeKind> for ExpectedExportKind {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Import => ExpectedExportKind::Import,
            EdgeKind::Reexport => ExpectedExportKind::Reexport,
        }
    }
}

impl EdgeKind {
    fn describe(self) -> &'static str {
        match self {
            EdgeKind::Import => "import",
            EdgeKind::Reexport => "reexport",
        }
    }
}

/// Record `parent` as expecting an export of `kind`. Returns true when the
/// same parent already expected it the same way.
fn note_expected(
    slot: &mut BTreeMap<ModulePath, ExpectedExportKind>,
    parent: &str,
    kind: ExpectedExportKind,
) -> bool {
    match slot.get_mut(parent) {
        None => {
            slot.insert(parent.to_string(), kind);
            false
        }
        Some(existing) if *existing == kind || *existing == ExpectedExportKind::Both => true,
        Some(existing) => {
            *existing = ExpectedExportKind::Both;
            false
        }
    }
}

/// Register every expected name on the target's tables and return the ones
/// that were already expected by the same parent through the same kind.
fn record_expected(
    exports: &mut BTreeMap<Name, BTreeMap<ModulePath, ExpectedExportKind>>,
    default_export: &mut BTreeMap<ModulePath, ExpectedExportKind>,
    names: &BTreeSet<Name>,
    parent: &str,
    kind: EdgeKind,
) -> Vec<Name> {
    let kind = ExpectedExportKind::from(kind);
    names
        .iter()
        .filter(|name| {
            if name.as_str() == "default" {
                note_expected(default_export, parent, kind)
            } else {
                note_expected(exports.entry((*name).clone()).or_default(), parent, kind)
            }
        })
        .cloned()
        .collect()
}

fn set_link<S, D>(module: &mut Module<S, D>, raw_path: &str, kind: EdgeKind, link: Link) {
    match kind {
        EdgeKind::Import => {
            if let Some(import) = module.imports.get_mut(raw_path) {
                import.link = Some(link);
            }
        }
        EdgeKind::Reexport => {
            if let Some(reexport) = module.reexports.get_mut(raw_path) {
                reexport.link = Some(link);
            }
        }
    }
}

/// Point the parent's record at its target and add the forward edge.
/// Returns the names the record expects and the record position.
fn attach_parent<S, D>(
    parent: &mut Module<S, D>,
    edge: &Edge,
    link: Link,
) -> Result<(BTreeSet<Name>, Position)> {
    let missing_record = || {
        consistency(format!(
            "Cannot find {} record `{}` in module `{}`",
            edge.kind.describe(),
            edge.raw_path,
            edge.parent
        ))
    };
    let (expected, position) = match edge.kind {
        EdgeKind::Import => {
            let import = parent.imports.get(&edge.raw_path).ok_or_else(missing_record)?;
            (import.expected_names(), import.position)
        }
        EdgeKind::Reexport => {
            let reexport = parent.reexports.get(&edge.raw_path).ok_or_else(missing_record)?;
            (reexport.expected_names(), reexport.position)
        }
    };

    let edges: &mut Edges = match (&link, edge.kind) {
        (Link::Module(_), EdgeKind::Import) => &mut parent.imported_modules,
        (Link::Module(_), EdgeKind::Reexport) => &mut parent.reexported_modules,
        (_, EdgeKind::Import) => &mut parent.imported_packages,
        (_, EdgeKind::Reexport) => &mut parent.reexported_packages,
    };
    let target = link
        .module_path()
        .or_else(|| link.package_path())
        .unwrap_or_default()
        .to_string();
    edges.entry(target).or_default().insert(edge.raw_path.clone());

    set_link(parent, &edge.raw_path, edge.kind, link);
    Ok((expected, position))
}

/// Mark names the target module can never provide.
fn mark_not_found<S, D>(module: &mut Module<S, D>, raw_path: &str, kind: EdgeKind, missing: &[Name]) {
    if missing.is_empty() {
        return;
    }
    let is_missing = |name: &str| missing.iter().any(|m| m == name);
    match kind {
        EdgeKind::Import => {
            let Some(import) = module.imports.get_mut(raw_path) else {
                return;
            };
            for (name, imported) in import.names.iter_mut() {
                if is_missing(name) {
                    imported.resolved = Some(ResolvedImport::Error);
                }
            }
            if import.default.is_some() && is_missing("default") {
                import.resolved_default = Some(ResolvedImport::Error);
            }
        }
        EdgeKind::Reexport => {
            let Some(reexport) = module.reexports.get_mut(raw_path) else {
                return;
            };
            for (name, reexported) in reexport.names.iter_mut() {
                if is_missing(reexported.source_name(name)) {
                    reexported.resolved = Some(ResolvedImport::Error);
                }
            }
            if reexport.default.as_deref().is_some_and(is_missing) {
                reexport.resolved_default = Some(ResolvedImport::Error);
            }
        }
    }
}

impl<H: GraphHooks> Traversal<H> {
    /// Ask for a module, loading it on first request. The edge, if any, is
    /// linked once the module has been loaded.
    pub(super) fn request_module(&mut self, path: ModulePath, edge: Option<Edge>) -> Result<()> {
        match self.modules.get(&path) {
            Some(ModuleState::Loaded) => match edge {
                Some(edge) => self.link_module(edge, &path),
                None => Ok(()),
            },
            Some(ModuleState::Loading { .. }) => {
                if let Some(ModuleState::Loading { waiters, .. }) = self.modules.get_mut(&path) {
                    waiters.extend(edge);
                }
                Ok(())
            }
            None => {
                trace!(module = %path, "loading module");
                self.modules.insert(
                    path.clone(),
                    ModuleState::Loading {
                        waiters: edge.into_iter().collect(),
                        deferred_completions: 0,
                    },
                );
                self.spawn_read_module(path);
                Ok(())
            }
        }
    }

    pub(super) fn on_source_read(
        &mut self,
        path: ModulePath,
        source: RuntimeResult<Vec<u8>>,
    ) -> Result<()> {
        if self.graph.modules.contains_key(&path) {
            return Err(consistency(format!("Module `{path}` was read twice")));
        }

        let mut module = Module::new(path.clone());
        let original = match source {
            Ok(bytes) => String::from_utf8(bytes)
                .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
            Err(error) => {
                warn!(module = %path, %error, "cannot read module");
                module
                    .errors
                    .add(0, format!("Cannot read module by path `{path}`: {error}"));
                String::new()
            }
        };

        let transformed = self
            .hooks
            .transform_source(&path, original.clone())
            .map_err(hook_failed("transform_source", &path))?;
        let facts = self.parser.parse(&path, &transformed, self.parse_options);
        merge_imports_exports(&mut module, facts, &transformed);

        let records: Vec<(RawPath, EdgeKind)> = module
            .imports
            .keys()
            .map(|raw| (raw.clone(), EdgeKind::Import))
            .chain(module.reexports.keys().map(|raw| (raw.clone(), EdgeKind::Reexport)))
            .collect();

        let mut resolved_by_raw: FxHashMap<RawPath, Option<String>> = FxHashMap::default();
        let mut module_edges = Vec::new();
        let mut package_edges = Vec::new();
        for (raw_path, kind) in records {
            let resolved = match resolved_by_raw.get(&raw_path) {
                Some(resolved) => resolved.clone(),
                None => {
                    let resolved = self
                        .hooks
                        .resolve_path(&path, &raw_path)
                        .map_err(hook_failed("resolve_path", &path))?;
                    resolved_by_raw.insert(raw_path.clone(), resolved.clone());
                    resolved
                }
            };
            let edge = Edge { parent: path.clone(), raw_path, kind };
            match resolved {
                None => set_link(&mut module, &edge.raw_path, kind, Link::Skipped),
                Some(resolved) if resolved.starts_with('.') => {
                    module.uncompleted_dependencies_count += 1;
                    module_edges.push((edge, resolved));
                }
                Some(package) => package_edges.push((edge, package)),
            }
        }

        debug!(
            module = %path,
            imports = module.imports.len(),
            reexports = module.reexports.len(),
            exports = module.exports.len(),
            dependencies = module.uncompleted_dependencies_count,
            "module parsed"
        );
        self.graph.modules.insert(path.clone(), module);

        for (edge, package) in package_edges {
            self.link_package(edge, package)?;
        }

        let module = self
            .graph
            .modules
            .get(&path)
            .ok_or_else(|| consistency(format!("Module `{path}` vanished while loading")))?;
        let future = self.hooks.on_add_module(module, &transformed, &original);
        let added = path.clone();
        self.tasks.spawn(async move {
            let data = future.await;
            Event::ModuleAdded { path: added, data }
        });

        for (edge, resolved) in module_edges {
            self.resolve_edge(edge, resolved)?;
        }
        Ok(())
    }

    pub(super) fn on_module_added(
        &mut self,
        path: ModulePath,
        data: H::SourceData,
    ) -> Result<()> {
        let module = self
            .graph
            .modules
            .get_mut(&path)
            .ok_or_else(|| consistency(format!("Module `{path}` added before it was read")))?;
        module.source_data = Some(data);
        let no_dependencies = module.uncompleted_dependencies_count == 0;

        let (waiters, deferred_completions) = match self.modules.insert(path.clone(), ModuleState::Loaded) {
            Some(ModuleState::Loading { waiters, deferred_completions }) => (waiters, deferred_completions),
            _ => return Err(consistency(format!("Module `{path}` finished loading twice"))),
        };

        if no_dependencies {
            self.spawn_dependencies_added(&path)?;
        }
        for _ in 0..deferred_completions {
            self.complete_dependency(&path, super::CompletionMode::Strict)?;
        }
        for edge in waiters {
            self.link_module(edge, &path)?;
        }
        Ok(())
    }

    /// Link a relative edge to its loaded target module.
    pub(super) fn link_module(&mut self, edge: Edge, child_path: &str) -> Result<()> {
        let parent = self
            .graph
            .modules
            .get_mut(&edge.parent)
            .ok_or_else(|| consistency(format!("Cannot find parent module `{}`", edge.parent)))?;
        let (expected, position) =
            attach_parent(parent, &edge, Link::Module(child_path.to_string()))?;

        let child = self
            .graph
            .modules
            .get_mut(child_path)
            .ok_or_else(|| consistency(format!("Cannot find loaded module `{child_path}`")))?;
        let back_edges = match edge.kind {
            EdgeKind::Import => &mut child.imported_by_modules,
            EdgeKind::Reexport => &mut child.reexported_by_modules,
        };
        back_edges
            .entry(edge.parent.clone())
            .or_default()
            .insert(edge.raw_path.clone());

        let duplicates = record_expected(
            &mut child.expected_exports,
            &mut child.expected_default_export,
            &expected,
            &edge.parent,
            edge.kind,
        );
        let has_star = child.has_star_reexport();
        let missing: Vec<Name> = expected
            .iter()
            .filter(|name| !child.exports_name(name) && (name.as_str() == "default" || !has_star))
            .cloned()
            .collect();
        let child_completed = child.uncompleted_dependencies_count == 0;

        let parent = self
            .graph
            .modules
            .get_mut(&edge.parent)
            .ok_or_else(|| consistency(format!("Cannot find parent module `{}`", edge.parent)))?;
        for name in duplicates {
            parent.warnings.add(
                position,
                format!(
                    "Duplicate {} of `{name}` from module `{child_path}` through `{}`",
                    edge.kind.describe(),
                    edge.raw_path
                ),
            );
        }
        if !missing.is_empty() {
            debug!(module = %edge.parent, target = %child_path, ?missing, "names not exported by target");
        }
        mark_not_found(parent, &edge.raw_path, edge.kind, &missing);

        if child_completed {
            self.complete_dependency(&edge.parent, super::CompletionMode::Strict)?;
        }
        Ok(())
    }

    /// Close an edge whose target could not be resolved to a module.
    pub(super) fn link_failure(&mut self, edge: Edge, message: String) -> Result<()> {
        let parent = self
            .graph
            .modules
            .get_mut(&edge.parent)
            .ok_or_else(|| consistency(format!("Cannot find parent module `{}`", edge.parent)))?;
        debug!(module = %edge.parent, raw_path = %edge.raw_path, %message, "unresolved dependency");
        set_link(parent, &edge.raw_path, edge.kind, Link::Failed(message));
        self.complete_dependency(&edge.parent, super::CompletionMode::Strict)
    }

    /// Link a bare specifier to its package leaf.
    fn link_package(&mut self, edge: Edge, package_path: PackagePath) -> Result<()> {
        let parent = self
            .graph
            .modules
            .get_mut(&edge.parent)
            .ok_or_else(|| consistency(format!("Cannot find parent module `{}`", edge.parent)))?;
        let (expected, position) =
            attach_parent(parent, &edge, Link::Package(package_path.clone()))?;

        let package = self
            .graph
            .packages
            .entry(package_path.clone())
            .or_insert_with(|| Package::new(package_path.clone()));
        let back_edges = match edge.kind {
            EdgeKind::Import => &mut package.imported_by_modules,
            EdgeKind::Reexport => &mut package.reexported_by_modules,
        };
        back_edges
            .entry(edge.parent.clone())
            .or_default()
            .insert(edge.raw_path.clone());
        let duplicates = record_expected(
            &mut package.expected_exports,
            &mut package.expected_default_export,
            &expected,
            &edge.parent,
            edge.kind,
        );

        if !duplicates.is_empty() {
            let parent = self
                .graph
                .modules
                .get_mut(&edge.parent)
                .ok_or_else(|| consistency(format!("Cannot find parent module `{}`", edge.parent)))?;
            for name in duplicates {
                parent.warnings.add(
                    position,
                    format!(
                        "Duplicate {} of `{name}` from package `{package_path}` through `{}`",
                        edge.kind.describe(),
                        edge.raw_path
                    ),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_upgrades_to_both_and_flags_repeats() {
        let mut slot = BTreeMap::new();
        assert!(!note_expected(&mut slot, "./a.ts", ExpectedExportKind::Import));
        assert!(note_expected(&mut slot, "./a.ts", ExpectedExportKind::Import));
        assert!(!note_expected(&mut slot, "./a.ts", ExpectedExportKind::Reexport));
        assert_eq!(slot["./a.ts"], ExpectedExportKind::Both);
        assert!(note_expected(&mut slot, "./a.ts", ExpectedExportKind::Reexport));
    }

    #[test]
    fn record_expected_splits_default() {
        let mut exports = BTreeMap::new();
        let mut default_export = BTreeMap::new();
        let names: BTreeSet<Name> = ["default".to_string(), "x".to_string()].into();

        let duplicates = record_expected(&mut exports, &mut default_export, &names, "./a.ts", EdgeKind::Import);
        assert!(duplicates.is_empty());
        assert_eq!(default_export["./a.ts"], ExpectedExportKind::Import);
        assert_eq!(exports["x"]["./a.ts"], ExpectedExportKind::Import);

        let duplicates = record_expected(&mut exports, &mut default_export, &names, "./a.ts", EdgeKind::Import);
        assert_eq!(duplicates, vec!["default".to_string(), "x".to_string()]);
    }
}
