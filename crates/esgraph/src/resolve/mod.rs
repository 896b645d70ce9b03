//! Tracing imported and re-exported names to their origin.
//!
//! Resolution runs on a finished [`Graph`] and writes every answer back into
//! the import or re-export record it was asked about, so repeated questions
//! are answered from the record without walking the graph again.
//!
//! An answer is only written back when it does not depend on the chain the
//! lookup was started from: a [`ResolvedImport::Circular`] that closed on a
//! pair above the recording frame leaves the record empty.

use tracing::trace;

use crate::error::{GraphError, Result};
use crate::graph::{
    Export, Graph, Link, Module, ModulePath, Name, NAMESPACE_DEFAULT, RawPath, Reexport,
    ResolvedImport,
};

/// Stateful resolver over one graph.
///
/// Keeps the chain of `(module, name)` pairs currently being followed so
/// that a lookup returning to a pair already on the chain answers
/// [`ResolvedImport::Circular`] instead of recursing forever.
#[derive(Debug)]
pub struct ImportResolver<'g, S, D> {
    graph: &'g mut Graph<S, D>,
    chain: Vec<(ModulePath, Name)>,
    /// Lowest chain index a circular answer closed on since the last reset.
    circular_floor: usize,
    visits: usize,
}

/// Resolve `name` as exported by `module_path`.
pub fn resolve_one_import<S, D>(
    graph: &mut Graph<S, D>,
    module_path: &str,
    name: &str,
) -> Result<ResolvedImport> {
    ImportResolver::new(graph).resolve(module_path, name)
}

/// Resolve every name and default imported by `module_path`.
pub fn resolve_imports<S, D>(graph: &mut Graph<S, D>, module_path: &str) -> Result<()> {
    ImportResolver::new(graph).resolve_imports(module_path)
}

/// Resolve every name, namespace and default re-exported by `module_path`.
pub fn resolve_reexports<S, D>(graph: &mut Graph<S, D>, module_path: &str) -> Result<()> {
    ImportResolver::new(graph).resolve_reexports(module_path)
}

fn package_name(package_path: &str, name: &str) -> ResolvedImport {
    if name == "default" {
        ResolvedImport::DefaultFromPackage {
            package_path: package_path.to_string(),
        }
    } else {
        ResolvedImport::NameFromPackage {
            package_path: package_path.to_string(),
            name: name.to_string(),
        }
    }
}

fn unlinked(module_path: &str, raw_path: &str) -> GraphError {
    GraphError::Consistency(format!(
        "Raw path `{raw_path}` of module `{module_path}` was never linked"
    ))
}

fn missing_reexport(module_path: &str, raw_path: &str) -> GraphError {
    GraphError::Consistency(format!(
        "Cannot find reexport of `{raw_path}` in module `{module_path}`"
    ))
}

impl<'g, S, D> ImportResolver<'g, S, D> {
    pub fn new(graph: &'g mut Graph<S, D>) -> Self {
        Self {
            graph,
            chain: Vec::new(),
            circular_floor: usize::MAX,
            visits: 0,
        }
    }

    /// Number of `(module, name)` lookups performed so far.
    pub fn visits(&self) -> usize {
        self.visits
    }

    fn module(&self, module_path: &str) -> Result<&Module<S, D>> {
        self.graph
            .modules
            .get(module_path)
            .ok_or_else(|| GraphError::UnknownModule(module_path.to_string()))
    }

    fn module_mut(&mut self, module_path: &str) -> Result<&mut Module<S, D>> {
        self.graph
            .modules
            .get_mut(module_path)
            .ok_or_else(|| GraphError::UnknownModule(module_path.to_string()))
    }

    fn reexport_mut(&mut self, module_path: &str, raw_path: &str) -> Result<&mut Reexport> {
        self.module_mut(module_path)?
            .reexports
            .get_mut(raw_path)
            .ok_or_else(|| missing_reexport(module_path, raw_path))
    }

    /// Where `name` exported by `module_path` comes from.
    pub fn resolve(&mut self, module_path: &str, name: &str) -> Result<ResolvedImport> {
        self.visits += 1;
        if let Some(index) = self
            .chain
            .iter()
            .position(|(path, chained)| path == module_path && chained == name)
        {
            trace!(module = %module_path, %name, "circular resolution");
            self.circular_floor = self.circular_floor.min(index);
            return Ok(ResolvedImport::Circular {
                module_path: module_path.to_string(),
                name: name.to_string(),
            });
        }
        self.module(module_path)?;

        self.chain.push((module_path.to_string(), name.to_string()));
        let resolved = if name == "default" {
            self.resolve_default(module_path)
        } else {
            self.resolve_name(module_path, name)
        };
        self.chain.pop();
        resolved
    }

    /// Resolve `name` of `target` on behalf of the frame on top of the chain.
    ///
    /// The flag tells whether the answer may be written into that frame's
    /// records: every circular answer inside closed on the frame or deeper.
    fn resolve_cacheable(&mut self, target: &str, name: &str) -> Result<(ResolvedImport, bool)> {
        let outer = std::mem::replace(&mut self.circular_floor, usize::MAX);
        let resolved = self.resolve(target, name);
        let floor = self.circular_floor;
        self.circular_floor = outer.min(floor);
        let frame = self.chain.len().saturating_sub(1);
        Ok((resolved?, floor >= frame))
    }

    fn resolve_default(&mut self, module_path: &str) -> Result<ResolvedImport> {
        let Some(default) = self.module(module_path)?.default_export.clone() else {
            return Ok(ResolvedImport::Error);
        };
        let Some(from) = default.from else {
            return Ok(match default.by {
                Some(by) if by != "default" => ResolvedImport::Name {
                    module_path: module_path.to_string(),
                    name: by,
                },
                _ => ResolvedImport::Default {
                    module_path: module_path.to_string(),
                },
            });
        };

        let reexport = self
            .module(module_path)?
            .reexports
            .get(&from)
            .ok_or_else(|| missing_reexport(module_path, &from))?;
        if let Some(resolved) = &reexport.resolved_default {
            return Ok(resolved.clone());
        }
        let source_name = default.by.as_deref().unwrap_or("default");
        let (resolved, cacheable) = match reexport.link.clone() {
            None => return Err(unlinked(module_path, &from)),
            Some(Link::Skipped | Link::Failed(_)) => return Ok(ResolvedImport::Error),
            Some(Link::Package(package_path)) if default.namespace => {
                (ResolvedImport::NamespaceFromPackage { package_path }, true)
            }
            Some(Link::Package(package_path)) => (package_name(&package_path, source_name), true),
            Some(Link::Module(target)) if default.namespace => {
                (ResolvedImport::Namespace { module_path: target }, true)
            }
            Some(Link::Module(target)) => self.resolve_cacheable(&target, source_name)?,
        };
        if cacheable {
            self.reexport_mut(module_path, &from)?.resolved_default = Some(resolved.clone());
        }
        Ok(resolved)
    }

    fn resolve_name(&mut self, module_path: &str, name: &str) -> Result<ResolvedImport> {
        match self.module(module_path)?.exports.get(name).cloned() {
            Some(Export::Declaration { .. }) => Ok(ResolvedImport::Name {
                module_path: module_path.to_string(),
                name: name.to_string(),
            }),
            Some(Export::Name { by, .. }) => Ok(ResolvedImport::Name {
                module_path: module_path.to_string(),
                name: by.unwrap_or_else(|| name.to_string()),
            }),
            Some(Export::Reexport {
                from, by, namespace, ..
            }) => self.resolve_reexported(module_path, name, &from, by.as_deref(), namespace),
            None => self.resolve_through_stars(module_path, name),
        }
    }

    fn resolve_reexported(
        &mut self,
        module_path: &str,
        name: &str,
        from: &str,
        by: Option<&str>,
        namespace: bool,
    ) -> Result<ResolvedImport> {
        let reexport = self
            .module(module_path)?
            .reexports
            .get(from)
            .ok_or_else(|| missing_reexport(module_path, from))?;
        let memo = if namespace {
            reexport.namespaces.get(name).and_then(|entry| entry.resolved.clone())
        } else {
            reexport.names.get(name).and_then(|entry| entry.resolved.clone())
        };
        if let Some(resolved) = memo {
            return Ok(resolved);
        }

        let source_name = by.unwrap_or(name);
        let (resolved, cacheable) = match reexport.link.clone() {
            None => return Err(unlinked(module_path, from)),
            Some(Link::Skipped | Link::Failed(_)) => return Ok(ResolvedImport::Error),
            Some(Link::Package(package_path)) if namespace => {
                (ResolvedImport::NamespaceFromPackage { package_path }, true)
            }
            Some(Link::Package(package_path)) => (package_name(&package_path, source_name), true),
            Some(Link::Module(target)) if namespace => {
                (ResolvedImport::Namespace { module_path: target }, true)
            }
            Some(Link::Module(target)) => self.resolve_cacheable(&target, source_name)?,
        };
        if !cacheable {
            return Ok(resolved);
        }

        let reexport = self.reexport_mut(module_path, from)?;
        if namespace {
            if let Some(entry) = reexport.namespaces.get_mut(name) {
                entry.resolved = Some(resolved.clone());
            }
        } else if let Some(entry) = reexport.names.get_mut(name) {
            entry.resolved = Some(resolved.clone());
        }
        Ok(resolved)
    }

    /// Look `name` up behind every `export * from`, in source order.
    ///
    /// The first found answer wins. A different answer from a later star is
    /// recorded as an error on the module.
    fn resolve_through_stars(&mut self, module_path: &str, name: &str) -> Result<ResolvedImport> {
        let stars: Vec<(RawPath, Option<Link>, Option<ResolvedImport>)> = self
            .module(module_path)?
            .reexports
            .iter()
            .filter(|(_, reexport)| reexport.star)
            .map(|(raw_path, reexport)| {
                (
                    raw_path.clone(),
                    reexport.link.clone(),
                    reexport.resolved_through_star.get(name).cloned(),
                )
            })
            .collect();

        let mut winner: Option<(RawPath, ResolvedImport)> = None;
        let mut conflicting: Vec<RawPath> = Vec::new();
        let mut packages = Vec::new();
        for (raw_path, link, memo) in stars {
            let target = match link {
                Some(Link::Module(target)) => target,
                Some(Link::Package(package_path)) => {
                    packages.push(package_path);
                    continue;
                }
                _ => continue,
            };
            let resolved = match memo {
                Some(resolved) => resolved,
                None => {
                    let (resolved, cacheable) = self.resolve_cacheable(&target, name)?;
                    if cacheable {
                        self.reexport_mut(module_path, &raw_path)?
                            .resolved_through_star
                            .insert(name.to_string(), resolved.clone());
                    }
                    resolved
                }
            };
            if !resolved.is_found() {
                continue;
            }
            match &winner {
                None => winner = Some((raw_path, resolved)),
                Some((_, first)) if *first != resolved => conflicting.push(raw_path),
                Some(_) => {}
            }
        }

        match winner {
            Some((first_raw_path, resolved)) => {
                if !conflicting.is_empty() {
                    self.record_conflict(module_path, name, &first_raw_path, &conflicting)?;
                }
                Ok(resolved)
            }
            None if !packages.is_empty() => Ok(ResolvedImport::FromPackages {
                name: name.to_string(),
                packages_paths: packages,
            }),
            None => Ok(ResolvedImport::Error),
        }
    }

    fn record_conflict(
        &mut self,
        module_path: &str,
        name: &str,
        first_raw_path: &str,
        conflicting: &[RawPath],
    ) -> Result<()> {
        let module = self.module_mut(module_path)?;
        let position = conflicting
            .first()
            .and_then(|raw_path| module.reexports.get(raw_path))
            .map(|reexport| reexport.position)
            .unwrap_or(0);
        let message = format!(
            "Duplicate star-reexported name `{name}`: `{first_raw_path}` is used, `{}` ignored",
            conflicting.join("`, `")
        );
        if !module.errors.contains(&message) {
            module.errors.add(position, message);
        }
        Ok(())
    }

    /// Fill the `resolved` slot of every name and default `module_path` imports.
    pub fn resolve_imports(&mut self, module_path: &str) -> Result<()> {
        let imports: Vec<(RawPath, Option<Link>, Vec<Name>, bool)> = self
            .module(module_path)?
            .imports
            .iter()
            .map(|(raw_path, import)| {
                let names = import
                    .names
                    .iter()
                    .filter(|(_, imported)| imported.resolved.is_none())
                    .map(|(name, _)| name.clone())
                    .collect();
                let default = import.default.is_some() && import.resolved_default.is_none();
                (raw_path.clone(), import.link.clone(), names, default)
            })
            .collect();

        for (raw_path, link, names, default) in imports {
            let target = match link {
                Some(Link::Module(target)) => target,
                Some(Link::Package(package_path)) => {
                    let import = self.import_mut(module_path, &raw_path)?;
                    for name in &names {
                        if let Some(imported) = import.names.get_mut(name) {
                            imported.resolved = Some(package_name(&package_path, name));
                        }
                    }
                    if default {
                        import.resolved_default = Some(package_name(&package_path, "default"));
                    }
                    continue;
                }
                None => return Err(unlinked(module_path, &raw_path)),
                Some(Link::Skipped | Link::Failed(_)) => continue,
            };

            for name in names {
                let resolved = self.resolve(&target, &name)?;
                if let Some(imported) = self.import_mut(module_path, &raw_path)?.names.get_mut(&name) {
                    imported.resolved = Some(resolved);
                }
            }
            if default {
                let resolved = self.resolve(&target, "default")?;
                self.import_mut(module_path, &raw_path)?.resolved_default = Some(resolved);
            }
        }
        Ok(())
    }

    fn import_mut(&mut self, module_path: &str, raw_path: &str) -> Result<&mut crate::graph::Import> {
        self.module_mut(module_path)?
            .imports
            .get_mut(raw_path)
            .ok_or_else(|| {
                GraphError::Consistency(format!(
                    "Cannot find import of `{raw_path}` in module `{module_path}`"
                ))
            })
    }

    /// Fill the `resolved` slot of every name, namespace and default
    /// `module_path` re-exports.
    pub fn resolve_reexports(&mut self, module_path: &str) -> Result<()> {
        struct Pending {
            raw_path: RawPath,
            link: Option<Link>,
            names: Vec<(Name, Name)>,
            namespaces: Vec<Name>,
            default: Option<Name>,
        }

        let pending: Vec<Pending> = self
            .module(module_path)?
            .reexports
            .iter()
            .map(|(raw_path, reexport)| Pending {
                raw_path: raw_path.clone(),
                link: reexport.link.clone(),
                names: reexport
                    .names
                    .iter()
                    .filter(|(_, entry)| entry.resolved.is_none())
                    .map(|(name, entry)| (name.clone(), entry.source_name(name).to_string()))
                    .collect(),
                namespaces: reexport
                    .namespaces
                    .iter()
                    .filter(|(_, entry)| entry.resolved.is_none())
                    .map(|(name, _)| name.clone())
                    .collect(),
                default: reexport
                    .default
                    .clone()
                    .filter(|_| reexport.resolved_default.is_none()),
            })
            .collect();

        for entry in pending {
            let (names, namespaces, default) = match entry.link {
                None => return Err(unlinked(module_path, &entry.raw_path)),
                Some(Link::Skipped | Link::Failed(_)) => continue,
                Some(Link::Package(package_path)) => {
                    let names: Vec<(Name, ResolvedImport)> = entry
                        .names
                        .into_iter()
                        .map(|(name, source)| (name, package_name(&package_path, &source)))
                        .collect();
                    let namespaces = entry
                        .namespaces
                        .into_iter()
                        .map(|name| {
                            let package_path = package_path.clone();
                            (name, ResolvedImport::NamespaceFromPackage { package_path })
                        })
                        .collect();
                    let default = entry.default.map(|source| {
                        if source == NAMESPACE_DEFAULT {
                            ResolvedImport::NamespaceFromPackage {
                                package_path: package_path.clone(),
                            }
                        } else {
                            package_name(&package_path, &source)
                        }
                    });
                    (names, namespaces, default)
                }
                Some(Link::Module(target)) => {
                    let mut names = Vec::with_capacity(entry.names.len());
                    for (name, source) in entry.names {
                        let resolved = self.resolve(&target, &source)?;
                        names.push((name, resolved));
                    }
                    let namespaces: Vec<(Name, ResolvedImport)> = entry
                        .namespaces
                        .into_iter()
                        .map(|name| {
                            let module_path = target.clone();
                            (name, ResolvedImport::Namespace { module_path })
                        })
                        .collect();
                    let default = match entry.default {
                        Some(source) if source == NAMESPACE_DEFAULT => Some(ResolvedImport::Namespace {
                            module_path: target.clone(),
                        }),
                        Some(source) => Some(self.resolve(&target, &source)?),
                        None => None,
                    };
                    (names, namespaces, default)
                }
            };

            let reexport = self.reexport_mut(module_path, &entry.raw_path)?;
            for (name, resolved) in names {
                if let Some(slot) = reexport.names.get_mut(&name) {
                    slot.resolved = Some(resolved);
                }
            }
            for (name, resolved) in namespaces {
                if let Some(slot) = reexport.namespaces.get_mut(&name) {
                    slot.resolved = Some(resolved);
                }
            }
            if let Some(resolved) = default {
                reexport.resolved_default = Some(resolved);
            }
        }
        Ok(())
    }
}
