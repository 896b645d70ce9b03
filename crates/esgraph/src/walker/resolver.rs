//! Resolved path -> module file, through cached directory listings.

use std::sync::Arc;

use tracing::trace;

use super::cache::CacheEntry;
use super::{consistency, DirectoryListing, DirectoryWaiter, Edge, Traversal};
use crate::error::Result;
use crate::graph::ModulePath;
use crate::hooks::GraphHooks;
use crate::paths::{join_path, ParsedPath};
use crate::runtime::{DirEntry, EntryKind, RuntimeResult};

/// Outcome of looking up a resolved path in one directory listing.
enum Choice {
    Module(ModulePath),
    Directory(String),
    Failed(String),
}

impl<H: GraphHooks> Traversal<H> {
    /// Route a relative edge to the module its resolved path names.
    pub(super) fn resolve_edge(&mut self, edge: Edge, resolved_path: String) -> Result<()> {
        match self.resolved_paths.get_mut(&resolved_path) {
            Some(CacheEntry::Done(Ok(module_path))) => {
                let module_path = module_path.clone();
                self.request_module(module_path, Some(edge))
            }
            Some(CacheEntry::Done(Err(message))) => {
                let message = message.clone();
                self.link_failure(edge, message)
            }
            Some(CacheEntry::Pending(waiters)) => {
                waiters.push(edge);
                Ok(())
            }
            None => {
                let directory = ParsedPath::parse(&resolved_path).dir;
                self.resolved_paths
                    .insert(resolved_path.clone(), CacheEntry::pending(edge));
                self.request_directory(directory, DirectoryWaiter::Resolve { resolved_path })
            }
        }
    }

    pub(super) fn request_directory(&mut self, path: String, waiter: DirectoryWaiter) -> Result<()> {
        match self.directories.get_mut(&path) {
            Some(CacheEntry::Done(listing)) => {
                let listing = listing.clone();
                self.deliver_directory(&path, listing, waiter)
            }
            Some(CacheEntry::Pending(waiters)) => {
                waiters.push(waiter);
                Ok(())
            }
            None => {
                trace!(directory = %path, "reading directory");
                self.directories.insert(path.clone(), CacheEntry::pending(waiter));
                self.spawn_read_directory(path);
                Ok(())
            }
        }
    }

    pub(super) fn on_directory_read(
        &mut self,
        path: String,
        entries: RuntimeResult<Vec<DirEntry>>,
    ) -> Result<()> {
        let listing: DirectoryListing = entries
            .map(|entries| Arc::new(entries.into_iter().map(|entry| (entry.name, entry.kind)).collect()))
            .map_err(|e| e.to_string());
        let waiters = match self.directories.insert(path.clone(), CacheEntry::Done(listing.clone())) {
            Some(CacheEntry::Pending(waiters)) => waiters,
            _ => return Err(consistency(format!("Directory `{path}` was read twice"))),
        };
        for waiter in waiters {
            self.deliver_directory(&path, listing.clone(), waiter)?;
        }
        Ok(())
    }

    fn deliver_directory(
        &mut self,
        directory: &str,
        listing: DirectoryListing,
        waiter: DirectoryWaiter,
    ) -> Result<()> {
        match waiter {
            DirectoryWaiter::Walk => self.walk_directory(directory, listing),
            DirectoryWaiter::Resolve { resolved_path } => {
                match self.choose_entry(directory, &listing, &resolved_path) {
                    Choice::Module(module_path) => self.finish_resolution(resolved_path, Ok(module_path)),
                    Choice::Directory(index_directory) => self.request_directory(
                        index_directory.clone(),
                        DirectoryWaiter::Index {
                            resolved_path,
                            directory: index_directory,
                        },
                    ),
                    Choice::Failed(message) => self.finish_resolution(resolved_path, Err(message)),
                }
            }
            DirectoryWaiter::Index {
                resolved_path,
                directory,
            } => {
                let outcome = match self.choose_index(&directory, &listing, &resolved_path) {
                    Choice::Module(module_path) => Ok(module_path),
                    Choice::Directory(_) => Err(format!(
                        "Chosen index module is a directory in `{directory}` for resolved path `{resolved_path}`"
                    )),
                    Choice::Failed(message) => Err(message),
                };
                self.finish_resolution(resolved_path, outcome)
            }
        }
    }

    fn choose_entry(&self, directory: &str, listing: &DirectoryListing, resolved_path: &str) -> Choice {
        let content = match listing {
            Ok(content) => content,
            Err(error) => {
                return Choice::Failed(format!(
                    "Cannot read directory `{directory}` for resolved path `{resolved_path}`: {error}"
                ));
            }
        };
        let parsed = ParsedPath::parse(resolved_path);
        let chosen = match self.hooks.choose_module(resolved_path, &parsed, content) {
            Ok(chosen) => chosen,
            Err(error) => return Choice::Failed(error.to_string()),
        };
        match content.get(&chosen) {
            Some(EntryKind::File) => Choice::Module(join_path(directory, &chosen)),
            Some(EntryKind::Directory) => Choice::Directory(join_path(directory, &chosen)),
            Some(EntryKind::Other) => Choice::Failed(format!(
                "Chosen module `{chosen}` in directory `{directory}` is not a file or directory for resolved path `{resolved_path}`"
            )),
            None => Choice::Failed(format!(
                "Chosen module `{chosen}` is not an entry of directory `{directory}` for resolved path `{resolved_path}`"
            )),
        }
    }

    fn choose_index(&self, directory: &str, listing: &DirectoryListing, resolved_path: &str) -> Choice {
        let content = match listing {
            Ok(content) => content,
            Err(error) => {
                return Choice::Failed(format!(
                    "Cannot read directory `{directory}` for resolved path `{resolved_path}`: {error}"
                ));
            }
        };
        let chosen = match self.hooks.choose_index_module(resolved_path, directory, content) {
            Ok(chosen) => chosen,
            Err(error) => return Choice::Failed(error.to_string()),
        };
        match content.get(&chosen) {
            Some(EntryKind::File) => Choice::Module(join_path(directory, &chosen)),
            _ => Choice::Failed(format!(
                "Chosen index module `{chosen}` is not a file in directory `{directory}` for resolved path `{resolved_path}`"
            )),
        }
    }

    fn finish_resolution(
        &mut self,
        resolved_path: String,
        outcome: std::result::Result<ModulePath, String>,
    ) -> Result<()> {
        trace!(%resolved_path, ?outcome, "resolved path");
        let waiters = match self
            .resolved_paths
            .insert(resolved_path.clone(), CacheEntry::Done(outcome.clone()))
        {
            Some(CacheEntry::Pending(waiters)) => waiters,
            _ => {
                return Err(consistency(format!(
                    "Resolved path `{resolved_path}` was resolved twice"
                )));
            }
        };
        for edge in waiters {
            match &outcome {
                Ok(module_path) => self.request_module(module_path.clone(), Some(edge))?,
                Err(message) => self.link_failure(edge, message.clone())?,
            }
        }
        Ok(())
    }
}
