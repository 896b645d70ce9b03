use tracing::warn;

use super::{DirectoryListing, DirectoryWaiter, Traversal};
use crate::error::Result;
use crate::hooks::GraphHooks;
use crate::paths::join_path;
use crate::runtime::EntryKind;

impl<H: GraphHooks> Traversal<H> {
    /// Seed every module under `directory`, descending into subdirectories
    /// the hooks do not skip.
    pub(super) fn walk_directory(&mut self, directory: &str, listing: DirectoryListing) -> Result<()> {
        let content = match listing {
            Ok(content) => content,
            Err(error) => {
                warn!(%directory, %error, "cannot walk directory");
                self.graph
                    .errors
                    .push(format!("Cannot read directory `{directory}`: {error}"));
                return Ok(());
            }
        };

        for (name, kind) in content.iter() {
            let path = join_path(directory, name);
            match kind {
                EntryKind::Directory if !self.hooks.skip_directory(&path, name) => {
                    self.request_directory(path, DirectoryWaiter::Walk)?;
                }
                EntryKind::File if !self.hooks.skip_module(&path, name) => {
                    self.request_module(path, None)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}
