use std::collections::VecDeque;

use tracing::{trace, warn};

use super::{consistency, ModuleState, Traversal};
use crate::error::Result;
use crate::hooks::GraphHooks;

/// How a completion that finds nothing left to complete is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompletionMode {
    /// Regular traversal: record an error on the module.
    Strict,
    /// Cycle breaking: modules already released are skipped silently.
    Breaker,
}

const OVER_COMPLETED: &str =
    "Unable to complete a module dependency because all of its dependencies have already been completed";

impl<H: GraphHooks> Traversal<H> {
    /// Record that one dependency of `path` completed, propagating to every
    /// dependent whose last dependency this was.
    pub(super) fn complete_dependency(&mut self, path: &str, mode: CompletionMode) -> Result<()> {
        let mut queue = VecDeque::from([path.to_string()]);
        while let Some(path) = queue.pop_front() {
            match self.modules.get_mut(&path) {
                Some(ModuleState::Loading {
                    deferred_completions,
                    ..
                }) => {
                    *deferred_completions += 1;
                    continue;
                }
                Some(ModuleState::Loaded) => {}
                None => {
                    return Err(consistency(format!(
                        "Cannot complete dependency of unknown module `{path}`"
                    )));
                }
            }

            let module = self.graph.modules.get_mut(&path).ok_or_else(|| {
                consistency(format!("Cannot complete dependency of unread module `{path}`"))
            })?;
            if module.uncompleted_dependencies_count == 0 {
                if mode == CompletionMode::Strict {
                    warn!(module = %path, "dependency completed more than once");
                    module.errors.add(0, OVER_COMPLETED);
                }
                continue;
            }

            module.uncompleted_dependencies_count -= 1;
            if module.uncompleted_dependencies_count > 0 {
                continue;
            }

            for (parent, raw_paths) in module
                .imported_by_modules
                .iter()
                .chain(module.reexported_by_modules.iter())
            {
                queue.extend(raw_paths.iter().map(|_| parent.clone()));
            }
            trace!(module = %path, "all dependencies completed");
            self.spawn_dependencies_added(&path)?;
        }
        Ok(())
    }
}
