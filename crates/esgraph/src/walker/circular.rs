use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{consistency, CompletionMode, ModuleState, Traversal};
use crate::error::Result;
use crate::graph::ModulePath;
use crate::hooks::GraphHooks;

impl<H: GraphHooks> Traversal<H> {
    /// Release modules still waiting on each other once nothing is in flight.
    ///
    /// Repeatedly takes the stuck module with the fewest pending dependencies,
    /// follows stuck dependencies from it until a module repeats, records the
    /// cycle and releases the weakest module in it.
    pub(super) fn break_cycles(&mut self) -> Result<()> {
        if let Some((path, _)) = self
            .modules
            .iter()
            .find(|(_, state)| matches!(state, ModuleState::Loading { .. }))
        {
            return Err(consistency(format!(
                "Module `{path}` is still loading after all tasks settled"
            )));
        }

        loop {
            let stuck = self.stuck_modules();
            let Some(start) = stuck
                .iter()
                .min_by_key(|(_, count)| **count)
                .map(|(path, _)| path.clone())
            else {
                return Ok(());
            };

            let cycle = self.find_cycle(&start, &stuck)?;
            let released = cycle
                .iter()
                .min_by_key(|path| stuck.get(*path).copied().unwrap_or(usize::MAX))
                .cloned()
                .ok_or_else(|| consistency(format!("Empty circular dependency chain from `{start}`")))?;
            debug!(?cycle, %released, "breaking circular dependency");
            self.graph.circular_dependencies.push(cycle);

            let module = self
                .graph
                .modules
                .get_mut(&released)
                .ok_or_else(|| consistency(format!("Cannot find module `{released}` to release")))?;
            module.uncompleted_dependencies_count = 1;
            self.complete_dependency(&released, CompletionMode::Breaker)?;
        }
    }

    fn stuck_modules(&self) -> BTreeMap<ModulePath, usize> {
        self.graph
            .modules
            .iter()
            .filter(|(_, module)| module.uncompleted_dependencies_count > 0)
            .map(|(path, module)| (path.clone(), module.uncompleted_dependencies_count))
            .collect()
    }

    /// Walk stuck dependencies from `start` (imports before re-exports) until
    /// a module repeats; return the loop from its first occurrence.
    fn find_cycle(
        &self,
        start: &str,
        stuck: &BTreeMap<ModulePath, usize>,
    ) -> Result<Vec<ModulePath>> {
        let mut chain = vec![start.to_string()];
        let mut seen: FxHashMap<ModulePath, usize> = FxHashMap::default();
        seen.insert(start.to_string(), 0);

        loop {
            let current = chain.last().map(String::as_str).unwrap_or(start);
            let module = self
                .graph
                .modules
                .get(current)
                .ok_or_else(|| consistency(format!("Cannot find stuck module `{current}`")))?;
            let next = module
                .imported_modules
                .keys()
                .find(|path| stuck.contains_key(*path))
                .or_else(|| module.reexported_modules.keys().find(|path| stuck.contains_key(*path)))
                .ok_or_else(|| {
                    consistency(format!(
                        "Cannot find next module in circular dependencies chain for module `{current}`"
                    ))
                })?
                .clone();

            if let Some(&index) = seen.get(&next) {
                return Ok(chain.split_off(index));
            }
            seen.insert(next.clone(), chain.len());
            chain.push(next);
        }
    }
}
