// Dependency graph collection
//
// Starting from seed entities, discovers every reachable entity exactly
// once (depth-first, LIFO stack) and groups the results by module. Each
// module records which entities it needs from other modules.

use crate::error::Result;
use crate::extract::Extractor;
use crate::model::{CollectedModule, EntityHandle};
use crate::modulepath::ModulePath;
use crate::source::SourceModel;
use std::collections::BTreeMap;
use tracing::debug;

/// Accumulates extracted entities across one or more `collect` calls
pub struct ModelsCollector<'s, S: SourceModel + ?Sized> {
    source: &'s S,
    extractor: Extractor,
    /// Indexed by handle
    visited: Vec<bool>,
    pending: Vec<EntityHandle>,
    modules: BTreeMap<ModulePath, CollectedModule>,
    extractions: usize,
}

impl<'s, S: SourceModel + ?Sized> ModelsCollector<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self {
            source,
            extractor: Extractor::new(),
            visited: vec![false; source.len()],
            pending: Vec::new(),
            modules: BTreeMap::new(),
            extractions: 0,
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Collect everything reachable from `seed` into the module map
    pub fn collect(&mut self, seed: EntityHandle) -> Result<()> {
        self.pending.push(seed);

        while let Some(handle) = self.pending.pop() {
            if self.is_visited(handle) {
                continue;
            }

            // A failed run leaves nothing queued and the failing entity unvisited
            let extracted = match self.extractor.extract(self.source, handle) {
                Ok(extracted) => extracted,
                Err(e) => {
                    self.pending.clear();
                    return Err(e);
                }
            };
            self.mark_visited(handle);
            self.extractions += 1;

            let module_path = extracted.entity.module_path.clone();
            let module = self
                .modules
                .entry(module_path.clone())
                .or_insert_with(|| CollectedModule::new(module_path.clone()));

            for dep in &extracted.dependencies {
                if dep.entity.module_path != module_path {
                    module.cross_imports.insert(dep.entity.clone());
                }
                debug!(from = %extracted.entity, to = %dep.entity, "queue dependency");
                self.pending.push(dep.handle);
            }
            module.entities.push(extracted);
        }

        Ok(())
    }

    /// Collect from several seeds in order
    pub fn collect_all(&mut self, seeds: impl IntoIterator<Item = EntityHandle>) -> Result<()> {
        for seed in seeds {
            self.collect(seed)?;
        }
        Ok(())
    }

    pub fn modules(&self) -> &BTreeMap<ModulePath, CollectedModule> {
        &self.modules
    }

    /// Hand over the collected modules
    pub fn into_modules(self) -> BTreeMap<ModulePath, CollectedModule> {
        self.modules
    }

    /// Number of times the extractor ran
    pub fn extraction_count(&self) -> usize {
        self.extractions
    }

    pub fn entity_count(&self) -> usize {
        self.modules.values().map(|m| m.entities.len()).sum()
    }

    fn is_visited(&self, handle: EntityHandle) -> bool {
        self.visited.get(handle.0).copied().unwrap_or(false)
    }

    fn mark_visited(&mut self, handle: EntityHandle) {
        if handle.0 >= self.visited.len() {
            self.visited.resize(handle.0 + 1, false);
        }
        self.visited[handle.0] = true;
    }
}
