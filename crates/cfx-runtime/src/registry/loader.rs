//! # Loader
//!
//! Decides the order modules are constructed in. Walks descriptors in
//! declaration order and loads each module's dependencies before the module
//! itself. The dependency graph is checked for cycles first, so the recursion
//! always terminates.

use std::collections::HashMap;

use cfx_types::ModuleDescriptor;
use tracing::{debug, error, info, warn};

use super::graph::DependencyGraph;
use crate::error::StartupError;

pub struct Loader<'a> {
    descriptors: &'a [ModuleDescriptor],
    index: HashMap<&'a str, usize>,
    loaded: Vec<bool>,
    order: Vec<String>,
}

impl<'a> Loader<'a> {
    pub fn new(descriptors: &'a [ModuleDescriptor]) -> Self {
        let index = descriptors
            .iter()
            .enumerate()
            .map(|(idx, desc)| (desc.name.as_str(), idx))
            .rev()
            .collect();
        Self {
            descriptors,
            index,
            loaded: vec![false; descriptors.len()],
            order: Vec::new(),
        }
    }

    /// Load every enabled module, calling `construct` once per module in
    /// dependency order. Returns the load order.
    ///
    /// # Errors
    ///
    /// - [`StartupError::DependencyCycle`] before anything is constructed.
    /// - [`StartupError::DuplicateModule`] if two descriptors share a name.
    /// - Whatever `construct` returns; loading stops at the first failure.
    pub fn load_all<F>(mut self, mut construct: F) -> Result<Vec<String>, StartupError>
    where
        F: FnMut(&ModuleDescriptor) -> Result<(), StartupError>,
    {
        if self.index.len() != self.descriptors.len() {
            let mut seen = HashMap::new();
            for desc in self.descriptors {
                if seen.insert(desc.name.as_str(), ()).is_some() {
                    return Err(StartupError::DuplicateModule(desc.name.clone()));
                }
            }
        }

        if let Some(cycle) = DependencyGraph::from_descriptors(self.descriptors).find_cycle() {
            error!(cycle = %cycle.join(" -> "), "Circular dependency; no module loaded");
            return Err(StartupError::DependencyCycle { cycle });
        }

        for idx in 0..self.descriptors.len() {
            self.load_module(idx, &mut construct)?;
        }

        info!(modules = self.order.len(), order = ?self.order, "All modules loaded");
        Ok(self.order)
    }

    fn load_module<F>(&mut self, idx: usize, construct: &mut F) -> Result<(), StartupError>
    where
        F: FnMut(&ModuleDescriptor) -> Result<(), StartupError>,
    {
        let descriptors = self.descriptors;
        let desc = &descriptors[idx];

        if self.loaded[idx] {
            return Ok(());
        }
        if !desc.enabled {
            debug!(module = %desc.name, "Module disabled; skipped");
            return Ok(());
        }

        for dep in &desc.dependencies {
            match self.index.get(dep.as_str()).copied() {
                Some(dep_idx) => {
                    if !descriptors[dep_idx].enabled {
                        warn!(
                            module = %desc.name,
                            dependency = %dep,
                            "Dependency is disabled; CBTs addressed to it will fail"
                        );
                    }
                    self.load_module(dep_idx, construct)?;
                }
                None => warn!(
                    module = %desc.name,
                    dependency = %dep,
                    "Dependency has no configuration section; skipped"
                ),
            }
        }

        construct(desc)?;
        self.loaded[idx] = true;
        self.order.push(desc.name.clone());
        debug!(module = %desc.name, position = self.order.len(), "Module loaded");
        Ok(())
    }
}
