//! # Dependency Graph
//!
//! Module → dependencies, stored as integer nodes with adjacency lists.
//! Cycle detection is an iterative depth-first search with an explicit
//! per-node mark array, so deep dependency chains cannot overflow the stack
//! and the traversal state is available to build a diagnostic.

use std::collections::HashMap;

use cfx_types::{ModuleDescriptor, FRAMEWORK_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Directed graph of module dependencies.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every descriptor except the framework's own
    /// section. Disabled modules are included: a cycle through a disabled
    /// module is still a configuration error.
    pub fn from_descriptors(descriptors: &[ModuleDescriptor]) -> Self {
        let mut graph = Self::new();
        for desc in descriptors.iter().filter(|d| d.name != FRAMEWORK_NAME) {
            graph.add_module(&desc.name, &desc.dependencies);
        }
        graph
    }

    /// Add `name` with edges to each of `dependencies`.
    ///
    /// Dependencies not yet known become nodes without outgoing edges.
    pub fn add_module(&mut self, name: &str, dependencies: &[String]) {
        let node = self.intern(name);
        for dep in dependencies {
            let target = self.intern(dep);
            self.edges[node].push(target);
        }
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        self.edges.push(Vec::new());
        idx
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Direct dependencies of `name`, if the node exists.
    pub fn dependencies(&self, name: &str) -> Option<Vec<&str>> {
        let idx = *self.index.get(name)?;
        Some(
            self.edges[idx]
                .iter()
                .map(|&dep| self.names[dep].as_str())
                .collect(),
        )
    }

    /// Find a directed cycle reachable from any node.
    ///
    /// Returns the cycle in path order, closed on the repeated node
    /// (`["X", "Y", "X"]`; a self-loop is `["M", "M"]`).
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut mark = vec![Mark::Unvisited; self.names.len()];
        // (node, index of the next edge to explore)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..self.names.len() {
            if mark[root] != Mark::Unvisited {
                continue;
            }
            mark[root] = Mark::OnPath;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let Some(&next) = self.edges[node].get(frame.1) else {
                    mark[node] = Mark::Done;
                    stack.pop();
                    continue;
                };
                frame.1 += 1;

                match mark[next] {
                    Mark::OnPath => return Some(self.cycle_from(&stack, next)),
                    Mark::Unvisited => {
                        mark[next] = Mark::OnPath;
                        stack.push((next, 0));
                    }
                    Mark::Done => {}
                }
            }
        }

        None
    }

    /// True iff the graph contains a directed cycle.
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    fn cycle_from(&self, stack: &[(usize, usize)], repeated: usize) -> Vec<String> {
        let start = stack
            .iter()
            .position(|&(node, _)| node == repeated)
            .unwrap_or(0);
        stack[start..]
            .iter()
            .map(|&(node, _)| self.names[node].clone())
            .chain(std::iter::once(self.names[repeated].clone()))
            .collect()
    }
}

/// Convenience wrapper: does this set of descriptors contain a cycle?
pub fn detect_cycle(descriptors: &[ModuleDescriptor]) -> Option<Vec<String>> {
    DependencyGraph::from_descriptors(descriptors).find_cycle()
}
