//! Dependency graph over a card's declared symbols.
//!
//! Nodes are declaration indices into the [`CardSpec`]; an edge `dep → sym`
//! exists only when `dep` is itself a declared symbol. Every other
//! `depends_on` entry is an external requirement, checked against the seeded
//! bindings at resolution time.

use crate::error::CyclicDependencyError;
use crate::spec::CardSpec;
use indexmap::IndexSet;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct SymbolGraph {
    names: Vec<String>,
    /// `dependents[i]`: nodes that depend on node `i`.
    dependents: Vec<Vec<usize>>,
    /// `dependencies[i]`: internal nodes node `i` depends on.
    dependencies: Vec<Vec<usize>>,
    external: IndexSet<String>,
}

impl SymbolGraph {
    pub fn build(spec: &CardSpec) -> Self {
        let count = spec.symbol_count();
        let mut names = Vec::with_capacity(count);
        let mut dependents = vec![Vec::new(); count];
        let mut dependencies = vec![Vec::new(); count];
        let mut external = IndexSet::new();

        for (index, symbol) in spec.symbols().enumerate() {
            names.push(symbol.name.clone());
            for dep in &symbol.depends_on {
                match spec.index_of(dep) {
                    Some(dep_index) => {
                        dependencies[index].push(dep_index);
                        dependents[dep_index].push(index);
                    }
                    None => {
                        external.insert(dep.clone());
                    }
                }
            }
        }

        Self {
            names,
            dependents,
            dependencies,
            external,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Dependency names that are not declared symbols, in first-use order.
    pub fn external_requirements(&self) -> impl Iterator<Item = &str> {
        self.external.iter().map(String::as_str)
    }

    /// Internal dependencies of `name`, in declaration order of the edge.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.position(name)
            .map(|index| self.dependencies[index].iter().map(|&dep| self.name(dep)).collect())
            .unwrap_or_default()
    }

    /// Symbols that directly depend on `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.position(name)
            .map(|index| self.dependents[index].iter().map(|&dep| self.name(dep)).collect())
            .unwrap_or_default()
    }

    /// Declaration indices in resolution order.
    ///
    /// Kahn's algorithm with an ordered ready set: whenever several symbols
    /// have all internal dependencies satisfied, the earliest declared one
    /// goes first. The result is fully determined by the spec.
    pub fn resolution_indices(&self) -> Result<Vec<usize>, CyclicDependencyError> {
        let mut remaining: Vec<usize> = self.dependencies.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = remaining
            .iter()
            .enumerate()
            .filter(|(_, pending)| **pending == 0)
            .map(|(index, _)| index)
            .collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &dependent in &self.dependents[next] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() == self.len() {
            Ok(order)
        } else {
            Err(self.cycle_error(&remaining))
        }
    }

    /// Symbol names in resolution order.
    pub fn resolution_order(&self) -> Result<Vec<&str>, CyclicDependencyError> {
        Ok(self
            .resolution_indices()?
            .into_iter()
            .map(|index| self.name(index))
            .collect())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    /// Extract one concrete cycle from the nodes Kahn's algorithm left behind.
    ///
    /// Every stuck node has at least one stuck dependency, so walking stuck
    /// dependencies from any stuck node must revisit a node.
    fn cycle_error(&self, remaining: &[usize]) -> CyclicDependencyError {
        let stuck = |index: usize| remaining[index] > 0;
        let Some(start) = (0..self.len()).find(|&index| stuck(index)) else {
            return CyclicDependencyError { members: Vec::new() };
        };

        let mut path = vec![start];
        let mut seen_at = vec![None; self.len()];
        seen_at[start] = Some(0);
        let mut current = start;
        let cycle_start = loop {
            let next = self.dependencies[current]
                .iter()
                .copied()
                .filter(|&dep| stuck(dep))
                .min()
                .unwrap_or(current);
            if let Some(position) = seen_at[next] {
                break position;
            }
            seen_at[next] = Some(path.len());
            path.push(next);
            current = next;
        };

        // Each member depends on the next; start from the earliest declared one.
        let mut cycle: Vec<usize> = path[cycle_start..].to_vec();
        if let Some(pivot) = cycle
            .iter()
            .enumerate()
            .min_by_key(|(_, index)| **index)
            .map(|(position, _)| position)
        {
            cycle.rotate_left(pivot);
        }

        CyclicDependencyError {
            members: cycle.into_iter().map(|index| self.names[index].clone()).collect(),
        }
    }
}
