//! Dependency graph for install ordering.
//!
//! Ordered maps keep every traversal deterministic: two resolutions of
//! the same declarations always produce the same plan.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{KilnError, Result};

/// Represents the dependency relationships between recipes.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Map of recipe name to its direct dependencies.
    dependencies: BTreeMap<String, BTreeSet<String>>,
    /// Map of recipe name to recipes that depend on it.
    dependents: BTreeMap<String, BTreeSet<String>>,
    /// All names in the graph.
    nodes: BTreeSet<String>,
}

impl DependencyGraph {
    /// Create a new dependency graph builder.
    pub fn builder() -> DependencyGraphBuilder {
        DependencyGraphBuilder::new()
    }

    /// Get the direct dependencies of a node.
    pub fn dependencies_of(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.dependencies.get(name)
    }

    /// Get nodes that depend on the given node.
    pub fn dependents_of(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.dependents.get(name)
    }

    /// Check if a node exists in the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }

    /// Get the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns nodes in topological order (dependencies before dependents).
    ///
    /// Ties are broken by name. Returns an error if a cycle is detected.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(KilnError::CyclicDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let mut in_degree: BTreeMap<&str, usize> = self
            .nodes
            .iter()
            .map(|n| {
                (
                    n.as_str(),
                    self.dependencies.get(n).map_or(0, |d| d.len()),
                )
            })
            .collect();

        // Start with nodes that have no dependencies
        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut result = Vec::with_capacity(self.nodes.len());

        while let Some(name) = queue.pop_front() {
            result.push(name.to_string());

            if let Some(dependents) = self.dependents.get(name) {
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(dependent);
                        }
                    }
                }
            }
        }

        Ok(result)
    }

    /// Find a cycle in the graph, returning the path if one exists.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            Visiting,
            Visited,
        }

        let mut state: BTreeMap<&str, State> = self
            .nodes
            .iter()
            .map(|s| (s.as_str(), State::Unvisited))
            .collect();

        let mut path: Vec<String> = Vec::new();

        fn dfs<'a>(
            node: &'a str,
            graph: &'a DependencyGraph,
            state: &mut BTreeMap<&'a str, State>,
            path: &mut Vec<String>,
        ) -> Option<Vec<String>> {
            state.insert(node, State::Visiting);
            path.push(node.to_string());

            if let Some(deps) = graph.dependencies.get(node) {
                for dep in deps {
                    match state.get(dep.as_str()) {
                        Some(State::Visiting) => {
                            let start = path.iter().position(|s| s == dep).unwrap_or(0);
                            let mut cycle: Vec<String> = path[start..].to_vec();
                            cycle.push(dep.clone());
                            return Some(cycle);
                        }
                        Some(State::Unvisited) | None => {
                            if let Some(cycle) = dfs(dep, graph, state, path) {
                                return Some(cycle);
                            }
                        }
                        Some(State::Visited) => {}
                    }
                }
            }

            path.pop();
            state.insert(node, State::Visited);
            None
        }

        for node in &self.nodes {
            if state.get(node.as_str()) == Some(&State::Unvisited) {
                if let Some(cycle) = dfs(node, self, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }
}

/// Builder for constructing a DependencyGraph.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraphBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with its dependencies.
    pub fn add_node(mut self, name: impl Into<String>, depends_on: Vec<String>) -> Self {
        self.insert(name, depends_on);
        self
    }

    /// Add a node in place. Repeated calls merge the dependency sets.
    pub fn insert(&mut self, name: impl Into<String>, depends_on: Vec<String>) {
        self.dependencies
            .entry(name.into())
            .or_default()
            .extend(depends_on);
    }

    /// Build the dependency graph.
    ///
    /// Returns an error if any dependency references a node that was
    /// never added.
    pub fn build(self) -> Result<DependencyGraph> {
        let nodes: BTreeSet<String> = self.dependencies.keys().cloned().collect();

        let mut dependents: BTreeMap<String, BTreeSet<String>> = nodes
            .iter()
            .map(|n| (n.clone(), BTreeSet::new()))
            .collect();

        for (name, deps) in &self.dependencies {
            for dep in deps {
                match dependents.get_mut(dep) {
                    Some(set) => {
                        set.insert(name.clone());
                    }
                    None => {
                        return Err(KilnError::UnknownDependency {
                            dependent: name.clone(),
                            dependency: dep.clone(),
                        })
                    }
                }
            }
        }

        Ok(DependencyGraph {
            dependencies: self.dependencies,
            dependents,
            nodes,
        })
    }
}
