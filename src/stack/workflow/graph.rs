//! Dependency graph derived from node and edge lists

use std::collections::{BTreeSet, HashMap, HashSet};

use super::types::{Edge, Node};

/// Dependencies and dependents of one node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphEntry {
    pub dependencies: BTreeSet<String>,
    pub dependents: BTreeSet<String>,
}

/// Per-node dependency structure, built once per run
#[derive(Debug, Clone, Default)]
pub struct ExecutionGraph {
    entries: HashMap<String, GraphEntry>,
}

impl ExecutionGraph {
    /// Build the graph. Edges with an unknown endpoint are skipped; the
    /// validator reports them before execution.
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut entries: HashMap<String, GraphEntry> = nodes
            .iter()
            .map(|n| (n.id.clone(), GraphEntry::default()))
            .collect();

        for edge in edges {
            if !entries.contains_key(&edge.source) || !entries.contains_key(&edge.target) {
                log::debug!(
                    "Skipping edge {} -> {}: unknown endpoint",
                    edge.source,
                    edge.target
                );
                continue;
            }
            if let Some(source) = entries.get_mut(&edge.source) {
                source.dependents.insert(edge.target.clone());
            }
            if let Some(target) = entries.get_mut(&edge.target) {
                target.dependencies.insert(edge.source.clone());
            }
        }

        Self { entries }
    }

    pub fn entry(&self, node_id: &str) -> Option<&GraphEntry> {
        self.entries.get(node_id)
    }

    pub fn dependencies(&self, node_id: &str) -> impl Iterator<Item = &str> {
        self.entries
            .get(node_id)
            .into_iter()
            .flat_map(|e| e.dependencies.iter().map(String::as_str))
    }

    pub fn dependents(&self, node_id: &str) -> impl Iterator<Item = &str> {
        self.entries
            .get(node_id)
            .into_iter()
            .flat_map(|e| e.dependents.iter().map(String::as_str))
    }

    /// Check if all of a node's dependencies have executed
    pub fn is_ready(&self, node_id: &str, executed: &HashSet<String>) -> bool {
        self.dependencies(node_id).all(|d| executed.contains(d))
    }

    /// Nodes not yet executed whose dependencies have all executed, in declaration order
    pub fn ready_nodes<'a>(&self, nodes: &'a [Node], executed: &HashSet<String>) -> Vec<&'a Node> {
        nodes
            .iter()
            .filter(|n| !executed.contains(&n.id))
            .filter(|n| self.is_ready(&n.id, executed))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
