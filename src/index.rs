use std::collections::{HashMap, HashSet};

use crate::model::{Diagram, Edge, Node};

/// Lookup tables kept alongside a diagram's node and edge vectors.
///
/// Positions map ids to their slot in `Diagram::nodes` / `Diagram::edges`;
/// the tag, type and incident-edge tables map to id sets. Empty sets are
/// dropped so a key is present only while something is filed under it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphIndex {
    node_pos: HashMap<String, usize>,
    edge_pos: HashMap<String, usize>,
    by_tag: HashMap<String, HashSet<String>>,
    by_type: HashMap<String, HashSet<String>>,
    edges_by_node: HashMap<String, HashSet<String>>,
}

fn file(table: &mut HashMap<String, HashSet<String>>, key: &str, id: &str) {
    table
        .entry(key.to_string())
        .or_default()
        .insert(id.to_string());
}

fn unfile(table: &mut HashMap<String, HashSet<String>>, key: &str, id: &str) {
    if let Some(ids) = table.get_mut(key) {
        ids.remove(id);
        if ids.is_empty() {
            table.remove(key);
        }
    }
}

impl GraphIndex {
    pub fn build(diagram: &Diagram) -> Self {
        let mut index = GraphIndex::default();
        index.rebuild(diagram);
        index
    }

    pub fn rebuild(&mut self, diagram: &Diagram) {
        self.clear();
        for (pos, node) in diagram.nodes.iter().enumerate() {
            self.index_node(node, pos);
        }
        for (pos, edge) in diagram.edges.iter().enumerate() {
            self.index_edge(edge, pos);
        }
    }

    pub fn clear(&mut self) {
        self.node_pos.clear();
        self.edge_pos.clear();
        self.by_tag.clear();
        self.by_type.clear();
        self.edges_by_node.clear();
    }

    pub fn index_node(&mut self, node: &Node, pos: usize) {
        self.node_pos.insert(node.id.clone(), pos);
        for tag in &node.tags {
            file(&mut self.by_tag, tag, &node.id);
        }
        file(&mut self.by_type, &node.node_type, &node.id);
    }

    pub fn unindex_node(&mut self, node: &Node) {
        self.node_pos.remove(&node.id);
        for tag in &node.tags {
            unfile(&mut self.by_tag, tag, &node.id);
        }
        unfile(&mut self.by_type, &node.node_type, &node.id);
    }

    /// Moves `id` between tag and type entries for exactly what changed.
    pub fn migrate_node(
        &mut self,
        id: &str,
        old_tags: &[String],
        old_type: &str,
        new_tags: &[String],
        new_type: &str,
    ) {
        for tag in old_tags.iter().filter(|t| !new_tags.contains(t)) {
            unfile(&mut self.by_tag, tag, id);
        }
        for tag in new_tags.iter().filter(|t| !old_tags.contains(t)) {
            file(&mut self.by_tag, tag, id);
        }
        if old_type != new_type {
            unfile(&mut self.by_type, old_type, id);
            file(&mut self.by_type, new_type, id);
        }
    }

    pub fn index_edge(&mut self, edge: &Edge, pos: usize) {
        self.edge_pos.insert(edge.id.clone(), pos);
        file(&mut self.edges_by_node, &edge.source, &edge.id);
        file(&mut self.edges_by_node, &edge.target, &edge.id);
    }

    pub fn unindex_edge(&mut self, edge: &Edge) {
        self.edge_pos.remove(&edge.id);
        unfile(&mut self.edges_by_node, &edge.source, &edge.id);
        unfile(&mut self.edges_by_node, &edge.target, &edge.id);
    }

    /// Re-files slots from `start` on after a removal shifted the vector.
    pub fn reposition_nodes(&mut self, nodes: &[Node], start: usize) {
        for (pos, node) in nodes.iter().enumerate().skip(start) {
            self.node_pos.insert(node.id.clone(), pos);
        }
    }

    pub fn reposition_edges(&mut self, edges: &[Edge], start: usize) {
        for (pos, edge) in edges.iter().enumerate().skip(start) {
            self.edge_pos.insert(edge.id.clone(), pos);
        }
    }

    pub fn node_position(&self, id: &str) -> Option<usize> {
        self.node_pos.get(id).copied()
    }

    pub fn edge_position(&self, id: &str) -> Option<usize> {
        self.edge_pos.get(id).copied()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_pos.contains_key(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_pos.contains_key(id)
    }

    pub fn tagged(&self, tag: &str) -> Option<&HashSet<String>> {
        self.by_tag.get(tag)
    }

    pub fn typed(&self, node_type: &str) -> Option<&HashSet<String>> {
        self.by_type.get(node_type)
    }

    pub fn incident(&self, node_id: &str) -> Option<&HashSet<String>> {
        self.edges_by_node.get(node_id)
    }

    /// Node positions for `ids`, sorted into diagram order.
    pub fn node_positions<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> Vec<usize> {
        let mut positions: Vec<usize> = ids
            .into_iter()
            .filter_map(|id| self.node_position(id))
            .collect();
        positions.sort_unstable();
        positions
    }

    pub fn edge_positions<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> Vec<usize> {
        let mut positions: Vec<usize> = ids
            .into_iter()
            .filter_map(|id| self.edge_position(id))
            .collect();
        positions.sort_unstable();
        positions
    }
}
