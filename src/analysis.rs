use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::model::{Diagram, Edge};

pub const DEFAULT_MAX_PATH_DEPTH: usize = 10;
/// Longest cycle, in nodes, the cycle search follows.
pub const MAX_CYCLE_LENGTH: usize = 16;
pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub node_ids: Vec<String>,
    /// Neighbor hand-offs made while walking the component.
    pub edge_count: usize,
}

impl Component {
    pub fn size(&self) -> usize {
        self.node_ids.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeConnections {
    pub id: String,
    pub label: String,
    pub connections: usize,
    pub incoming: usize,
    pub outgoing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramSummary {
    pub name: String,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub nodes_by_shape: BTreeMap<String, usize>,
    pub tags_in_use: Vec<String>,
    pub connected_components: usize,
    pub most_connected_nodes: Vec<NodeConnections>,
    pub orphan_count: usize,
}

fn directed_adjacency(edges: &[Edge]) -> HashMap<&str, Vec<&str>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }
    adjacency
}

/// Undirected components, discovered breadth-first in node order.
/// Edges with a missing endpoint are ignored.
pub fn connected_components(diagram: &Diagram) -> Vec<Component> {
    let mut adjacency: HashMap<&str, Vec<&str>> = diagram
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), Vec::new()))
        .collect();

    for edge in &diagram.edges {
        let (s, t) = (edge.source.as_str(), edge.target.as_str());
        if !adjacency.contains_key(s) || !adjacency.contains_key(t) {
            continue;
        }
        for (from, to) in [(s, t), (t, s)] {
            if let Some(neighbors) = adjacency.get_mut(from) {
                if !neighbors.contains(&to) {
                    neighbors.push(to);
                }
            }
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut components = Vec::new();

    for node in &diagram.nodes {
        let start = node.id.as_str();
        if visited.contains(start) {
            continue;
        }

        let mut node_ids = Vec::new();
        let mut edge_count = 0;
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            node_ids.push(current.to_string());
            for &next in adjacency.get(current).into_iter().flatten() {
                if !visited.contains(next) {
                    queue.push_back(next);
                    edge_count += 1;
                }
            }
        }
        components.push(Component {
            node_ids,
            edge_count,
        });
    }

    components
}

/// Directed cycles, one per distinct member set, up to [`MAX_CYCLE_LENGTH`] nodes.
///
/// Each cycle lists its members in traversal order starting from the node
/// the search began at; the closing edge back to it is implied.
pub fn find_cycles(diagram: &Diagram) -> Vec<Vec<String>> {
    find_cycles_bounded(diagram, MAX_CYCLE_LENGTH)
}

/// Searches from each node in diagram order, stepping only into nodes ranked
/// after the start. A member set is therefore first met from its earliest
/// node, and each set is stored once.
pub fn find_cycles_bounded(diagram: &Diagram, max_len: usize) -> Vec<Vec<String>> {
    // Diagram nodes rank first, in order; ids only named by edges rank after them.
    let mut rank: HashMap<&str, usize> = HashMap::new();
    let mut ids: Vec<&str> = Vec::new();
    let named = diagram.nodes.iter().map(|n| n.id.as_str()).chain(
        diagram
            .edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()]),
    );
    for id in named {
        rank.entry(id).or_insert_with(|| {
            ids.push(id);
            ids.len() - 1
        });
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
    for edge in &diagram.edges {
        if let (Some(&s), Some(&t)) = (rank.get(edge.source.as_str()), rank.get(edge.target.as_str())) {
            adjacency[s].push(t);
        }
    }

    let mut search = CycleSearch {
        adjacency: &adjacency,
        max_len,
        path: Vec::with_capacity(max_len),
        members: vec![0; ids.len().div_ceil(64)],
        seen: HashSet::new(),
        found: Vec::new(),
    };
    for node in &diagram.nodes {
        let Some(&start) = rank.get(node.id.as_str()) else {
            continue;
        };
        search.enter(start);
        search.walk(start, start);
        search.leave(start);
    }

    search
        .found
        .into_iter()
        .map(|cycle| cycle.into_iter().map(|i| ids[i].to_string()).collect())
        .collect()
}

/// Depth-first cycle search state. `members` is a bitset over node ranks
/// mirroring `path`.
struct CycleSearch<'a> {
    adjacency: &'a [Vec<usize>],
    max_len: usize,
    path: Vec<usize>,
    members: Vec<u64>,
    seen: HashSet<Vec<u64>>,
    found: Vec<Vec<usize>>,
}

impl CycleSearch<'_> {
    fn enter(&mut self, node: usize) {
        self.path.push(node);
        self.members[node / 64] |= 1 << (node % 64);
    }

    fn leave(&mut self, node: usize) {
        self.path.pop();
        self.members[node / 64] &= !(1 << (node % 64));
    }

    fn on_path(&self, node: usize) -> bool {
        self.members[node / 64] & (1 << (node % 64)) != 0
    }

    fn walk(&mut self, start: usize, current: usize) {
        let adjacency = self.adjacency;
        for &next in &adjacency[current] {
            if next == start {
                if self.path.len() > 1 && !self.seen.contains(&self.members) {
                    self.seen.insert(self.members.clone());
                    self.found.push(self.path.clone());
                }
            } else if next > start && self.path.len() < self.max_len && !self.on_path(next) {
                self.enter(next);
                self.walk(start, next);
                self.leave(next);
            }
        }
    }
}

/// Every simple directed path from `source` to `target` with at most
/// `max_depth` nodes. A node reaches itself by the one-node path.
pub fn find_paths(diagram: &Diagram, source: &str, target: &str, max_depth: usize) -> Vec<Vec<String>> {
    let adjacency = directed_adjacency(&diagram.edges);
    let mut found: Vec<Vec<&str>> = Vec::new();
    let mut path = vec![source];
    walk_paths(&adjacency, target, source, &mut path, max_depth, &mut found);
    found
        .into_iter()
        .map(|p| p.into_iter().map(str::to_string).collect())
        .collect()
}

fn walk_paths<'a>(
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    target: &str,
    current: &'a str,
    path: &mut Vec<&'a str>,
    max_depth: usize,
    found: &mut Vec<Vec<&'a str>>,
) {
    if path.len() > max_depth {
        return;
    }
    if current == target {
        found.push(path.clone());
        return;
    }
    for &next in adjacency.get(current).into_iter().flatten() {
        if !path.contains(&next) {
            path.push(next);
            walk_paths(adjacency, target, next, path, max_depth, found);
            path.pop();
        }
    }
}

/// In/out degree per node, in node order.
pub fn node_connections(diagram: &Diagram) -> Vec<NodeConnections> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut connections: Vec<NodeConnections> = Vec::with_capacity(diagram.nodes.len());
    for node in &diagram.nodes {
        if slots.contains_key(node.id.as_str()) {
            continue;
        }
        slots.insert(&node.id, connections.len());
        connections.push(NodeConnections {
            id: node.id.clone(),
            label: node.label.clone(),
            connections: 0,
            incoming: 0,
            outgoing: 0,
        });
    }

    for edge in &diagram.edges {
        if let Some(&slot) = slots.get(edge.source.as_str()) {
            connections[slot].outgoing += 1;
        }
        if let Some(&slot) = slots.get(edge.target.as_str()) {
            connections[slot].incoming += 1;
        }
    }
    for c in &mut connections {
        c.connections = c.incoming + c.outgoing;
    }
    connections
}

pub fn summarize(diagram: &Diagram, top_n: usize) -> DiagramSummary {
    let mut nodes_by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut nodes_by_shape: BTreeMap<String, usize> = BTreeMap::new();
    let mut tags: BTreeSet<&str> = BTreeSet::new();
    for node in &diagram.nodes {
        *nodes_by_type.entry(node.node_type.clone()).or_default() += 1;
        *nodes_by_shape.entry(node.shape.as_str().to_string()).or_default() += 1;
        tags.extend(node.tags.iter().map(String::as_str));
    }

    let mut connections = node_connections(diagram);
    let orphan_count = connections.iter().filter(|c| c.connections == 0).count();
    connections.sort_by(|a, b| b.connections.cmp(&a.connections));
    let most_connected_nodes = connections
        .into_iter()
        .take(top_n)
        .filter(|c| c.connections > 0)
        .collect();

    DiagramSummary {
        name: diagram.name.clone(),
        total_nodes: diagram.nodes.len(),
        total_edges: diagram.edges.len(),
        nodes_by_type,
        nodes_by_shape,
        tags_in_use: tags.into_iter().map(str::to_string).collect(),
        connected_components: connected_components(diagram).len(),
        most_connected_nodes,
        orphan_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeShape};
    use pretty_assertions::assert_eq;

    fn diagram(ids: &[&str], edges: &[(&str, &str)]) -> Diagram {
        let mut d = Diagram::new("analysis");
        d.nodes = ids.iter().map(|id| Node::new(id.to_uppercase()).with_id(*id)).collect();
        d.edges = edges.iter().map(|(s, t)| Edge::new(*s, *t)).collect();
        d
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn components_split_on_missing_links() {
        let d = diagram(&["a", "b", "c", "d", "e"], &[("a", "b"), ("b", "c"), ("d", "ghost")]);
        let components = connected_components(&d);
        assert_eq!(components.len(), 3);
        assert_eq!(components[0].node_ids, strings(&["a", "b", "c"]));
        assert_eq!(components[0].edge_count, 2);
        assert_eq!(components[1].node_ids, strings(&["d"]));
        assert_eq!(components[1].edge_count, 0);
        assert_eq!(components[2].size(), 1);
    }

    #[test]
    fn triangle_counts_every_hand_off() {
        let d = diagram(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let components = connected_components(&d);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].edge_count, 3);
    }

    #[test]
    fn empty_diagram_has_no_components() {
        assert!(connected_components(&Diagram::new("empty")).is_empty());
    }

    #[test]
    fn triangle_cycle_reported_once() {
        let d = diagram(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(find_cycles(&d), vec![strings(&["a", "b", "c"])]);
    }

    #[test]
    fn self_loop_is_not_a_cycle() {
        let d = diagram(&["a"], &[("a", "a")]);
        assert!(find_cycles(&d).is_empty());
    }

    #[test]
    fn two_node_loop_and_acyclic_branch() {
        let d = diagram(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("b", "c")]);
        assert_eq!(find_cycles(&d), vec![strings(&["a", "b"])]);
    }

    #[test]
    fn cycle_search_respects_length_bound() {
        let d = diagram(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "a")]);
        assert!(find_cycles_bounded(&d, 3).is_empty());
        assert_eq!(find_cycles_bounded(&d, 4).len(), 1);
    }

    #[test]
    fn cycle_listed_from_earliest_member() {
        let d = diagram(&["a", "b", "c"], &[("c", "a"), ("b", "c"), ("a", "b")]);
        assert_eq!(find_cycles(&d), vec![strings(&["a", "b", "c"])]);
    }

    #[test]
    fn cycle_may_pass_through_unknown_endpoint() {
        let d = diagram(&["a"], &[("a", "ghost"), ("ghost", "a")]);
        assert_eq!(find_cycles(&d), vec![strings(&["a", "ghost"])]);
    }

    #[test]
    fn diamond_has_two_paths() {
        let d = diagram(
            &["s", "l", "r", "t"],
            &[("s", "l"), ("s", "r"), ("l", "t"), ("r", "t")],
        );
        assert_eq!(
            find_paths(&d, "s", "t", DEFAULT_MAX_PATH_DEPTH),
            vec![strings(&["s", "l", "t"]), strings(&["s", "r", "t"])]
        );
    }

    #[test]
    fn path_to_self_is_single_node() {
        let d = diagram(&["a"], &[]);
        assert_eq!(find_paths(&d, "a", "a", DEFAULT_MAX_PATH_DEPTH), vec![strings(&["a"])]);
    }

    #[test]
    fn path_depth_is_bounded() {
        let d = diagram(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        assert!(find_paths(&d, "a", "c", 2).is_empty());
        assert_eq!(find_paths(&d, "a", "c", 3).len(), 1);
        assert!(find_paths(&d, "c", "a", 10).is_empty());
    }

    #[test]
    fn connections_count_both_directions() {
        let d = diagram(&["a", "b"], &[("a", "b"), ("a", "a")]);
        let c = node_connections(&d);
        assert_eq!((c[0].outgoing, c[0].incoming, c[0].connections), (2, 1, 3));
        assert_eq!((c[1].outgoing, c[1].incoming, c[1].connections), (0, 1, 1));
    }

    #[test]
    fn summary_counts_and_ranks() {
        let mut d = diagram(&["hub", "a", "b", "lonely"], &[("hub", "a"), ("hub", "b"), ("a", "b")]);
        d.nodes[0].node_type = "service".into();
        d.nodes[1].tags = vec!["z".into(), "api".into()];
        d.nodes[2].tags = vec!["api".into()];
        d.nodes[3].shape = NodeShape::Ellipse;

        let summary = summarize(&d, 2);
        assert_eq!(summary.total_nodes, 4);
        assert_eq!(summary.total_edges, 3);
        assert_eq!(summary.nodes_by_type.get("component"), Some(&3));
        assert_eq!(summary.nodes_by_type.get("service"), Some(&1));
        assert_eq!(summary.nodes_by_shape.get("ellipse"), Some(&1));
        assert_eq!(summary.tags_in_use, strings(&["api", "z"]));
        assert_eq!(summary.connected_components, 2);
        assert_eq!(summary.orphan_count, 1);
        let ranked: Vec<&str> = summary.most_connected_nodes.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ranked, vec!["hub", "a"], "ties keep node order");
    }

    #[test]
    fn summary_excludes_unconnected_from_ranking() {
        let d = diagram(&["a", "b"], &[]);
        let summary = summarize(&d, DEFAULT_TOP_N);
        assert!(summary.most_connected_nodes.is_empty());
        assert_eq!(summary.orphan_count, 2);
    }
}
