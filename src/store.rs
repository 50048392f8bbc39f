use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{DiagramError, Result};
use crate::history::{DEFAULT_MAX_HISTORY, History, SnapshotInfo, SnapshotTable};
use crate::index::GraphIndex;
use crate::layout::{self, Alignment, Axis, Layout, PackOptions};
use crate::model::{
    Diagram, DiagramInfoUpdate, Edge, EdgeUpdate, NewEdge, Node, NodeUpdate, generate_node_id,
};
use crate::persist;
use crate::query::NodeQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Undo depth. Oldest states are evicted first.
    pub max_history: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// What save hooks are told about the diagram just written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveInfo {
    pub name: String,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Payload a transport forwards to subscribers after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub event: String,
    pub diagram_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreState<'a> {
    pub diagram: Option<&'a Diagram>,
    pub file_path: Option<&'a Path>,
    pub is_dirty: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

type ChangeHook = Box<dyn FnMut() -> anyhow::Result<()>>;
type SaveHook = Box<dyn FnMut(&Path, &SaveInfo) -> anyhow::Result<()>>;

/// Owns the active diagram, its indexes, undo history and named snapshots.
///
/// Every successful mutation records the prior state, marks the store dirty
/// and fires the change hooks. A failed mutation leaves all of that untouched.
pub struct DiagramStore {
    diagram: Option<Diagram>,
    file_path: Option<PathBuf>,
    dirty: bool,
    index: GraphIndex,
    history: History,
    snapshots: SnapshotTable,
    change_hooks: Vec<ChangeHook>,
    save_hooks: Vec<SaveHook>,
}

impl Default for DiagramStore {
    fn default() -> Self {
        DiagramStore::with_config(StoreConfig::default())
    }
}

impl fmt::Debug for DiagramStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramStore")
            .field("diagram", &self.diagram.as_ref().map(|d| &d.id))
            .field("file_path", &self.file_path)
            .field("dirty", &self.dirty)
            .field("undo_depth", &self.history.undo_depth())
            .field("redo_depth", &self.history.redo_depth())
            .field("snapshots", &self.snapshots.len())
            .field("change_hooks", &self.change_hooks.len())
            .field("save_hooks", &self.save_hooks.len())
            .finish()
    }
}

impl DiagramStore {
    pub fn new() -> Self {
        DiagramStore::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        DiagramStore {
            diagram: None,
            file_path: None,
            dirty: false,
            index: GraphIndex::default(),
            history: History::new(config.max_history),
            snapshots: SnapshotTable::default(),
            change_hooks: Vec::new(),
            save_hooks: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    pub fn on_change(&mut self, hook: impl FnMut() -> anyhow::Result<()> + 'static) {
        self.change_hooks.push(Box::new(hook));
    }

    pub fn on_save(&mut self, hook: impl FnMut(&Path, &SaveInfo) -> anyhow::Result<()> + 'static) {
        self.save_hooks.push(Box::new(hook));
    }

    fn notify_change(&mut self) {
        for hook in &mut self.change_hooks {
            if let Err(err) = hook() {
                warn!(error = %err, "change hook failed");
            }
        }
    }

    fn notify_save(&mut self, path: &Path) {
        let Some(diagram) = &self.diagram else {
            return;
        };
        let saved = SaveInfo {
            name: diagram.name.clone(),
            node_count: diagram.nodes.len(),
            edge_count: diagram.edges.len(),
        };
        for hook in &mut self.save_hooks {
            if let Err(err) = hook(path, &saved) {
                warn!(path = %path.display(), error = %err, "save hook failed");
            }
        }
    }

    pub fn change_event(&self) -> Option<ChangeEvent> {
        self.diagram.as_ref().map(|d| ChangeEvent {
            event: "diagram_updated".to_string(),
            diagram_id: d.id.clone(),
        })
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    pub fn diagram(&self) -> Option<&Diagram> {
        self.diagram.as_ref()
    }

    fn active(&self) -> Result<&Diagram> {
        self.diagram.as_ref().ok_or(DiagramError::NoActiveDiagram)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_undo(&self) -> bool {
        self.diagram.is_some() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.diagram.is_some() && self.history.can_redo()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn state(&self) -> StoreState<'_> {
        StoreState {
            diagram: self.diagram.as_ref(),
            file_path: self.file_path(),
            is_dirty: self.dirty,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Runs `op` against the active diagram and commits it on success.
    ///
    /// `op` must check its preconditions before changing anything: on `Err`
    /// the pre-mutation copy is dropped and nothing is recorded.
    fn mutate<T>(
        &mut self,
        name: &'static str,
        op: impl FnOnce(&mut Diagram, &mut GraphIndex) -> Result<T>,
    ) -> Result<T> {
        let diagram = self.diagram.as_mut().ok_or(DiagramError::NoActiveDiagram)?;
        let before = diagram.clone();
        let out = op(diagram, &mut self.index)?;
        self.history.record(before);
        self.dirty = true;
        debug!(
            op = name,
            diagram = %diagram.id,
            undo_depth = self.history.undo_depth(),
            "diagram mutated"
        );
        self.notify_change();
        Ok(out)
    }

    /// Installs `diagram` wholesale, rebuilding every index.
    fn install(&mut self, diagram: Diagram) {
        self.index.rebuild(&diagram);
        self.diagram = Some(diagram);
    }

    pub fn rebuild_indexes(&mut self) {
        match &self.diagram {
            Some(diagram) => self.index.rebuild(diagram),
            None => self.index.clear(),
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    pub fn new_diagram(&mut self, name: &str) -> &Diagram {
        self.reset_to(Diagram::new(name), None);
        info!(diagram_name = name, "new diagram");
        self.notify_change();
        self.current()
    }

    /// Replaces the active diagram without a backing file.
    pub fn load(&mut self, diagram: Diagram) -> &Diagram {
        info!(diagram = %diagram.id, nodes = diagram.nodes.len(), "diagram loaded");
        self.reset_to(diagram, None);
        self.notify_change();
        self.current()
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<&Diagram> {
        let path = path.as_ref();
        let diagram = persist::read_diagram(path)?;
        info!(
            path = %path.display(),
            nodes = diagram.nodes.len(),
            edges = diagram.edges.len(),
            "diagram opened"
        );
        self.reset_to(diagram, Some(path.to_path_buf()));
        self.notify_change();
        Ok(self.current())
    }

    fn reset_to(&mut self, diagram: Diagram, file_path: Option<PathBuf>) {
        self.install(diagram);
        self.file_path = file_path;
        self.history.clear();
        self.dirty = false;
    }

    /// The diagram just installed by a lifecycle operation.
    fn current(&mut self) -> &Diagram {
        self.diagram.get_or_insert_with(Diagram::default)
    }

    /// Writes to `path`, or to the remembered path when `None`.
    pub fn save(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let target = match (path, &self.file_path) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(remembered)) => remembered.clone(),
            (None, None) => {
                self.active()?;
                return Err(DiagramError::invalid(
                    "no file path given and the diagram has never been saved",
                ));
            }
        };
        let diagram = self.diagram.as_mut().ok_or(DiagramError::NoActiveDiagram)?;
        let mut stamped = diagram.clone();
        stamped.metadata.updated_at = Utc::now();
        persist::write_diagram(&target, &stamped)?;
        *diagram = stamped;
        info!(path = %target.display(), diagram = %diagram.id, "diagram saved");

        self.file_path = Some(target.clone());
        self.dirty = false;
        self.notify_save(&target);
        Ok(target)
    }

    pub fn update_info(&mut self, update: DiagramInfoUpdate) -> Result<&Diagram> {
        self.mutate("update_info", |diagram, _| {
            if let Some(name) = update.name {
                diagram.name = name;
            }
            if let Some(grid_size) = update.grid_size {
                diagram.metadata.grid_size = grid_size;
            }
            if let Some(show_grid) = update.show_grid {
                diagram.metadata.show_grid = show_grid;
            }
            Ok(())
        })?;
        self.active()
    }

    // -------------------------------------------------------------------------
    // Nodes
    // -------------------------------------------------------------------------

    /// Appends `node`, generating an id when it has none.
    pub fn add_node(&mut self, mut node: Node) -> Result<Node> {
        if node.id.is_empty() {
            node.id = generate_node_id();
        }
        if !node.has_recommended_type() {
            warn!(node = %node.id, node_type = %node.node_type, "node type is not one of the recommended types");
        }
        self.mutate("add_node", |diagram, index| {
            if index.contains_node(&node.id) {
                return Err(DiagramError::invalid(format!(
                    "node id `{}` already exists",
                    node.id
                )));
            }
            index.index_node(&node, diagram.nodes.len());
            diagram.nodes.push(node.clone());
            Ok(node)
        })
    }

    pub fn update_node(&mut self, id: &str, update: &NodeUpdate) -> Result<Node> {
        self.mutate("update_node", |diagram, index| {
            let pos = index
                .node_position(id)
                .ok_or_else(|| DiagramError::node_not_found(id))?;
            let node = &mut diagram.nodes[pos];
            let old_tags = node.tags.clone();
            let old_type = node.node_type.clone();
            update.apply(node);
            index.migrate_node(id, &old_tags, &old_type, &node.tags, &node.node_type);
            Ok(node.clone())
        })
    }

    /// Removes the node and every edge touching it. Returns false for an unknown id.
    pub fn delete_node(&mut self, id: &str) -> Result<bool> {
        self.active()?;
        if !self.index.contains_node(id) {
            return Ok(false);
        }
        self.mutate("delete_node", |diagram, index| {
            let pos = index
                .node_position(id)
                .ok_or_else(|| DiagramError::node_not_found(id))?;
            let node = diagram.nodes.remove(pos);
            index.unindex_node(&node);
            index.reposition_nodes(&diagram.nodes, pos);

            let before = diagram.edges.len();
            for edge in diagram.edges.iter().filter(|e| e.touches(id)) {
                index.unindex_edge(edge);
            }
            diagram.edges.retain(|e| !e.touches(id));
            if diagram.edges.len() != before {
                index.reposition_edges(&diagram.edges, 0);
                debug!(node = id, cascade = before - diagram.edges.len(), "removed incident edges");
            }
            Ok(true)
        })
    }

    pub fn node(&self, id: &str) -> Result<&Node> {
        let diagram = self.active()?;
        self.index
            .node_position(id)
            .and_then(|pos| diagram.nodes.get(pos))
            .ok_or_else(|| DiagramError::node_not_found(id))
    }

    pub fn nodes_by_tag(&self, tag: &str) -> Result<Vec<&Node>> {
        let diagram = self.active()?;
        Ok(self.collect_nodes(diagram, self.index.tagged(tag)))
    }

    pub fn nodes_by_type(&self, node_type: &str) -> Result<Vec<&Node>> {
        let diagram = self.active()?;
        Ok(self.collect_nodes(diagram, self.index.typed(node_type)))
    }

    fn collect_nodes<'a>(
        &self,
        diagram: &'a Diagram,
        ids: Option<&std::collections::HashSet<String>>,
    ) -> Vec<&'a Node> {
        ids.map(|ids| {
            self.index
                .node_positions(ids)
                .into_iter()
                .map(|pos| &diagram.nodes[pos])
                .collect()
        })
        .unwrap_or_default()
    }

    /// Narrows by tag index, then type index, before filtering on every predicate.
    pub fn search_nodes(&self, query: &NodeQuery) -> Result<Vec<&Node>> {
        let diagram = self.active()?;
        let candidates: Vec<&Node> = if let Some(tag) = &query.tag {
            self.collect_nodes(diagram, self.index.tagged(tag))
        } else if let Some(node_type) = &query.node_type {
            self.collect_nodes(diagram, self.index.typed(node_type))
        } else {
            diagram.nodes.iter().collect()
        };
        Ok(candidates.into_iter().filter(|n| query.matches(n)).collect())
    }

    /// Adds and removes tags on each listed node. Unknown ids are skipped and
    /// nothing is recorded when none match.
    pub fn bulk_update_tags(
        &mut self,
        ids: &[String],
        add: &[String],
        remove: &[String],
    ) -> Result<Vec<Node>> {
        self.active()?;
        let mut positions = self.index.node_positions(ids);
        positions.dedup();
        if positions.is_empty() {
            return Ok(Vec::new());
        }
        self.mutate("bulk_update_tags", |diagram, index| {
            let mut updated = Vec::with_capacity(positions.len());
            for pos in positions {
                let node = &mut diagram.nodes[pos];
                let old_tags = node.tags.clone();
                for tag in add {
                    if !node.tags.contains(tag) {
                        node.tags.push(tag.clone());
                    }
                }
                node.tags.retain(|t| !remove.contains(t));
                index.migrate_node(&node.id, &old_tags, &node.node_type, &node.tags, &node.node_type);
                updated.push(node.clone());
            }
            Ok(updated)
        })
    }

    // -------------------------------------------------------------------------
    // Edges
    // -------------------------------------------------------------------------

    /// Both endpoints must be named and exist before anything is created.
    pub fn add_edge(&mut self, new: NewEdge) -> Result<Edge> {
        self.active()?;
        let (Some(source), Some(target)) = (
            new.source.filter(|s| !s.is_empty()),
            new.target.filter(|t| !t.is_empty()),
        ) else {
            return Err(DiagramError::invalid(
                "both source and target nodes must be specified",
            ));
        };
        self.mutate("add_edge", |diagram, index| {
            for endpoint in [&source, &target] {
                if !index.contains_node(endpoint) {
                    return Err(DiagramError::node_not_found(endpoint));
                }
            }
            let mut edge = Edge::new(source, target).with_label(new.label);
            edge.source_side = new.source_side;
            edge.target_side = new.target_side;
            index.index_edge(&edge, diagram.edges.len());
            diagram.edges.push(edge.clone());
            Ok(edge)
        })
    }

    /// Like [`add_edge`](Self::add_edge), but when neither side is given both
    /// are set to the facing sides of the endpoints' current positions.
    pub fn add_edge_routed(&mut self, mut new: NewEdge) -> Result<Edge> {
        if new.source_side.is_none() && new.target_side.is_none() {
            let endpoints = new
                .source
                .as_deref()
                .zip(new.target.as_deref())
                .and_then(|(s, t)| Some((self.node(s).ok()?, self.node(t).ok()?)));
            if let Some((source, target)) = endpoints {
                let (source_side, target_side) = layout::facing_sides(source, target);
                new.source_side = Some(source_side);
                new.target_side = Some(target_side);
            }
        }
        self.add_edge(new)
    }

    pub fn update_edge(&mut self, id: &str, update: &EdgeUpdate) -> Result<Edge> {
        self.mutate("update_edge", |diagram, index| {
            let pos = index
                .edge_position(id)
                .ok_or_else(|| DiagramError::edge_not_found(id))?;
            let edge = &mut diagram.edges[pos];
            update.apply(edge);
            Ok(edge.clone())
        })
    }

    /// Returns false for an unknown id.
    pub fn delete_edge(&mut self, id: &str) -> Result<bool> {
        self.active()?;
        if !self.index.contains_edge(id) {
            return Ok(false);
        }
        self.mutate("delete_edge", |diagram, index| {
            let pos = index
                .edge_position(id)
                .ok_or_else(|| DiagramError::edge_not_found(id))?;
            let edge = diagram.edges.remove(pos);
            index.unindex_edge(&edge);
            index.reposition_edges(&diagram.edges, pos);
            Ok(true)
        })
    }

    pub fn edge(&self, id: &str) -> Result<&Edge> {
        let diagram = self.active()?;
        self.index
            .edge_position(id)
            .and_then(|pos| diagram.edges.get(pos))
            .ok_or_else(|| DiagramError::edge_not_found(id))
    }

    pub fn edges_for_node(&self, node_id: &str) -> Result<Vec<&Edge>> {
        let diagram = self.active()?;
        Ok(self
            .index
            .incident(node_id)
            .map(|ids| {
                self.index
                    .edge_positions(ids)
                    .into_iter()
                    .map(|pos| &diagram.edges[pos])
                    .collect()
            })
            .unwrap_or_default())
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    /// Accepts a bare [`LayoutStrategy`] for default options. Returns false,
    /// recording nothing, for an empty diagram.
    pub fn apply_layout(&mut self, layout: impl Into<Layout>) -> Result<bool> {
        let layout = layout.into();
        if self.active()?.nodes.is_empty() {
            return Ok(false);
        }
        debug!(strategy = ?layout.strategy(), "applying layout");
        self.mutate("apply_layout", |diagram, _| {
            layout.apply(&mut diagram.nodes, &diagram.edges);
            Ok(true)
        })
    }

    /// Needs at least two matching nodes; otherwise nothing is recorded.
    pub fn align_nodes(&mut self, ids: &[String], alignment: Alignment) -> Result<bool> {
        if layout::select(&self.active()?.nodes, ids).len() < 2 {
            return Ok(false);
        }
        self.mutate("align_nodes", |diagram, _| {
            Ok(layout::align(&mut diagram.nodes, ids, alignment))
        })
    }

    /// Needs at least three matching nodes; otherwise nothing is recorded.
    pub fn distribute_nodes(&mut self, ids: &[String], axis: Axis) -> Result<bool> {
        if layout::select(&self.active()?.nodes, ids).len() < 3 {
            return Ok(false);
        }
        self.mutate("distribute_nodes", |diagram, _| {
            Ok(layout::distribute(&mut diagram.nodes, ids, axis))
        })
    }

    /// Snaps to `grid_size`, or to the diagram's own grid when `None`.
    pub fn snap_to_grid(&mut self, grid_size: Option<f64>) -> Result<bool> {
        let diagram = self.active()?;
        let size = grid_size.unwrap_or(f64::from(diagram.metadata.grid_size));
        if size <= 0.0 || diagram.nodes.is_empty() {
            return Ok(false);
        }
        self.mutate("snap_to_grid", |diagram, _| {
            layout::snap_to_grid(&mut diagram.nodes, size);
            Ok(true)
        })
    }

    pub fn pack_nodes(&mut self) -> Result<bool> {
        if self.active()?.nodes.is_empty() {
            return Ok(false);
        }
        self.mutate("pack_nodes", |diagram, _| {
            layout::pack(&mut diagram.nodes, &PackOptions::default());
            Ok(true)
        })
    }

    /// Points each edge out of and into the facing sides of its endpoints.
    /// Returns how many edges were routed.
    pub fn route_edges(&mut self) -> Result<usize> {
        let diagram = self.active()?;
        let routable = diagram
            .edges
            .iter()
            .filter(|e| self.index.contains_node(&e.source) && self.index.contains_node(&e.target))
            .count();
        if routable == 0 {
            return Ok(0);
        }
        self.mutate("route_edges", |diagram, _| {
            Ok(layout::route_edges(&diagram.nodes, &mut diagram.edges))
        })
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    /// `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<&Diagram> {
        let diagram = self.diagram.as_mut()?;
        if !self.history.undo(diagram) {
            return None;
        }
        self.restored("undo");
        self.diagram.as_ref()
    }

    pub fn redo(&mut self) -> Option<&Diagram> {
        let diagram = self.diagram.as_mut()?;
        if !self.history.redo(diagram) {
            return None;
        }
        self.restored("redo");
        self.diagram.as_ref()
    }

    fn restored(&mut self, op: &'static str) {
        self.rebuild_indexes();
        self.dirty = true;
        debug!(
            op,
            undo_depth = self.history.undo_depth(),
            redo_depth = self.history.redo_depth(),
            "history step"
        );
        self.notify_change();
    }

    /// Stores a deep copy of the active diagram under `name`, replacing any earlier one.
    pub fn create_snapshot(&mut self, name: &str) -> Result<()> {
        let diagram = self.diagram.as_ref().ok_or(DiagramError::NoActiveDiagram)?;
        self.snapshots.insert(name, diagram, self.file_path.clone());
        info!(snapshot = name, diagram = %diagram.id, "snapshot created");
        Ok(())
    }

    /// Replaces the active diagram with the snapshot. Undoable.
    pub fn restore_snapshot(&mut self, name: &str) -> Result<&Diagram> {
        let snapshot = self
            .snapshots
            .get(name)
            .ok_or_else(|| DiagramError::snapshot_not_found(name))?;
        let restored = snapshot.diagram.clone();
        let file_path = snapshot.file_path.clone();

        if let Some(current) = self.diagram.take() {
            self.history.record(current);
        }
        self.install(restored);
        if file_path.is_some() {
            self.file_path = file_path;
        }
        self.dirty = true;
        info!(snapshot = name, "snapshot restored");
        self.notify_change();
        Ok(self.current())
    }

    pub fn delete_snapshot(&mut self, name: &str) -> bool {
        self.snapshots.remove(name)
    }

    pub fn list_snapshots(&self) -> Vec<SnapshotInfo> {
        self.snapshots.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutStrategy;
    use crate::model::Side;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn store_with(ids: &[&str]) -> DiagramStore {
        let mut store = DiagramStore::new();
        store.new_diagram("test");
        for id in ids {
            store.add_node(Node::new(id.to_uppercase()).with_id(*id)).unwrap();
        }
        store
    }

    fn node_ids(nodes: &[&Node]) -> Vec<String> {
        nodes.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn operations_without_diagram_fail() {
        let mut store = DiagramStore::new();
        assert!(matches!(store.add_node(Node::new("a")), Err(DiagramError::NoActiveDiagram)));
        assert!(matches!(store.node("a"), Err(DiagramError::NoActiveDiagram)));
        assert!(matches!(store.delete_node("a"), Err(DiagramError::NoActiveDiagram)));
        assert!(store.undo().is_none());
    }

    #[test]
    fn add_node_generates_missing_id() {
        let mut store = store_with(&[]);
        let node = store.add_node(Node::new("x").with_id("")).unwrap();
        assert!(node.id.starts_with('n'));
        assert_eq!(store.node(&node.id).unwrap().label, "x");
    }

    #[test]
    fn duplicate_node_id_is_rejected_without_history() {
        let mut store = store_with(&["a"]);
        let depth = store.history.undo_depth();
        let err = store.add_node(Node::new("again").with_id("a")).unwrap_err();
        assert!(matches!(err, DiagramError::InvalidArgument(_)));
        assert_eq!(store.history.undo_depth(), depth);
    }

    #[test]
    fn update_node_moves_index_membership() {
        let mut store = store_with(&["a"]);
        store
            .update_node(
                "a",
                &NodeUpdate {
                    tags: Some(vec!["api".into()]),
                    node_type: Some("service".into()),
                    ..NodeUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(node_ids(&store.nodes_by_tag("api").unwrap()), vec!["a"]);
        assert_eq!(node_ids(&store.nodes_by_type("service").unwrap()), vec!["a"]);
        assert!(store.nodes_by_type("component").unwrap().is_empty());
    }

    #[test]
    fn update_unknown_node_is_not_found() {
        let mut store = store_with(&[]);
        let err = store.update_node("ghost", &NodeUpdate::default()).unwrap_err();
        assert_eq!(err.to_string(), "node not found: ghost");
    }

    #[test]
    fn delete_node_cascades_and_reindexes() {
        let mut store = store_with(&["a", "b", "c"]);
        store.add_edge(NewEdge::new("a", "b")).unwrap();
        let bc = store.add_edge(NewEdge::new("b", "c")).unwrap();
        let ca = store.add_edge(NewEdge::new("c", "a")).unwrap();

        assert!(store.delete_node("b").unwrap());
        let diagram = store.diagram().unwrap();
        assert_eq!(diagram.edges.len(), 1);
        assert_eq!(diagram.edges[0].id, ca.id);
        assert!(matches!(store.edge(&bc.id), Err(DiagramError::NotFound { .. })));
        assert_eq!(store.node("c").unwrap().id, "c", "positions shifted after removal");
        assert_eq!(store.edge(&ca.id).unwrap().id, ca.id);
        assert!(!store.delete_node("b").unwrap());
    }

    #[test]
    fn add_edge_requires_both_endpoints() {
        let mut store = store_with(&["a"]);
        let err = store
            .add_edge(NewEdge {
                source: Some("a".into()),
                ..NewEdge::default()
            })
            .unwrap_err();
        assert!(matches!(err, DiagramError::InvalidArgument(_)));

        let err = store.add_edge(NewEdge::new("a", "ghost")).unwrap_err();
        assert_eq!(err.to_string(), "node not found: ghost");
        assert!(store.diagram().unwrap().edges.is_empty());
    }

    #[test]
    fn add_edge_keeps_requested_sides() {
        let mut store = store_with(&["a", "b"]);
        let edge = store
            .add_edge(NewEdge::new("a", "b").with_sides(Some(Side::Right), None))
            .unwrap();
        assert_eq!(edge.source_side, Some(Side::Right));
        assert_eq!(edge.target_side, None);
    }

    #[test]
    fn edges_for_node_in_diagram_order() {
        let mut store = store_with(&["a", "b", "c"]);
        let e1 = store.add_edge(NewEdge::new("a", "b")).unwrap();
        store.add_edge(NewEdge::new("b", "c")).unwrap();
        let e3 = store.add_edge(NewEdge::new("c", "a")).unwrap();
        let ids: Vec<String> = store
            .edges_for_node("a")
            .unwrap()
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        assert_eq!(ids, vec![e1.id, e3.id]);
    }

    #[test]
    fn search_combines_index_and_filters() {
        let mut store = DiagramStore::new();
        store.new_diagram("search");
        store
            .add_node(Node::new("Auth API").with_id("a").with_tags(["api"]).with_type("service"))
            .unwrap();
        store
            .add_node(Node::new("Billing API").with_id("b").with_tags(["api"]))
            .unwrap();
        store.add_node(Node::new("Ledger").with_id("c").with_type("service")).unwrap();

        let hits = store.search_nodes(&NodeQuery::tag("api").with_type("service")).unwrap();
        assert_eq!(node_ids(&hits), vec!["a"]);
        let hits = store.search_nodes(&NodeQuery::label("api")).unwrap();
        assert_eq!(node_ids(&hits), vec!["a", "b"]);
        let hits = store.search_nodes(&NodeQuery::node_type("service")).unwrap();
        assert_eq!(node_ids(&hits), vec!["a", "c"]);
        assert!(store.search_nodes(&NodeQuery::tag("none")).unwrap().is_empty());
    }

    #[test]
    fn bulk_tags_skip_unknown_ids() {
        let mut store = store_with(&["a", "b"]);
        let depth = store.history.undo_depth();
        let updated = store
            .bulk_update_tags(&["ghost".into()], &["x".into()], &[])
            .unwrap();
        assert!(updated.is_empty());
        assert_eq!(store.history.undo_depth(), depth);

        let updated = store
            .bulk_update_tags(&["b".into(), "a".into(), "ghost".into()], &["x".into()], &[])
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(node_ids(&store.nodes_by_tag("x").unwrap()), vec!["a", "b"]);

        store.bulk_update_tags(&["a".into()], &[], &["x".into()]).unwrap();
        assert_eq!(node_ids(&store.nodes_by_tag("x").unwrap()), vec!["b"]);
    }

    #[test]
    fn undo_redo_restore_states() {
        let mut store = store_with(&["a"]);
        store.add_node(Node::new("B").with_id("b")).unwrap();
        assert_eq!(store.undo().unwrap().nodes.len(), 1);
        assert!(matches!(store.node("b"), Err(DiagramError::NotFound { .. })));
        assert_eq!(store.redo().unwrap().nodes.len(), 2);
        assert_eq!(store.node("b").unwrap().label, "B");
        assert!(store.redo().is_none());
    }

    #[test]
    fn new_mutation_clears_redo() {
        let mut store = store_with(&["a"]);
        store.undo();
        assert!(store.can_redo());
        store.add_node(Node::new("c").with_id("c")).unwrap();
        assert!(!store.can_redo());
    }

    #[test]
    fn history_is_bounded() {
        let mut store = DiagramStore::with_config(StoreConfig { max_history: 2 });
        store.new_diagram("bounded");
        for id in ["a", "b", "c", "d"] {
            store.add_node(Node::new(id).with_id(id)).unwrap();
        }
        assert!(store.undo().is_some());
        assert!(store.undo().is_some());
        assert!(store.undo().is_none());
        assert_eq!(store.diagram().unwrap().nodes.len(), 2);
    }

    #[test]
    fn snapshots_are_independent_and_undoable() {
        let mut store = store_with(&["a"]);
        store.create_snapshot("one").unwrap();
        store.add_node(Node::new("B").with_id("b")).unwrap();

        assert_eq!(store.restore_snapshot("one").unwrap().nodes.len(), 1);
        assert_eq!(store.undo().unwrap().nodes.len(), 2);
        assert!(matches!(
            store.restore_snapshot("missing"),
            Err(DiagramError::NotFound { .. })
        ));
        assert_eq!(store.list_snapshots().len(), 1);
        assert!(store.delete_snapshot("one"));
        assert!(!store.delete_snapshot("one"));
    }

    #[test]
    fn change_hooks_fire_per_commit_and_failures_are_swallowed() {
        let calls = Rc::new(Cell::new(0));
        let mut store = DiagramStore::new();
        let seen = Rc::clone(&calls);
        store.on_change(move || {
            seen.set(seen.get() + 1);
            anyhow::bail!("subscriber offline")
        });
        store.new_diagram("hooks");
        store.add_node(Node::new("a").with_id("a")).unwrap();
        let _ = store.add_node(Node::new("a").with_id("a"));
        assert_eq!(calls.get(), 2, "failed mutation does not notify");
        assert_eq!(store.diagram().unwrap().nodes.len(), 1);
    }

    #[test]
    fn change_event_names_diagram() {
        let mut store = DiagramStore::new();
        assert!(store.change_event().is_none());
        let id = store.new_diagram("evt").id.clone();
        let json = serde_json::to_value(store.change_event().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"event": "diagram_updated", "diagramId": id}));
    }

    #[test]
    fn layout_ops_skip_history_when_not_applicable() {
        let mut store = store_with(&["a", "b"]);
        let depth = store.history.undo_depth();
        assert!(!store.distribute_nodes(&["a".into(), "b".into()], Axis::Horizontal).unwrap());
        assert!(!store.align_nodes(&["a".into()], Alignment::Left).unwrap());
        assert!(!store.snap_to_grid(Some(0.0)).unwrap());
        assert_eq!(store.route_edges().unwrap(), 0);
        assert_eq!(store.history.undo_depth(), depth);

        assert!(store.apply_layout(LayoutStrategy::Grid).unwrap());
        assert_eq!(store.history.undo_depth(), depth + 1);
    }

    #[test]
    fn save_without_path_is_invalid() {
        let mut store = store_with(&[]);
        let err = store.save(None).unwrap_err();
        assert!(matches!(err, DiagramError::InvalidArgument(_)), "got: {err}");
    }

    #[test]
    fn update_info_is_recorded() {
        let mut store = store_with(&[]);
        store
            .update_info(DiagramInfoUpdate {
                name: Some("Renamed".into()),
                grid_size: Some(10),
                ..DiagramInfoUpdate::default()
            })
            .unwrap();
        let diagram = store.diagram().unwrap();
        assert_eq!((diagram.name.as_str(), diagram.metadata.grid_size), ("Renamed", 10));
        assert_eq!(store.undo().unwrap().name, "test");
    }
}
