use std::collections::{HashMap, HashSet, VecDeque};
use std::f64::consts::PI;
use std::str::FromStr;

use crate::error::DiagramError;
use crate::model::{Edge, Node, Side};

pub const DEFAULT_SPACING_X: f64 = 200.0;
pub const DEFAULT_SPACING_Y: f64 = 150.0;
pub const DEFAULT_START_X: f64 = 100.0;
pub const DEFAULT_START_Y: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStrategy {
    Grid,
    Tree,
    Force,
}

impl FromStr for LayoutStrategy {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(LayoutStrategy::Grid),
            "tree" => Ok(LayoutStrategy::Tree),
            "force" => Ok(LayoutStrategy::Force),
            other => Err(DiagramError::invalid(format!(
                "unknown layout strategy `{other}` (expected grid, tree or force)"
            ))),
        }
    }
}

/// A layout strategy together with its options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layout {
    Grid(GridOptions),
    Tree(TreeOptions),
    Force(ForceOptions),
}

impl From<LayoutStrategy> for Layout {
    fn from(strategy: LayoutStrategy) -> Self {
        match strategy {
            LayoutStrategy::Grid => Layout::Grid(GridOptions::default()),
            LayoutStrategy::Tree => Layout::Tree(TreeOptions::default()),
            LayoutStrategy::Force => Layout::Force(ForceOptions::default()),
        }
    }
}

impl Layout {
    pub fn strategy(&self) -> LayoutStrategy {
        match self {
            Layout::Grid(_) => LayoutStrategy::Grid,
            Layout::Tree(_) => LayoutStrategy::Tree,
            Layout::Force(_) => LayoutStrategy::Force,
        }
    }

    pub fn apply(&self, nodes: &mut [Node], edges: &[Edge]) {
        match self {
            Layout::Grid(opts) => grid(nodes, opts),
            Layout::Tree(opts) => tree(nodes, edges, opts),
            Layout::Force(opts) => force(nodes, edges, opts),
        }
    }
}

// =============================================================================
// Grid
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOptions {
    pub spacing_x: f64,
    pub spacing_y: f64,
    pub start_x: f64,
    pub start_y: f64,
    /// Derived from the node count when unset.
    pub columns: Option<usize>,
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions {
            spacing_x: DEFAULT_SPACING_X,
            spacing_y: DEFAULT_SPACING_Y,
            start_x: DEFAULT_START_X,
            start_y: DEFAULT_START_Y,
            columns: None,
        }
    }
}

pub fn grid_columns(node_count: usize) -> usize {
    let root = (node_count as f64).sqrt().floor() as usize;
    (root + 1).max(3)
}

pub fn grid(nodes: &mut [Node], opts: &GridOptions) {
    if nodes.is_empty() {
        return;
    }
    let columns = opts
        .columns
        .filter(|&c| c > 0)
        .unwrap_or_else(|| grid_columns(nodes.len()));

    for (i, node) in nodes.iter_mut().enumerate() {
        let row = i / columns;
        let col = i % columns;
        node.x = opts.start_x + col as f64 * opts.spacing_x;
        node.y = opts.start_y + row as f64 * opts.spacing_y;
    }
}

// =============================================================================
// Tree
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeOptions {
    pub spacing_x: f64,
    pub spacing_y: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub orientation: Orientation,
}

impl Default for TreeOptions {
    fn default() -> Self {
        TreeOptions {
            spacing_x: DEFAULT_SPACING_X,
            spacing_y: DEFAULT_SPACING_Y,
            start_x: DEFAULT_START_X,
            start_y: DEFAULT_START_Y,
            orientation: Orientation::Vertical,
        }
    }
}

pub fn tree(nodes: &mut [Node], edges: &[Edge], opts: &TreeOptions) {
    if nodes.is_empty() {
        return;
    }

    let levels = assign_levels(nodes, edges);
    let mut level_counts: HashMap<usize, usize> = HashMap::new();

    for (node, &level) in nodes.iter_mut().zip(&levels) {
        let slot = level_counts.entry(level).or_default();
        let idx = *slot;
        *slot += 1;

        match opts.orientation {
            Orientation::Vertical => {
                node.x = opts.start_x + idx as f64 * opts.spacing_x;
                node.y = opts.start_y + level as f64 * opts.spacing_y;
            }
            Orientation::Horizontal => {
                node.x = opts.start_x + level as f64 * opts.spacing_x;
                node.y = opts.start_y + idx as f64 * opts.spacing_y;
            }
        }
    }
}

/// Breadth-first depth of every node, indexed like `nodes`.
///
/// Roots are nodes without an incoming edge; when every node has a parent the
/// first node is used. Nodes the traversal never reaches sit at level 0.
fn assign_levels(nodes: &[Node], edges: &[Edge]) -> Vec<usize> {
    let position: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut has_parent = vec![false; nodes.len()];
    for edge in edges {
        if let (Some(&s), Some(&t)) = (
            position.get(edge.source.as_str()),
            position.get(edge.target.as_str()),
        ) {
            children[s].push(t);
            has_parent[t] = true;
        }
    }

    let mut roots: Vec<usize> = (0..nodes.len()).filter(|&i| !has_parent[i]).collect();
    if roots.is_empty() {
        roots.push(0);
    }

    let mut levels: Vec<Option<usize>> = vec![None; nodes.len()];
    let mut queue: VecDeque<(usize, usize)> = roots.into_iter().map(|r| (r, 0)).collect();
    while let Some((i, level)) = queue.pop_front() {
        if levels[i].is_some() {
            continue;
        }
        levels[i] = Some(level);
        for &child in &children[i] {
            queue.push_back((child, level + 1));
        }
    }

    levels.into_iter().map(|l| l.unwrap_or(0)).collect()
}

// =============================================================================
// Force-directed
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceOptions {
    pub iterations: usize,
    pub repulsion: f64,
    pub attraction: f64,
    pub damping: f64,
    /// Floor for pair distances and for the final coordinates.
    pub min_distance: f64,
    pub center: (f64, f64),
    pub radius: f64,
}

impl Default for ForceOptions {
    fn default() -> Self {
        ForceOptions {
            iterations: 100,
            repulsion: 5000.0,
            attraction: 0.01,
            damping: 0.1,
            min_distance: 50.0,
            center: (400.0, 400.0),
            radius: 200.0,
        }
    }
}

pub fn force(nodes: &mut [Node], edges: &[Edge], opts: &ForceOptions) {
    let n = nodes.len();
    if n < 2 {
        return;
    }

    let position: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.as_str(), i))
        .collect();
    let springs: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|e| {
            Some((
                *position.get(e.source.as_str())?,
                *position.get(e.target.as_str())?,
            ))
        })
        .collect();

    // Start on a circle so no two nodes coincide.
    let mut xs = vec![0.0; n];
    let mut ys = vec![0.0; n];
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        xs[i] = opts.center.0 + opts.radius * angle.cos();
        ys[i] = opts.center.1 + opts.radius * angle.sin();
    }

    for _ in 0..opts.iterations {
        let mut fx = vec![0.0; n];
        let mut fy = vec![0.0; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = xs[i] - xs[j];
                let dy = ys[i] - ys[j];
                let dist = dx.hypot(dy).max(opts.min_distance);
                let push = opts.repulsion / (dist * dist);
                let (px, py) = (push * dx / dist, push * dy / dist);
                fx[i] += px;
                fy[i] += py;
                fx[j] -= px;
                fy[j] -= py;
            }
        }

        for &(s, t) in &springs {
            let dx = xs[t] - xs[s];
            let dy = ys[t] - ys[s];
            let dist = dx.hypot(dy).max(opts.min_distance);
            let pull = dist * opts.attraction;
            let (px, py) = (pull * dx / dist, pull * dy / dist);
            fx[s] += px;
            fy[s] += py;
            fx[t] -= px;
            fy[t] -= py;
        }

        for i in 0..n {
            xs[i] = (xs[i] + fx[i] * opts.damping).max(opts.min_distance);
            ys[i] = (ys[i] + fy[i] * opts.damping).max(opts.min_distance);
        }
    }

    for (node, (x, y)) in nodes.iter_mut().zip(xs.into_iter().zip(ys)) {
        node.x = x;
        node.y = y;
    }
}

// =============================================================================
// Align / distribute
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Top,
    Bottom,
    CenterH,
    CenterV,
}

impl FromStr for Alignment {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Alignment::Left),
            "right" => Ok(Alignment::Right),
            "top" => Ok(Alignment::Top),
            "bottom" => Ok(Alignment::Bottom),
            "center_h" => Ok(Alignment::CenterH),
            "center_v" => Ok(Alignment::CenterV),
            other => Err(DiagramError::invalid(format!(
                "unknown alignment `{other}` (expected left, right, top, bottom, center_h or center_v)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl FromStr for Axis {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(Axis::Horizontal),
            "vertical" => Ok(Axis::Vertical),
            other => Err(DiagramError::invalid(format!(
                "unknown axis `{other}` (expected horizontal or vertical)"
            ))),
        }
    }
}

/// Positions of nodes whose id is in `ids`, in diagram order.
pub fn select(nodes: &[Node], ids: &[String]) -> Vec<usize> {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| wanted.contains(n.id.as_str()))
        .map(|(i, _)| i)
        .collect()
}

/// Returns false, leaving nodes untouched, when fewer than two nodes match.
pub fn align(nodes: &mut [Node], ids: &[String], alignment: Alignment) -> bool {
    let targets = select(nodes, ids);
    if targets.len() < 2 {
        return false;
    }
    let count = targets.len() as f64;

    match alignment {
        Alignment::Left => {
            let min_x = targets.iter().map(|&i| nodes[i].x).fold(f64::INFINITY, f64::min);
            for &i in &targets {
                nodes[i].x = min_x;
            }
        }
        Alignment::Right => {
            let max_right = targets
                .iter()
                .map(|&i| nodes[i].x + nodes[i].width)
                .fold(f64::NEG_INFINITY, f64::max);
            for &i in &targets {
                nodes[i].x = max_right - nodes[i].width;
            }
        }
        Alignment::Top => {
            let min_y = targets.iter().map(|&i| nodes[i].y).fold(f64::INFINITY, f64::min);
            for &i in &targets {
                nodes[i].y = min_y;
            }
        }
        Alignment::Bottom => {
            let max_bottom = targets
                .iter()
                .map(|&i| nodes[i].y + nodes[i].height)
                .fold(f64::NEG_INFINITY, f64::max);
            for &i in &targets {
                nodes[i].y = max_bottom - nodes[i].height;
            }
        }
        Alignment::CenterH => {
            let center_x = targets.iter().map(|&i| nodes[i].center().0).sum::<f64>() / count;
            for &i in &targets {
                nodes[i].x = center_x - nodes[i].width / 2.0;
            }
        }
        Alignment::CenterV => {
            let center_y = targets.iter().map(|&i| nodes[i].center().1).sum::<f64>() / count;
            for &i in &targets {
                nodes[i].y = center_y - nodes[i].height / 2.0;
            }
        }
    }
    true
}

/// Spaces the matching nodes evenly between the outermost two, which stay put.
/// Returns false when fewer than three nodes match.
pub fn distribute(nodes: &mut [Node], ids: &[String], axis: Axis) -> bool {
    let mut targets = select(nodes, ids);
    if targets.len() < 3 {
        return false;
    }

    let coord = |node: &Node| match axis {
        Axis::Horizontal => node.x,
        Axis::Vertical => node.y,
    };
    targets.sort_by(|&a, &b| coord(&nodes[a]).total_cmp(&coord(&nodes[b])));

    let first = coord(&nodes[targets[0]]);
    let last = coord(&nodes[targets[targets.len() - 1]]);
    let step = (last - first) / (targets.len() - 1) as f64;

    for (rank, &i) in targets.iter().enumerate() {
        let value = first + rank as f64 * step;
        match axis {
            Axis::Horizontal => nodes[i].x = value,
            Axis::Vertical => nodes[i].y = value,
        }
    }
    true
}

// =============================================================================
// Snap / pack
// =============================================================================

/// Rounds coordinates to the nearest multiple of `grid_size`, ties to even.
pub fn snap_to_grid(nodes: &mut [Node], grid_size: f64) {
    if grid_size <= 0.0 {
        return;
    }
    for node in nodes {
        node.x = (node.x / grid_size).round_ties_even() * grid_size;
        node.y = (node.y / grid_size).round_ties_even() * grid_size;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackOptions {
    pub padding: f64,
    pub start_x: f64,
    pub start_y: f64,
    /// Right edge a row may not cross once it holds a node.
    pub max_row_width: f64,
}

impl Default for PackOptions {
    fn default() -> Self {
        PackOptions {
            padding: 20.0,
            start_x: DEFAULT_START_X,
            start_y: DEFAULT_START_Y,
            max_row_width: 1200.0,
        }
    }
}

pub fn pack(nodes: &mut [Node], opts: &PackOptions) {
    if nodes.is_empty() {
        return;
    }

    let area = |n: &Node| n.width * n.height;
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| area(&nodes[b]).total_cmp(&area(&nodes[a])));

    let mut x = opts.start_x;
    let mut y = opts.start_y;
    let mut row_height: f64 = 0.0;

    for i in order {
        let node = &mut nodes[i];
        if x + node.width > opts.max_row_width && x > opts.start_x {
            x = opts.start_x;
            y += row_height + opts.padding;
            row_height = 0.0;
        }
        node.x = x;
        node.y = y;
        x += node.width + opts.padding;
        row_height = row_height.max(node.height);
    }
}

// =============================================================================
// Edge routing
// =============================================================================

/// Sides that face each other along the dominant axis between the two centers.
pub fn facing_sides(source: &Node, target: &Node) -> (Side, Side) {
    let (sx, sy) = source.center();
    let (tx, ty) = target.center();
    let dx = tx - sx;
    let dy = ty - sy;

    if dx.abs() > dy.abs() {
        if dx > 0.0 {
            (Side::Right, Side::Left)
        } else {
            (Side::Left, Side::Right)
        }
    } else if dy > 0.0 {
        (Side::Bottom, Side::Top)
    } else {
        (Side::Top, Side::Bottom)
    }
}

/// Assigns facing sides to every edge whose endpoints both exist. Returns how many were routed.
pub fn route_edges(nodes: &[Node], edges: &mut [Edge]) -> usize {
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut routed = 0;
    for edge in edges.iter_mut() {
        let (Some(source), Some(target)) =
            (by_id.get(edge.source.as_str()), by_id.get(edge.target.as_str()))
        else {
            continue;
        };
        let (source_side, target_side) = facing_sides(source, target);
        edge.source_side = Some(source_side);
        edge.target_side = Some(target_side);
        routed += 1;
    }
    routed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter().map(|id| Node::new(*id).with_id(*id)).collect()
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn positions(nodes: &[Node]) -> Vec<(f64, f64)> {
        nodes.iter().map(|n| (n.x, n.y)).collect()
    }

    #[test]
    fn grid_columns_grow_with_sqrt() {
        assert_eq!(grid_columns(1), 3);
        assert_eq!(grid_columns(5), 3);
        assert_eq!(grid_columns(9), 4);
        assert_eq!(grid_columns(16), 5);
    }

    #[test]
    fn grid_places_row_major() {
        let mut ns = nodes(&["a", "b", "c", "d", "e"]);
        grid(&mut ns, &GridOptions::default());
        assert_eq!(
            positions(&ns),
            vec![(100.0, 100.0), (300.0, 100.0), (500.0, 100.0), (100.0, 250.0), (300.0, 250.0)]
        );
    }

    #[test]
    fn grid_honours_explicit_columns() {
        let mut ns = nodes(&["a", "b", "c"]);
        grid(
            &mut ns,
            &GridOptions {
                columns: Some(1),
                ..GridOptions::default()
            },
        );
        assert_eq!(positions(&ns), vec![(100.0, 100.0), (100.0, 250.0), (100.0, 400.0)]);
    }

    #[test]
    fn levels_linear_chain() {
        let ns = nodes(&["a", "b", "c"]);
        let es = vec![Edge::new("a", "b"), Edge::new("b", "c")];
        assert_eq!(assign_levels(&ns, &es), vec![0, 1, 2]);
    }

    #[test]
    fn levels_take_shortest_bfs_depth() {
        let ns = nodes(&["a", "b", "c"]);
        let es = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("a", "c")];
        assert_eq!(assign_levels(&ns, &es), vec![0, 1, 1]);
    }

    #[test]
    fn levels_in_pure_cycle_start_from_first_node() {
        let ns = nodes(&["a", "b", "c"]);
        let es = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("c", "a")];
        assert_eq!(assign_levels(&ns, &es), vec![0, 1, 2]);
    }

    #[test]
    fn levels_unreached_nodes_default_to_zero() {
        // b and c form a cycle with no root, a is the only root and never reaches them.
        let ns = nodes(&["a", "b", "c"]);
        let es = vec![Edge::new("b", "c"), Edge::new("c", "b")];
        assert_eq!(assign_levels(&ns, &es), vec![0, 0, 0]);
    }

    #[test]
    fn tree_fan_out_vertical() {
        let mut ns = nodes(&["root", "l", "r"]);
        let es = vec![Edge::new("root", "l"), Edge::new("root", "r")];
        tree(&mut ns, &es, &TreeOptions::default());
        assert_eq!(positions(&ns), vec![(100.0, 100.0), (100.0, 250.0), (300.0, 250.0)]);
    }

    #[test]
    fn tree_horizontal_swaps_axes() {
        let mut ns = nodes(&["root", "l", "r"]);
        let es = vec![Edge::new("root", "l"), Edge::new("root", "r")];
        let opts = TreeOptions {
            orientation: Orientation::Horizontal,
            ..TreeOptions::default()
        };
        tree(&mut ns, &es, &opts);
        assert_eq!(positions(&ns), vec![(100.0, 100.0), (300.0, 100.0), (300.0, 250.0)]);
    }

    #[test]
    fn force_is_deterministic_and_clamped() {
        let es = vec![Edge::new("a", "b"), Edge::new("b", "c")];
        let mut first = nodes(&["a", "b", "c", "d"]);
        let mut second = nodes(&["a", "b", "c", "d"]);
        force(&mut first, &es, &ForceOptions::default());
        force(&mut second, &es, &ForceOptions::default());
        assert_eq!(positions(&first), positions(&second));
        for n in &first {
            assert!(n.x >= 50.0 && n.y >= 50.0, "{} at ({}, {})", n.id, n.x, n.y);
        }
    }

    #[test]
    fn force_leaves_single_node_alone() {
        let mut ns = nodes(&["solo"]);
        force(&mut ns, &[], &ForceOptions::default());
        assert_eq!(positions(&ns), vec![(100.0, 100.0)]);
    }

    #[test]
    fn force_zero_iterations_is_circle() {
        let mut ns = nodes(&["a", "b"]);
        let opts = ForceOptions {
            iterations: 0,
            ..ForceOptions::default()
        };
        force(&mut ns, &[], &opts);
        assert_eq!(ns[0].x, 600.0);
        assert_eq!(ns[0].y, 400.0);
        assert!((ns[1].x - 200.0).abs() < 1e-9);
    }

    #[test]
    fn align_modes() {
        let mut ns = vec![
            Node::new("a").with_id("a").at(10.0, 40.0).sized(100.0, 50.0),
            Node::new("b").with_id("b").at(60.0, 20.0).sized(40.0, 20.0),
        ];
        let both = ids(&["a", "b"]);

        assert!(align(&mut ns, &both, Alignment::Left));
        assert_eq!((ns[0].x, ns[1].x), (10.0, 10.0));

        assert!(align(&mut ns, &both, Alignment::Right));
        assert_eq!((ns[0].x, ns[1].x), (10.0, 70.0));

        assert!(align(&mut ns, &both, Alignment::Bottom));
        assert_eq!((ns[0].y, ns[1].y), (40.0, 70.0));

        assert!(align(&mut ns, &both, Alignment::Top));
        assert_eq!((ns[0].y, ns[1].y), (40.0, 40.0));

        assert!(align(&mut ns, &both, Alignment::CenterH));
        assert_eq!(ns[0].center().0, ns[1].center().0);

        assert!(align(&mut ns, &both, Alignment::CenterV));
        assert_eq!(ns[0].center().1, ns[1].center().1);
    }

    #[test]
    fn align_needs_two_nodes() {
        let mut ns = nodes(&["a", "b"]);
        assert!(!align(&mut ns, &ids(&["a"]), Alignment::Left));
        assert!(!align(&mut ns, &ids(&["a", "missing"]), Alignment::Left));
    }

    #[test]
    fn distribute_keeps_ends_and_spreads_middle() {
        let mut ns = vec![
            Node::new("a").with_id("a").at(0.0, 0.0),
            Node::new("b").with_id("b").at(300.0, 0.0),
            Node::new("c").with_id("c").at(20.0, 0.0),
            Node::new("d").with_id("d").at(90.0, 0.0),
        ];
        assert!(distribute(&mut ns, &ids(&["a", "b", "c", "d"]), Axis::Horizontal));
        assert_eq!(ns.iter().map(|n| n.x).collect::<Vec<_>>(), vec![0.0, 300.0, 100.0, 200.0]);
    }

    #[test]
    fn distribute_needs_three_nodes() {
        let mut ns = nodes(&["a", "b"]);
        assert!(!distribute(&mut ns, &ids(&["a", "b"]), Axis::Horizontal));
    }

    #[test]
    fn snap_rounds_half_to_even() {
        let mut ns = vec![
            Node::new("a").at(30.0, 10.0),
            Node::new("b").at(49.0, 71.0),
        ];
        snap_to_grid(&mut ns, 20.0);
        assert_eq!(positions(&ns), vec![(40.0, 0.0), (40.0, 80.0)]);
    }

    #[test]
    fn snap_disabled_for_non_positive_grid() {
        let mut ns = vec![Node::new("a").at(33.0, 17.0)];
        snap_to_grid(&mut ns, 0.0);
        assert_eq!(positions(&ns), vec![(33.0, 17.0)]);
    }

    #[test]
    fn pack_wraps_rows_and_puts_largest_first() {
        let mut ns: Vec<Node> = (0..7).map(|i| Node::new(format!("n{i}"))).collect();
        ns[6] = Node::new("big").sized(300.0, 200.0);
        pack(&mut ns, &PackOptions::default());

        assert_eq!((ns[6].x, ns[6].y), (100.0, 100.0));
        assert_eq!((ns[0].x, ns[0].y), (420.0, 100.0));
        assert_eq!((ns[4].x, ns[4].y), (100.0, 320.0), "fifth small node wraps");
    }

    #[test]
    fn facing_sides_follow_dominant_axis() {
        let a = Node::new("a").at(0.0, 0.0);
        let right = Node::new("r").at(400.0, 50.0);
        let below = Node::new("b").at(50.0, 400.0);
        assert_eq!(facing_sides(&a, &right), (Side::Right, Side::Left));
        assert_eq!(facing_sides(&right, &a), (Side::Left, Side::Right));
        assert_eq!(facing_sides(&a, &below), (Side::Bottom, Side::Top));
        assert_eq!(facing_sides(&below, &a), (Side::Top, Side::Bottom));
    }

    #[test]
    fn route_skips_dangling_edges() {
        let ns = vec![Node::new("a").with_id("a"), Node::new("b").with_id("b").at(500.0, 100.0)];
        let mut es = vec![Edge::new("a", "b"), Edge::new("a", "ghost")];
        assert_eq!(route_edges(&ns, &mut es), 1);
        assert_eq!(es[0].source_side, Some(Side::Right));
        assert_eq!(es[1].source_side, None);
    }

    #[test]
    fn keywords_parse() {
        assert_eq!("center_v".parse::<Alignment>().unwrap(), Alignment::CenterV);
        assert_eq!("vertical".parse::<Axis>().unwrap(), Axis::Vertical);
        assert_eq!("tree".parse::<LayoutStrategy>().unwrap(), LayoutStrategy::Tree);
        assert!("diagonal".parse::<Axis>().is_err());
        assert!("spiral".parse::<LayoutStrategy>().is_err());
    }
}
