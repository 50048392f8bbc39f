use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use diagrammer::analysis::{self, DEFAULT_MAX_PATH_DEPTH, DEFAULT_TOP_N};
use diagrammer::history::DEFAULT_MAX_HISTORY;
use diagrammer::layout::{
    Alignment, Axis, GridOptions, Layout, LayoutStrategy, Orientation, TreeOptions,
};
use diagrammer::model::{ArrowType, DEFAULT_DIAGRAM_NAME, LineStyle, NodeShape, Side};
use diagrammer::{
    DiagramStore, EdgeUpdate, NewEdge, Node, NodeQuery, NodeUpdate, StoreConfig, report,
};

#[derive(Parser)]
#[command(
    name = "diagrammer",
    about = "Edit, arrange and analyze node-and-edge diagrams stored as JSON"
)]
struct Cli {
    /// Diagram file
    file: PathBuf,

    /// Print aligned text instead of JSON
    #[arg(long, global = true)]
    text: bool,

    /// Undo states kept while the command runs
    #[arg(long, env = "DIAGRAMMER_MAX_HISTORY", default_value_t = DEFAULT_MAX_HISTORY)]
    max_history: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty diagram at FILE, overwriting it
    New {
        #[arg(long, default_value = DEFAULT_DIAGRAM_NAME)]
        name: String,
    },
    /// Print the whole diagram
    Show,
    AddNode {
        label: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long = "type")]
        node_type: Option<String>,
        #[arg(long)]
        shape: Option<NodeShape>,
        #[arg(long, allow_negative_numbers = true)]
        x: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        y: Option<f64>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change only the given fields of a node
    UpdateNode {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long = "type")]
        node_type: Option<String>,
        #[arg(long)]
        shape: Option<NodeShape>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        x: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        y: Option<f64>,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        /// Replaces every tag; repeat for several
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a node and every edge touching it
    DeleteNode { id: String },
    /// Find nodes, e.g. `search tag:api type:service gateway`
    Search { query: Vec<String> },
    /// Connect two nodes. Without sides, the facing sides are picked
    AddEdge {
        source: String,
        target: String,
        #[arg(long, default_value = "")]
        label: String,
        #[arg(long)]
        source_side: Option<Side>,
        #[arg(long)]
        target_side: Option<Side>,
        /// Leave both sides unset when none are given
        #[arg(long)]
        no_auto_route: bool,
    },
    UpdateEdge {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        width: Option<f64>,
        /// solid, dashed or dotted
        #[arg(long)]
        style: Option<LineStyle>,
        /// none, arrow, filled, diamond or circle
        #[arg(long)]
        arrow_start: Option<ArrowType>,
        #[arg(long)]
        arrow_end: Option<ArrowType>,
        #[arg(long)]
        source_side: Option<Side>,
        #[arg(long)]
        target_side: Option<Side>,
    },
    DeleteEdge { id: String },
    /// Rearrange every node: grid, tree or force
    Layout {
        #[arg(default_value = "grid")]
        strategy: LayoutStrategy,
        /// Grid columns (derived from the node count by default)
        #[arg(long)]
        columns: Option<usize>,
        /// Lay trees out left to right
        #[arg(long)]
        horizontal: bool,
    },
    /// Align nodes: left, right, top, bottom, center_h or center_v
    Align {
        alignment: Alignment,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Space nodes evenly: horizontal or vertical
    Distribute {
        axis: Axis,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Round positions to the grid (the diagram's own grid by default)
    Snap {
        #[arg(long)]
        grid: Option<f64>,
    },
    /// Pack nodes into rows, largest first
    Pack,
    /// Point every edge between the facing sides of its endpoints
    RouteEdges,
    /// Add or remove tags on several nodes
    Tag {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        add: Vec<String>,
        #[arg(long)]
        remove: Vec<String>,
    },
    /// Report structural problems
    Validate,
    Summarize {
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,
    },
    Components,
    Cycles,
    Paths {
        source: String,
        target: String,
        #[arg(long, default_value_t = DEFAULT_MAX_PATH_DEPTH)]
        max_depth: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("ERROR: {e:#}");
        std::process::exit(1);
    }
}

fn emit<T: Serialize>(text: bool, value: &T, render: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
    if text {
        print!("{}", render(value));
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

fn open(store: &mut DiagramStore, path: &Path) -> anyhow::Result<()> {
    store
        .open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    Ok(())
}

fn changed(text: bool, did: bool, what: &str) -> anyhow::Result<()> {
    emit(text, &did, |did| {
        if *did {
            format!("{what}\n")
        } else {
            "nothing to do\n".to_string()
        }
    })
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut store = DiagramStore::with_config(StoreConfig {
        max_history: cli.max_history,
    });
    let text = cli.text;

    if !matches!(cli.command, Command::New { .. }) {
        open(&mut store, &cli.file)?;
    }

    match cli.command {
        Command::New { name } => {
            store.new_diagram(&name);
            let path = store.save(Some(&cli.file))?;
            let diagram = store.diagram().context("no diagram after create")?;
            emit(text, diagram, report::diagram_report)?;
            tracing::info!(path = %path.display(), "created");
        }
        Command::Show => {
            let diagram = store.diagram().context("no diagram loaded")?;
            emit(text, diagram, report::diagram_report)?;
        }
        Command::AddNode {
            label,
            id,
            node_type,
            shape,
            x,
            y,
            tags,
            description,
        } => {
            let mut node = Node::new(label).with_tags(tags);
            if let Some(id) = id {
                node.id = id;
            }
            if let Some(node_type) = node_type {
                node.node_type = node_type;
            }
            if let Some(shape) = shape {
                node.shape = shape;
            }
            node.x = x.unwrap_or(node.x);
            node.y = y.unwrap_or(node.y);
            node.description = description.unwrap_or_default();
            let node = store.add_node(node)?;
            emit(text, &node, |n| report::nodes_table([n]))?;
        }
        Command::UpdateNode {
            id,
            label,
            node_type,
            shape,
            color,
            x,
            y,
            width,
            height,
            tags,
            description,
        } => {
            let update = NodeUpdate {
                label,
                node_type,
                shape,
                color,
                x,
                y,
                width,
                height,
                tags,
                description,
                ..NodeUpdate::default()
            };
            let node = store.update_node(&id, &update)?;
            emit(text, &node, |n| report::nodes_table([n]))?;
        }
        Command::DeleteNode { id } => {
            let deleted = store.delete_node(&id)?;
            changed(text, deleted, &format!("deleted node {id}"))?;
        }
        Command::Search { query } => {
            let query: NodeQuery = query.join(" ").parse()?;
            let hits = store.search_nodes(&query)?;
            emit(text, &hits, |hits| report::nodes_table(hits.iter().copied()))?;
        }
        Command::AddEdge {
            source,
            target,
            label,
            source_side,
            target_side,
            no_auto_route,
        } => {
            let new = NewEdge::new(source, target)
                .with_label(label)
                .with_sides(source_side, target_side);
            let edge = if no_auto_route {
                store.add_edge(new)?
            } else {
                store.add_edge_routed(new)?
            };
            emit(text, &edge, |e| report::edges_table([e]))?;
        }
        Command::UpdateEdge {
            id,
            label,
            color,
            width,
            style,
            arrow_start,
            arrow_end,
            source_side,
            target_side,
        } => {
            let update = EdgeUpdate {
                label,
                color,
                width,
                style,
                arrow_start,
                arrow_end,
                source_side,
                target_side,
                ..EdgeUpdate::default()
            };
            let edge = store.update_edge(&id, &update)?;
            emit(text, &edge, |e| report::edges_table([e]))?;
        }
        Command::DeleteEdge { id } => {
            let deleted = store.delete_edge(&id)?;
            changed(text, deleted, &format!("deleted edge {id}"))?;
        }
        Command::Layout {
            strategy,
            columns,
            horizontal,
        } => {
            let layout = match strategy {
                LayoutStrategy::Grid => Layout::Grid(GridOptions {
                    columns,
                    ..GridOptions::default()
                }),
                LayoutStrategy::Tree if horizontal => Layout::Tree(TreeOptions {
                    orientation: Orientation::Horizontal,
                    ..TreeOptions::default()
                }),
                other => Layout::from(other),
            };
            let did = store.apply_layout(layout)?;
            changed(text, did, "layout applied")?;
        }
        Command::Align { alignment, ids } => {
            let did = store.align_nodes(&ids, alignment)?;
            changed(text, did, "aligned")?;
        }
        Command::Distribute { axis, ids } => {
            let did = store.distribute_nodes(&ids, axis)?;
            changed(text, did, "distributed")?;
        }
        Command::Snap { grid } => {
            let did = store.snap_to_grid(grid)?;
            changed(text, did, "snapped")?;
        }
        Command::Pack => {
            let did = store.pack_nodes()?;
            changed(text, did, "packed")?;
        }
        Command::RouteEdges => {
            let routed = store.route_edges()?;
            emit(text, &routed, |n| format!("routed {n} edges\n"))?;
        }
        Command::Tag { ids, add, remove } => {
            let updated = store.bulk_update_tags(&ids, &add, &remove)?;
            emit(text, &updated, |nodes| report::nodes_table(nodes))?;
        }
        Command::Validate => {
            let diagram = store.diagram().context("no diagram loaded")?;
            let (issues, summary) = diagrammer::check(diagram);
            #[derive(Serialize)]
            struct Validation<'a> {
                issues: &'a [diagrammer::validate::Issue],
                summary: diagrammer::validate::ValidationSummary,
            }
            let out = Validation {
                issues: &issues,
                summary,
            };
            emit(text, &out, |v| report::issues_report(v.issues, &v.summary))?;
        }
        Command::Summarize { top } => {
            let diagram = store.diagram().context("no diagram loaded")?;
            let summary = analysis::summarize(diagram, top);
            emit(text, &summary, report::summary_report)?;
        }
        Command::Components => {
            let diagram = store.diagram().context("no diagram loaded")?;
            let components = analysis::connected_components(diagram);
            emit(text, &components, |c| report::components_report(c))?;
        }
        Command::Cycles => {
            let diagram = store.diagram().context("no diagram loaded")?;
            let cycles = analysis::find_cycles(diagram);
            emit(text, &cycles, |c| report::walks_report(c, true))?;
        }
        Command::Paths {
            source,
            target,
            max_depth,
        } => {
            let diagram = store.diagram().context("no diagram loaded")?;
            let paths = analysis::find_paths(diagram, &source, &target, max_depth);
            emit(text, &paths, |p| report::walks_report(p, false))?;
        }
    }

    if store.is_dirty() {
        let path = store.save(None)?;
        tracing::debug!(path = %path.display(), "saved changes");
    }
    Ok(())
}
