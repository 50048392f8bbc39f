use std::fmt::Write;

use crate::analysis::{Component, DiagramSummary};
use crate::display_width::{display_width, pad_to, truncate_to};
use crate::model::{Diagram, Edge, Node};
use crate::validate::{Issue, ValidationSummary};

/// Widest a single cell may grow before it is cut.
const MAX_CELL_WIDTH: usize = 48;

/// Column-aligned plain-text table.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = cells
            .into_iter()
            .map(|c| {
                let cell: String = c.into();
                truncate_to(&cell, MAX_CELL_WIDTH)
            })
            .collect();
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain([self.headers.len()])
            .max()
            .unwrap_or(0);
        let mut widths = vec![0; columns];
        for line in std::iter::once(&self.headers).chain(&self.rows) {
            for (i, cell) in line.iter().enumerate() {
                widths[i] = widths[i].max(display_width(cell));
            }
        }

        let mut out = String::new();
        render_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        render_line(&mut out, &rule, &widths);
        for row in &self.rows {
            render_line(&mut out, row, &widths);
        }
        out
    }
}

fn render_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let last = widths.len().saturating_sub(1);
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i == last {
            line.push_str(cell);
        } else {
            line.push_str(&pad_to(cell, *width));
            line.push_str("  ");
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn nodes_table<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> String {
    let mut table = Table::new(["ID", "LABEL", "TYPE", "SHAPE", "POSITION", "TAGS"]);
    for node in nodes {
        table.row([
            node.id.clone(),
            node.label.clone(),
            node.node_type.clone(),
            node.shape.as_str().to_string(),
            format!("{},{}", node.x, node.y),
            node.tags.join(","),
        ]);
    }
    if table.is_empty() {
        return "no matching nodes\n".to_string();
    }
    table.render()
}

pub fn edges_table<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> String {
    let mut table = Table::new(["ID", "SOURCE", "TARGET", "LABEL"]);
    for edge in edges {
        table.row([
            edge.id.clone(),
            edge.source.clone(),
            edge.target.clone(),
            edge.label.clone(),
        ]);
    }
    table.render()
}

pub fn diagram_report(diagram: &Diagram) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", diagram.name, diagram.id);
    let _ = writeln!(
        out,
        "{} nodes, {} edges, grid {}",
        diagram.nodes.len(),
        diagram.edges.len(),
        diagram.metadata.grid_size
    );
    if !diagram.nodes.is_empty() {
        out.push('\n');
        out.push_str(&nodes_table(&diagram.nodes));
    }
    if !diagram.edges.is_empty() {
        out.push('\n');
        out.push_str(&edges_table(&diagram.edges));
    }
    out
}

pub fn issues_report(issues: &[Issue], summary: &ValidationSummary) -> String {
    let mut out = String::new();
    if !issues.is_empty() {
        let mut table = Table::new(["SEVERITY", "NODE", "EDGE", "MESSAGE"]);
        for issue in issues {
            table.row([
                issue.severity.as_str(),
                issue.node_id.as_deref().unwrap_or("-"),
                issue.edge_id.as_deref().unwrap_or("-"),
                issue.message.as_str(),
            ]);
        }
        out.push_str(&table.render());
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{}: {} errors, {} warnings, {} info",
        if summary.valid { "valid" } else { "invalid" },
        summary.errors,
        summary.warnings,
        summary.info
    );
    out
}

pub fn summary_report(summary: &DiagramSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", summary.name);
    let _ = writeln!(
        out,
        "{} nodes, {} edges, {} components, {} orphans",
        summary.total_nodes, summary.total_edges, summary.connected_components, summary.orphan_count
    );
    if !summary.tags_in_use.is_empty() {
        let _ = writeln!(out, "tags: {}", summary.tags_in_use.join(", "));
    }

    let mut counts = Table::new(["KIND", "VALUE", "COUNT"]);
    for (node_type, n) in &summary.nodes_by_type {
        counts.row(["type".to_string(), node_type.clone(), n.to_string()]);
    }
    for (shape, n) in &summary.nodes_by_shape {
        counts.row(["shape".to_string(), shape.clone(), n.to_string()]);
    }
    if !counts.is_empty() {
        out.push('\n');
        out.push_str(&counts.render());
    }

    if !summary.most_connected_nodes.is_empty() {
        let mut ranked = Table::new(["ID", "LABEL", "IN", "OUT", "TOTAL"]);
        for c in &summary.most_connected_nodes {
            ranked.row([
                c.id.clone(),
                c.label.clone(),
                c.incoming.to_string(),
                c.outgoing.to_string(),
                c.connections.to_string(),
            ]);
        }
        out.push('\n');
        out.push_str(&ranked.render());
    }
    out
}

pub fn components_report(components: &[Component]) -> String {
    let mut table = Table::new(["#", "SIZE", "EDGES", "NODES"]);
    for (i, component) in components.iter().enumerate() {
        table.row([
            (i + 1).to_string(),
            component.size().to_string(),
            component.edge_count.to_string(),
            component.node_ids.join(", "),
        ]);
    }
    table.render()
}

/// One `a -> b -> c` line per path. Cycles close back on their first node.
pub fn walks_report(walks: &[Vec<String>], closed: bool) -> String {
    if walks.is_empty() {
        let none = if closed { "no cycles\n" } else { "no paths\n" };
        return none.to_string();
    }
    let mut out = String::new();
    for walk in walks {
        out.push_str(&walk.join(" -> "));
        if closed {
            if let Some(first) = walk.first() {
                let _ = write!(out, " -> {first}");
            }
        }
        out.push('\n');
    }
    out
}
