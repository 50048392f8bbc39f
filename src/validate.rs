use std::collections::HashSet;

use serde::Serialize;

use crate::model::Diagram;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Broken state that must be fixed.
    Error,
    Warning,
    /// May well be intentional.
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
}

impl Issue {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Issue {
            severity,
            message: message.into(),
            node_id: None,
            edge_id: None,
        }
    }

    fn on_node(mut self, id: &str) -> Self {
        self.node_id = Some(id.to_string());
        self
    }

    fn on_edge(mut self, id: &str) -> Self {
        self.edge_id = Some(id.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub valid: bool,
}

/// Reports structural problems. Never fails: broken input is what it is for.
pub fn validate_diagram(diagram: &Diagram) -> Vec<Issue> {
    if diagram.nodes.is_empty() {
        return vec![Issue::new(Severity::Info, "Diagram has no nodes")];
    }

    let mut issues = Vec::new();
    let node_ids: HashSet<&str> = diagram.nodes.iter().map(|n| n.id.as_str()).collect();

    let connected: HashSet<&str> = diagram
        .edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();
    let orphans: Vec<String> = diagram
        .nodes
        .iter()
        .filter(|n| !connected.contains(n.id.as_str()))
        .map(|n| format!("{} ({})", n.label, n.id))
        .collect();
    if !orphans.is_empty() {
        issues.push(Issue::new(
            Severity::Warning,
            format!("Orphan nodes (no connections): {}", orphans.join(", ")),
        ));
    }

    for node in diagram.nodes.iter().filter(|n| n.has_default_label()) {
        issues.push(Issue::new(Severity::Warning, "Node has default or empty label").on_node(&node.id));
    }

    for edge in &diagram.edges {
        if !node_ids.contains(edge.source.as_str()) {
            issues.push(
                Issue::new(
                    Severity::Error,
                    format!("Edge references non-existent source node: {}", edge.source),
                )
                .on_edge(&edge.id),
            );
        }
        if !node_ids.contains(edge.target.as_str()) {
            issues.push(
                Issue::new(
                    Severity::Error,
                    format!("Edge references non-existent target node: {}", edge.target),
                )
                .on_edge(&edge.id),
            );
        }
    }

    for edge in diagram.edges.iter().filter(|e| e.source == e.target) {
        issues.push(
            Issue::new(Severity::Warning, "Self-referencing edge (node points to itself)")
                .on_edge(&edge.id)
                .on_node(&edge.source),
        );
    }

    // Ordered pairs: a -> b and b -> a are distinct.
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for edge in &diagram.edges {
        if !seen.insert((edge.source.as_str(), edge.target.as_str())) {
            issues.push(
                Issue::new(
                    Severity::Warning,
                    format!("Duplicate edge from {} to {}", edge.source, edge.target),
                )
                .on_edge(&edge.id),
            );
        }
    }

    issues
}

pub fn validation_summary(issues: &[Issue]) -> ValidationSummary {
    let count = |severity| issues.iter().filter(|i| i.severity == severity).count();
    let errors = count(Severity::Error);
    ValidationSummary {
        total: issues.len(),
        errors,
        warnings: count(Severity::Warning),
        info: count(Severity::Info),
        valid: errors == 0,
    }
}
