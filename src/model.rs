use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub const DEFAULT_NODE_LABEL: &str = "New Node";
pub const DEFAULT_DIAGRAM_NAME: &str = "Untitled Diagram";
pub const DEFAULT_GRID_SIZE: i32 = 20;

/// Node types the editor offers. Other strings are accepted but flagged in logs.
pub const RECOMMENDED_NODE_TYPES: [&str; 9] = [
    "component",
    "service",
    "database",
    "user",
    "external",
    "process",
    "decision",
    "note",
    "zone",
];

pub fn is_recommended_type(node_type: &str) -> bool {
    RECOMMENDED_NODE_TYPES.contains(&node_type)
}

fn short_hex() -> String {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(8);
    hex
}

pub fn generate_node_id() -> String {
    format!("n{}", short_hex())
}

pub fn generate_edge_id() -> String {
    format!("e{}", short_hex())
}

pub fn generate_diagram_id() -> String {
    format!("diagram-{}", short_hex())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    #[default]
    Rectangle,
    Ellipse,
    Diamond,
    Pill,
    Arrow,
    Triangle,
}

impl std::str::FromStr for NodeShape {
    type Err = crate::error::DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangle" => Ok(NodeShape::Rectangle),
            "ellipse" => Ok(NodeShape::Ellipse),
            "diamond" => Ok(NodeShape::Diamond),
            "pill" => Ok(NodeShape::Pill),
            "arrow" => Ok(NodeShape::Arrow),
            "triangle" => Ok(NodeShape::Triangle),
            other => Err(crate::error::DiagramError::invalid(format!("unknown shape `{other}`"))),
        }
    }
}

impl NodeShape {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeShape::Rectangle => "rectangle",
            NodeShape::Ellipse => "ellipse",
            NodeShape::Diamond => "diamond",
            NodeShape::Pill => "pill",
            NodeShape::Arrow => "arrow",
            NodeShape::Triangle => "triangle",
        }
    }
}

/// Stroke pattern, shared by node borders and edge lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowType {
    #[default]
    None,
    Arrow,
    Filled,
    Diamond,
    Circle,
}

impl std::str::FromStr for LineStyle {
    type Err = crate::error::DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(LineStyle::Solid),
            "dashed" => Ok(LineStyle::Dashed),
            "dotted" => Ok(LineStyle::Dotted),
            other => Err(crate::error::DiagramError::invalid(format!(
                "unknown line style `{other}` (expected solid, dashed or dotted)"
            ))),
        }
    }
}

impl std::str::FromStr for ArrowType {
    type Err = crate::error::DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ArrowType::None),
            "arrow" => Ok(ArrowType::Arrow),
            "filled" => Ok(ArrowType::Filled),
            "diamond" => Ok(ArrowType::Diamond),
            "circle" => Ok(ArrowType::Circle),
            other => Err(crate::error::DiagramError::invalid(format!("unknown arrow `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl std::str::FromStr for Side {
    type Err = crate::error::DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Side::Top),
            "right" => Ok(Side::Right),
            "bottom" => Ok(Side::Bottom),
            "left" => Ok(Side::Left),
            other => Err(crate::error::DiagramError::invalid(format!(
                "unknown side `{other}` (expected top, right, bottom or left)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub shape: NodeShape,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub tags: Vec<String>,
    pub description: String,
    pub border_style: LineStyle,
    /// 0.0 is hollow, 1.0 is a solid fill.
    pub fill_opacity: f64,
    /// Lower values render further back; zones use negative values.
    pub z_index: i32,
    /// Degrees.
    pub rotation: f64,
}

impl Default for Node {
    fn default() -> Self {
        Node {
            id: generate_node_id(),
            label: DEFAULT_NODE_LABEL.to_string(),
            node_type: "component".to_string(),
            shape: NodeShape::Rectangle,
            color: "#3478f6".to_string(),
            x: 100.0,
            y: 100.0,
            width: 150.0,
            height: 80.0,
            tags: Vec::new(),
            description: String::new(),
            border_style: LineStyle::Solid,
            fill_opacity: 1.0,
            z_index: 0,
            rotation: 0.0,
        }
    }
}

impl Node {
    pub fn new(label: impl Into<String>) -> Self {
        Node {
            label: label.into(),
            ..Node::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    pub fn with_shape(mut self, shape: NodeShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            x: self.x,
            y: self.y,
            right: self.x + self.width,
            bottom: self.y + self.height,
        }
    }

    pub fn has_recommended_type(&self) -> bool {
        is_recommended_type(&self.node_type)
    }

    pub fn has_default_label(&self) -> bool {
        self.label.trim().is_empty() || self.label == DEFAULT_NODE_LABEL
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EdgeRecord")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
    pub color: String,
    pub width: f64,
    pub style: LineStyle,
    pub arrow_start: ArrowType,
    pub arrow_end: ArrowType,
    pub arrow_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_side: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_side: Option<Side>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Edge {
            id: generate_edge_id(),
            source: source.into(),
            target: target.into(),
            label: String::new(),
            color: default_edge_color(),
            width: default_edge_width(),
            style: LineStyle::Solid,
            arrow_start: ArrowType::None,
            arrow_end: default_arrow_end(),
            arrow_size: default_arrow_size(),
            source_side: None,
            target_side: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

fn default_edge_color() -> String {
    "#666666".to_string()
}

fn default_edge_width() -> f64 {
    2.0
}

fn default_arrow_end() -> ArrowType {
    ArrowType::Filled
}

fn default_arrow_size() -> f64 {
    12.0
}

/// Wire form of an edge. Legacy documents name the endpoints `from`/`to` or
/// `from_node`/`to_node`; those only apply when `source`/`target` is absent.
#[derive(Deserialize)]
struct EdgeRecord {
    #[serde(default = "generate_edge_id")]
    id: String,
    source: Option<String>,
    target: Option<String>,
    from: Option<String>,
    to: Option<String>,
    from_node: Option<String>,
    to_node: Option<String>,
    #[serde(default)]
    label: String,
    #[serde(default = "default_edge_color")]
    color: String,
    #[serde(default = "default_edge_width")]
    width: f64,
    #[serde(default)]
    style: LineStyle,
    #[serde(default)]
    arrow_start: ArrowType,
    #[serde(default = "default_arrow_end")]
    arrow_end: ArrowType,
    #[serde(default = "default_arrow_size")]
    arrow_size: f64,
    source_side: Option<Side>,
    target_side: Option<Side>,
}

impl TryFrom<EdgeRecord> for Edge {
    type Error = String;

    fn try_from(record: EdgeRecord) -> Result<Self, Self::Error> {
        let source = record
            .source
            .or(record.from)
            .or(record.from_node)
            .ok_or_else(|| format!("edge `{}` has no source", record.id))?;
        let target = record
            .target
            .or(record.to)
            .or(record.to_node)
            .ok_or_else(|| format!("edge `{}` has no target", record.id))?;
        Ok(Edge {
            id: record.id,
            source,
            target,
            label: record.label,
            color: record.color,
            width: record.width,
            style: record.style,
            arrow_start: record.arrow_start,
            arrow_end: record.arrow_end,
            arrow_size: record.arrow_size,
            source_side: record.source_side,
            target_side: record.target_side,
        })
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn default_grid_size() -> i32 {
    DEFAULT_GRID_SIZE
}

/// Accepts RFC 3339 timestamps as well as naive ISO-8601 ones, which are read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(stamp.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp `{raw}`: {e}"))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default = "now", deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "now", deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Snap-to-grid size in pixels, 0 disables snapping.
    #[serde(default = "default_grid_size")]
    pub grid_size: i32,
    #[serde(default)]
    pub show_grid: bool,
}

impl Default for Metadata {
    fn default() -> Self {
        let stamp = Utc::now();
        Metadata {
            created_at: stamp,
            updated_at: stamp,
            grid_size: DEFAULT_GRID_SIZE,
            show_grid: true,
        }
    }
}

impl Metadata {
    /// Metadata for a document that carried none. Grid lines start hidden.
    fn absent() -> Self {
        Metadata {
            show_grid: false,
            ..Metadata::default()
        }
    }
}

fn default_diagram_name() -> String {
    DEFAULT_DIAGRAM_NAME.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default = "generate_diagram_id")]
    pub id: String,
    #[serde(default = "default_diagram_name")]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default = "Metadata::absent")]
    pub metadata: Metadata,
}

impl Default for Diagram {
    fn default() -> Self {
        Diagram::new(DEFAULT_DIAGRAM_NAME)
    }
}

impl Diagram {
    pub fn new(name: impl Into<String>) -> Self {
        Diagram {
            id: generate_diagram_id(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            metadata: Metadata::default(),
        }
    }

    /// Linear scan. The store keeps an index for hot paths.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn from_json(input: &str) -> serde_json::Result<Diagram> {
        serde_json::from_str(input)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Fields accepted when creating an edge. `from`/`to` are read as aliases.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewEdge {
    #[serde(alias = "from", alias = "from_node")]
    pub source: Option<String>,
    #[serde(alias = "to", alias = "to_node")]
    pub target: Option<String>,
    #[serde(default)]
    pub label: String,
    pub source_side: Option<Side>,
    pub target_side: Option<Side>,
}

impl NewEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        NewEdge {
            source: Some(source.into()),
            target: Some(target.into()),
            ..NewEdge::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_sides(mut self, source_side: Option<Side>, target_side: Option<Side>) -> Self {
        self.source_side = source_side;
        self.target_side = target_side;
        self
    }
}

/// Partial node update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeUpdate {
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub shape: Option<NodeShape>,
    pub color: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
    pub border_style: Option<LineStyle>,
    pub fill_opacity: Option<f64>,
    pub z_index: Option<i32>,
    pub rotation: Option<f64>,
}

impl NodeUpdate {
    pub fn apply(&self, node: &mut Node) {
        if let Some(label) = &self.label {
            node.label = label.clone();
        }
        if let Some(node_type) = &self.node_type {
            node.node_type = node_type.clone();
        }
        if let Some(shape) = self.shape {
            node.shape = shape;
        }
        if let Some(color) = &self.color {
            node.color = color.clone();
        }
        if let Some(x) = self.x {
            node.x = x;
        }
        if let Some(y) = self.y {
            node.y = y;
        }
        if let Some(width) = self.width {
            node.width = width;
        }
        if let Some(height) = self.height {
            node.height = height;
        }
        if let Some(tags) = &self.tags {
            node.tags = tags.clone();
        }
        if let Some(description) = &self.description {
            node.description = description.clone();
        }
        if let Some(border_style) = self.border_style {
            node.border_style = border_style;
        }
        if let Some(fill_opacity) = self.fill_opacity {
            node.fill_opacity = fill_opacity;
        }
        if let Some(z_index) = self.z_index {
            node.z_index = z_index;
        }
        if let Some(rotation) = self.rotation {
            node.rotation = rotation;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EdgeUpdate {
    pub label: Option<String>,
    pub color: Option<String>,
    pub width: Option<f64>,
    pub style: Option<LineStyle>,
    pub arrow_start: Option<ArrowType>,
    pub arrow_end: Option<ArrowType>,
    pub arrow_size: Option<f64>,
    pub source_side: Option<Side>,
    pub target_side: Option<Side>,
}

impl EdgeUpdate {
    pub fn apply(&self, edge: &mut Edge) {
        if let Some(label) = &self.label {
            edge.label = label.clone();
        }
        if let Some(color) = &self.color {
            edge.color = color.clone();
        }
        if let Some(width) = self.width {
            edge.width = width;
        }
        if let Some(style) = self.style {
            edge.style = style;
        }
        if let Some(arrow_start) = self.arrow_start {
            edge.arrow_start = arrow_start;
        }
        if let Some(arrow_end) = self.arrow_end {
            edge.arrow_end = arrow_end;
        }
        if let Some(arrow_size) = self.arrow_size {
            edge.arrow_size = arrow_size;
        }
        if self.source_side.is_some() {
            edge.source_side = self.source_side;
        }
        if self.target_side.is_some() {
            edge.target_side = self.target_side;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiagramInfoUpdate {
    pub name: Option<String>,
    pub grid_size: Option<i32>,
    pub show_grid: Option<bool>,
}
