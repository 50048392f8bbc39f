pub mod analysis;
pub mod display_width;
pub mod error;
pub mod history;
pub mod index;
pub mod layout;
pub mod model;
pub mod persist;
pub mod query;
pub mod report;
pub mod store;
pub mod validate;

pub use error::{DiagramError, EntityKind, Result};
pub use model::{Diagram, DiagramInfoUpdate, Edge, EdgeUpdate, Metadata, NewEdge, Node, NodeUpdate};
pub use query::NodeQuery;
pub use store::{ChangeEvent, DiagramStore, SaveInfo, StoreConfig};

/// Validation issues together with their tally.
pub fn check(diagram: &Diagram) -> (Vec<validate::Issue>, validate::ValidationSummary) {
    let issues = validate::validate_diagram(diagram);
    let summary = validate::validation_summary(&issues);
    (issues, summary)
}

/// Parses a serialized diagram, accepting legacy edge keys.
pub fn parse(input: &str) -> Result<Diagram> {
    Diagram::from_json(input).map_err(|e| DiagramError::invalid(format!("malformed diagram: {e}")))
}
