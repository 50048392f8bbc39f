use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("no diagram open")]
    NoActiveDiagram,

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("diagram file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Edge,
    Snapshot,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Node => f.write_str("node"),
            EntityKind::Edge => f.write_str("edge"),
            EntityKind::Snapshot => f.write_str("snapshot"),
        }
    }
}

impl DiagramError {
    pub fn node_not_found(id: &str) -> Self {
        DiagramError::NotFound {
            kind: EntityKind::Node,
            id: id.to_string(),
        }
    }

    pub fn edge_not_found(id: &str) -> Self {
        DiagramError::NotFound {
            kind: EntityKind::Edge,
            id: id.to_string(),
        }
    }

    pub fn snapshot_not_found(name: &str) -> Self {
        DiagramError::NotFound {
            kind: EntityKind::Snapshot,
            id: name.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        DiagramError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DiagramError>;
