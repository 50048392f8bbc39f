use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::{DiagramError, Result};
use crate::model::Diagram;

pub fn read_diagram(path: &Path) -> Result<Diagram> {
    let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => DiagramError::FileNotFound(path.to_path_buf()),
        _ => DiagramError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let diagram = Diagram::from_json(&raw).map_err(|source| DiagramError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        nodes = diagram.nodes.len(),
        edges = diagram.edges.len(),
        "read diagram"
    );
    Ok(diagram)
}

/// Writes pretty-printed JSON, creating missing parent directories.
pub fn write_diagram(path: &Path, diagram: &Diagram) -> Result<()> {
    let io_err = |source: std::io::Error| DiagramError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = diagram.to_json().map_err(|source| DiagramError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)?;
    debug!(path = %path.display(), diagram = %diagram.id, "wrote diagram");
    Ok(())
}
