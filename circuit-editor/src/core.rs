//! Crate-wide error type and graph file helpers shared by the session and
//! the CLI.

use std::path::Path;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::editor::EditorState;
use crate::wire::{WireError, WireGraph};

#[derive(Debug, thiserror::Error)]
pub enum CircuitEditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Wire format error: {0}")]
    Wire(#[from] WireError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Read a wire-format graph file into a fresh editor state.
pub fn load_graph_file(path: &Path) -> Result<EditorState, CircuitEditorError> {
    let content = std::fs::read_to_string(path)?;
    let graph = WireGraph::from_json(&content)?;
    let mut state = EditorState::new();
    state.import_from_api(graph)?;
    tracing::debug!(
        "Loaded {} nodes and {} edges from {}",
        state.nodes().len(),
        state.edges().len(),
        path.display()
    );
    Ok(state)
}

/// Write the graph in wire format, with every default filled in.
pub fn save_graph_file(state: &EditorState, path: &Path) -> Result<(), CircuitEditorError> {
    let json = state.export_to_api().to_json_pretty()?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{ComponentKind, Position};

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuit.json");

        let mut state = EditorState::new();
        state.add_component(ComponentKind::Voltage, None, Some("V1".to_string()));
        state.add_component(ComponentKind::Capacitor, Some(Position::new(260.0, 80.0)), None);
        state.add_edge("voltage-1", "capacitor-1", None, None);
        save_graph_file(&state, &path).unwrap();

        let loaded = load_graph_file(&path).unwrap();
        assert_eq!(loaded.nodes().len(), 2);
        assert_eq!(loaded.edges().len(), 1);
        assert_eq!(loaded.node("voltage-1").unwrap().label(), Some("V1"));
        assert_eq!(loaded.node_counter(), state.node_counter());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_graph_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, CircuitEditorError::Io(_)));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\"nodes\": 3}").unwrap();
        assert!(matches!(
            load_graph_file(&path),
            Err(CircuitEditorError::Wire(_))
        ));
    }
}
