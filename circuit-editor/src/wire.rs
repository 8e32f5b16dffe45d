//! Wire Format
//!
//! The JSON shape a circuit graph is persisted and transmitted in:
//!
//! ```json
//! {
//!   "nodes": [{"id": "resistor-1", "type": "resistor", "position": {"x": 20, "y": 40},
//!              "data": {"type": "resistor"}, "measured": {"width": 96, "height": 96},
//!              "selected": false, "dragging": false}],
//!   "edges": [{"id": "evoltage-1-resistor-1", "source": "voltage-1", "sourceHandle": "right",
//!              "target": "resistor-1", "targetHandle": "left"}],
//!   "metadata": {"nodeCounter": 3, "lastModified": "2024-05-01T12:00:00Z"}
//! }
//! ```
//!
//! Unknown fields are rejected. Defaults for handles and measured
//! dimensions are applied only through [`WireGraph::with_api_defaults`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::editor::model::{
    CircuitEdge, CircuitNode, ComponentKind, Dimensions, EdgeStyle, NodeData, Position,
    DEFAULT_SOURCE_HANDLE, DEFAULT_TARGET_HANDLE,
};
use crate::editor::EditorState;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node {id} has type {node_type} but its data says {data_type}")]
    TypeMismatch {
        id: String,
        node_type: ComponentKind,
        data_type: ComponentKind,
    },

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Duplicate edge id: {0}")]
    DuplicateEdge(String),

    #[error("Edge {edge} repeats the connection between {from} and {to}")]
    DuplicateConnection { edge: String, from: String, to: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireGraph {
    #[serde(default)]
    pub nodes: Vec<WireNode>,
    #[serde(default)]
    pub edges: Vec<WireEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<WireMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WireNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub position: Position,
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<Dimensions>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub dragging: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WireEdge {
    pub id: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WireMetadata {
    pub node_counter: u64,
    pub last_modified: DateTime<Utc>,
}

impl WireGraph {
    pub fn from_json(json: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, WireError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fill absent handles (`right` / `left`) and measured dimensions (96×96).
    pub fn with_api_defaults(mut self) -> Self {
        for node in &mut self.nodes {
            node.measured.get_or_insert_with(Dimensions::default);
        }
        for edge in &mut self.edges {
            edge.source_handle
                .get_or_insert_with(|| DEFAULT_SOURCE_HANDLE.to_string());
            edge.target_handle
                .get_or_insert_with(|| DEFAULT_TARGET_HANDLE.to_string());
        }
        self
    }

    /// Check the structural invariants the editor relies on.
    pub fn check(&self) -> Result<(), WireError> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if node.kind != node.data.kind {
                return Err(WireError::TypeMismatch {
                    id: node.id.clone(),
                    node_type: node.kind,
                    data_type: node.data.kind,
                });
            }
            if !node_ids.insert(node.id.as_str()) {
                return Err(WireError::DuplicateNode(node.id.clone()));
            }
        }

        let mut edge_ids = HashSet::new();
        let mut pairs = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(WireError::DuplicateEdge(edge.id.clone()));
            }
            let pair = if edge.source <= edge.target {
                (edge.source.as_str(), edge.target.as_str())
            } else {
                (edge.target.as_str(), edge.source.as_str())
            };
            if !pairs.insert(pair) {
                return Err(WireError::DuplicateConnection {
                    edge: edge.id.clone(),
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                });
            }
        }
        Ok(())
    }
}

impl From<&CircuitNode> for WireNode {
    fn from(node: &CircuitNode) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind(),
            position: node.position,
            data: node.data.clone(),
            measured: node.measured,
            selected: node.selected,
            dragging: node.dragging,
        }
    }
}

impl From<WireNode> for CircuitNode {
    fn from(node: WireNode) -> Self {
        Self {
            id: node.id,
            position: node.position.snapped(),
            data: node.data,
            measured: node.measured,
            selected: node.selected,
            dragging: node.dragging,
        }
    }
}

impl From<&CircuitEdge> for WireEdge {
    fn from(edge: &CircuitEdge) -> Self {
        Self {
            id: edge.id.clone(),
            source: edge.source.clone(),
            source_handle: edge.source_handle.clone(),
            target: edge.target.clone(),
            target_handle: edge.target_handle.clone(),
            style: edge.style.clone(),
        }
    }
}

impl From<WireEdge> for CircuitEdge {
    fn from(edge: WireEdge) -> Self {
        Self {
            id: edge.id,
            source: edge.source,
            source_handle: edge.source_handle,
            target: edge.target,
            target_handle: edge.target_handle,
            style: edge.style,
        }
    }
}

impl EditorState {
    /// Snapshot of the graph as it is held, plus metadata.
    pub fn export_circuit(&self) -> WireGraph {
        WireGraph {
            nodes: self.nodes().iter().map(WireNode::from).collect(),
            edges: self.edges().iter().map(WireEdge::from).collect(),
            metadata: Some(WireMetadata {
                node_counter: self.node_counter(),
                last_modified: self.last_modified(),
            }),
        }
    }

    /// Snapshot ready to send to the backend, with every default filled in.
    pub fn export_to_api(&self) -> WireGraph {
        self.export_circuit().with_api_defaults()
    }

    /// Replace the working graph with `graph`.
    ///
    /// On error the current graph is left untouched.
    pub fn import_circuit(&mut self, graph: WireGraph) -> Result<(), WireError> {
        graph.check()?;

        let known: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in &graph.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !known.contains(endpoint.as_str()) {
                    tracing::warn!(
                        "Imported edge {} references missing node {}",
                        edge.id,
                        endpoint
                    );
                }
            }
        }

        let (counter, last_modified) = match graph.metadata {
            Some(meta) => (Some(meta.node_counter), Some(meta.last_modified)),
            None => (None, None),
        };
        let nodes: Vec<CircuitNode> = graph.nodes.into_iter().map(CircuitNode::from).collect();
        let edges: Vec<CircuitEdge> = graph.edges.into_iter().map(CircuitEdge::from).collect();

        tracing::debug!("Importing {} nodes and {} edges", nodes.len(), edges.len());
        self.replace_graph(nodes, edges, counter, last_modified);
        Ok(())
    }

    /// Replace the working graph with a payload received from the backend,
    /// filling absent handles and measured dimensions.
    pub fn import_from_api(&mut self, graph: WireGraph) -> Result<(), WireError> {
        self.import_circuit(graph.with_api_defaults())
    }
}
