//! Change notifications
//!
//! Every mutation of an [`EditorState`](super::EditorState) is announced on a
//! broadcast channel so a rendering layer can follow the graph without
//! holding references into it.

use super::model::{ComponentKind, Position};

/// Number of unread notifications a subscriber may fall behind by before it
/// starts missing them.
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum GraphChange {
    NodeAdded {
        id: String,
        kind: ComponentKind,
    },
    /// A node was removed together with every edge touching it
    NodeRemoved {
        id: String,
        removed_edges: Vec<String>,
    },
    NodeMoved {
        id: String,
        position: Position,
    },
    NodeDataChanged {
        id: String,
    },
    EdgeAdded {
        id: String,
    },
    EdgeRemoved {
        id: String,
    },
    /// Selection was replaced; `selected` lists the nodes now selected
    SelectionChanged {
        selected: Vec<String>,
    },
    Cleared,
    /// The whole graph was replaced by an import
    Imported {
        nodes: usize,
        edges: usize,
    },
}

impl GraphChange {
    /// Identifier of the node or edge this change is about, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            GraphChange::NodeAdded { id, .. }
            | GraphChange::NodeRemoved { id, .. }
            | GraphChange::NodeMoved { id, .. }
            | GraphChange::NodeDataChanged { id }
            | GraphChange::EdgeAdded { id }
            | GraphChange::EdgeRemoved { id } => Some(id),
            GraphChange::SelectionChanged { .. }
            | GraphChange::Cleared
            | GraphChange::Imported { .. } => None,
        }
    }
}
