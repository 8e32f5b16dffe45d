//! Circuit editor state layer: the node/edge model behind the canvas.

pub mod events;
pub mod model;
pub mod state;
pub mod validation;

pub use events::GraphChange;
pub use model::{
    snap_to_grid, CircuitEdge, CircuitNode, ComponentKind, Dimensions, EdgeStyle, NewEdge,
    NodeData, NodeDataPatch, Position, GRID_PITCH,
};
pub use state::EditorState;
pub use validation::{CircuitStats, ValidationReport};
