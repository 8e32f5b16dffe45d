//! Circuit Editor - state layer for visual circuit diagram editors
//!
//! This library holds the node/edge graph behind a circuit canvas, converts
//! it to and from the JSON wire format the backend persists, and talks to
//! that backend to load, save and analyze circuits.
//!
//! # Quick Start
//!
//! ```
//! use circuit_editor::prelude::*;
//!
//! let mut state = EditorState::new();
//! let source = state.add_component(ComponentKind::Voltage, None, None);
//! let load = state.add_component(ComponentKind::Resistor, Some(Position::new(223.0, 91.0)), None);
//! let wire = state.add_edge(&source, &load, None, None);
//!
//! assert_eq!(wire, "evoltage-1-resistor-1");
//! assert_eq!(state.node(&load).unwrap().position, Position::new(220.0, 100.0));
//! assert!(state.validate_circuit().warnings.is_empty());
//! ```
//!
//! # Features
//!
//! - **Graph editing**: grid-snapped components, idempotent connections,
//!   cascading removal, change notifications
//! - **Wire format**: strict schema with explicit defaulting
//! - **Validation**: connectivity and voltage-source warnings
//! - **Backend access**: REST client and in-memory store behind one trait

pub mod api;
pub mod config;
pub mod core;
pub mod editor;
pub mod session;
pub mod wire;

// Re-export main types
pub use api::{
    AnalysisRequest, AnalysisResponse, ApiError, CircuitApi, CircuitId, CircuitPatch,
    CircuitRecord, HttpCircuitApi, InMemoryCircuitApi, NewCircuit, Page, STATIC_ANALYSIS,
};
pub use config::{ApiConfig, ConfigError};
pub use crate::core::{load_graph_file, save_graph_file, CircuitEditorError};
pub use editor::{
    CircuitEdge, CircuitNode, CircuitStats, ComponentKind, EdgeStyle, EditorState, GraphChange,
    NewEdge, NodeDataPatch, Position, ValidationReport, GRID_PITCH,
};
pub use session::{CircuitEditor, SavingIndicator};
pub use wire::{WireError, WireGraph};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CircuitApi, CircuitEditor, CircuitEditorError, ComponentKind, EdgeStyle, EditorState,
        NewEdge, NodeDataPatch, Position, ValidationReport, WireGraph,
    };
}
