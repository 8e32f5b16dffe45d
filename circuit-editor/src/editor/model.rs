//! Circuit Graph Model
//!
//! Component nodes and connection edges backing the editor canvas.
//! Positions are always stored snapped to [`GRID_PITCH`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Spacing of the canvas grid.
pub const GRID_PITCH: f64 = 20.0;

/// Where a component lands when it is added without a position.
pub const DEFAULT_POSITION: Position = Position { x: 100.0, y: 100.0 };

pub const DEFAULT_NODE_WIDTH: f64 = 96.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 96.0;

/// Terminal used for the source end of an edge when none was recorded.
pub const DEFAULT_SOURCE_HANDLE: &str = "right";

/// Terminal used for the target end of an edge when none was recorded.
pub const DEFAULT_TARGET_HANDLE: &str = "left";

/// Snap a single coordinate to the nearest grid line (halves round up).
pub fn snap_to_grid(value: f64) -> f64 {
    // `+ 0.0` folds -0.0 into 0.0
    (value / GRID_PITCH + 0.5).floor() * GRID_PITCH + 0.0
}

/// The kinds of component that can be placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Voltage source
    Voltage,
    Resistor,
    Capacitor,
    Inductor,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Voltage,
        ComponentKind::Resistor,
        ComponentKind::Capacitor,
        ComponentKind::Inductor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Voltage => "voltage",
            ComponentKind::Resistor => "resistor",
            ComponentKind::Capacitor => "capacitor",
            ComponentKind::Inductor => "inductor",
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, ComponentKind::Voltage)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown component type: {0}")]
pub struct UnknownComponentKind(pub String);

impl FromStr for ComponentKind {
    type Err = UnknownComponentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voltage" | "voltage-source" | "source" => Ok(ComponentKind::Voltage),
            "resistor" => Ok(ComponentKind::Resistor),
            "capacitor" => Ok(ComponentKind::Capacitor),
            "inductor" => Ok(ComponentKind::Inductor),
            _ => Err(UnknownComponentKind(s.to_string())),
        }
    }
}

/// A point on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// This position moved to the nearest grid intersection.
    pub fn snapped(self) -> Self {
        Self {
            x: snap_to_grid(self.x),
            y: snap_to_grid(self.y),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        DEFAULT_POSITION
    }
}

/// Rendered size of a node as measured by the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_NODE_WIDTH,
            height: DEFAULT_NODE_HEIGHT,
        }
    }
}

/// Payload carried by a component node: its kind, label and analysis overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeData {
    #[serde(rename = "type")]
    pub kind: ComponentKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Current through the component from the last analysis, in amperes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,

    /// Terminal voltages from the last analysis, keyed by handle name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub voltages: BTreeMap<String, f64>,
}

impl NodeData {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            label: None,
            current: None,
            voltages: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Shallow merge: every field present in the patch replaces the current value.
    pub fn merge(&mut self, patch: NodeDataPatch) {
        if let Some(label) = patch.label {
            self.label = Some(label);
        }
        if let Some(current) = patch.current {
            self.current = Some(current);
        }
        if let Some(voltages) = patch.voltages {
            self.voltages = voltages;
        }
    }
}

/// Partial update for [`NodeData`]. The component kind is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeDataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltages: Option<BTreeMap<String, f64>>,
}

impl NodeDataPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_current(mut self, current: f64) -> Self {
        self.current = Some(current);
        self
    }

    pub fn with_voltage(mut self, handle: impl Into<String>, volts: f64) -> Self {
        self.voltages
            .get_or_insert_with(BTreeMap::new)
            .insert(handle.into(), volts);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.current.is_none() && self.voltages.is_none()
    }
}

/// A placed component instance
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitNode {
    pub id: String,
    pub position: Position,
    pub data: NodeData,
    pub measured: Option<Dimensions>,
    pub selected: bool,
    pub dragging: bool,
}

impl CircuitNode {
    pub fn new(id: impl Into<String>, kind: ComponentKind, position: Position) -> Self {
        Self {
            id: id.into(),
            position: position.snapped(),
            data: NodeData::new(kind),
            measured: None,
            selected: false,
            dragging: false,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.data.kind
    }

    pub fn label(&self) -> Option<&str> {
        self.data.label.as_deref()
    }
}

/// Visual style of a connection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EdgeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// Draw the wire with a moving dash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

impl EdgeStyle {
    pub fn stroke(color: impl Into<String>) -> Self {
        Self {
            stroke: Some(color.into()),
            ..Self::default()
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = Some(animated);
        self
    }
}

/// A wire between two component terminals
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitEdge {
    pub id: String,
    pub source: String,
    pub source_handle: Option<String>,
    pub target: String,
    pub target_handle: Option<String>,
    pub style: Option<EdgeStyle>,
}

impl CircuitEdge {
    /// Identifier given to an edge when the caller does not supply one.
    pub fn default_id(source: &str, target: &str) -> String {
        format!("e{}-{}", source, target)
    }

    /// Whether this edge joins `a` and `b`, in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    /// Whether `node_id` is either endpoint of this edge.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Request to connect two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdge {
    pub source: String,
    pub target: String,
    pub id: Option<String>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    pub style: Option<EdgeStyle>,
}

impl NewEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            id: None,
            source_handle: None,
            target_handle: None,
            style: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_handles(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_handle = Some(source.into());
        self.target_handle = Some(target.into());
        self
    }

    pub fn with_style(mut self, style: EdgeStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub(crate) fn into_edge(self) -> CircuitEdge {
        let id = self
            .id
            .unwrap_or_else(|| CircuitEdge::default_id(&self.source, &self.target));
        CircuitEdge {
            id,
            source: self.source,
            source_handle: self.source_handle,
            target: self.target,
            target_handle: self.target_handle,
            style: self.style,
        }
    }
}
