//! Circuit Editor State
//!
//! [`EditorState`] is the sole mutable owner of the working circuit graph for
//! one edit session. Nodes and edges are kept in insertion order, which is
//! also the order they are exported in.
//!
//! Lookups on missing identifiers never fail: mutations return `false` and
//! queries return `None` or an empty list.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::broadcast;

use super::events::{GraphChange, CHANGE_CHANNEL_CAPACITY};
use super::model::{
    CircuitEdge, CircuitNode, ComponentKind, EdgeStyle, NewEdge, NodeDataPatch, Position,
};

/// Value the node counter and every per-type sequence start from.
pub const INITIAL_NODE_COUNTER: u64 = 1;

#[derive(Debug)]
pub struct EditorState {
    nodes: Vec<CircuitNode>,
    edges: Vec<CircuitEdge>,

    /// Global count of components ever added; never decremented by removals
    node_counter: u64,

    /// Next sequence number per component kind, used to mint `{type}-{n}` ids
    sequences: HashMap<ComponentKind, u64>,

    last_modified: DateTime<Utc>,
    changes: broadcast::Sender<GraphChange>,
}

impl EditorState {
    /// Create an empty graph
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_counter: INITIAL_NODE_COUNTER,
            sequences: HashMap::new(),
            last_modified: Utc::now(),
            changes,
        }
    }

    /// Receive a [`GraphChange`] for every subsequent mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<GraphChange> {
        self.changes.subscribe()
    }

    /// Place a new component and return its identifier.
    ///
    /// The position (or [`DEFAULT_POSITION`](super::model::DEFAULT_POSITION))
    /// is snapped to the grid before it is stored.
    pub fn add_component(
        &mut self,
        kind: ComponentKind,
        position: Option<Position>,
        label: Option<String>,
    ) -> String {
        let id = self.next_node_id(kind);
        self.node_counter = self.node_counter.saturating_add(1);

        let position = match position {
            Some(p) if !p.is_finite() => {
                tracing::warn!("Ignoring non-finite position for {}", id);
                Position::default()
            }
            other => other.unwrap_or_default(),
        };
        let mut node = CircuitNode::new(id.clone(), kind, position);
        node.data.label = label;
        self.nodes.push(node);

        tracing::debug!("Added component {}", id);
        self.touch();
        self.emit(GraphChange::NodeAdded {
            id: id.clone(),
            kind,
        });
        id
    }

    /// Remove a node and every edge that references it.
    pub fn remove_node(&mut self, node_id: &str) -> bool {
        let Some(index) = self.nodes.iter().position(|n| n.id == node_id) else {
            return false;
        };
        self.nodes.remove(index);

        let mut removed_edges = Vec::new();
        self.edges.retain(|edge| {
            if edge.touches(node_id) {
                removed_edges.push(edge.id.clone());
                false
            } else {
                true
            }
        });

        tracing::debug!(
            "Removed node {} and {} connected edge(s)",
            node_id,
            removed_edges.len()
        );
        self.touch();
        self.emit(GraphChange::NodeRemoved {
            id: node_id.to_string(),
            removed_edges,
        });
        true
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> bool {
        let Some(index) = self.edges.iter().position(|e| e.id == edge_id) else {
            return false;
        };
        self.edges.remove(index);

        self.touch();
        self.emit(GraphChange::EdgeRemoved {
            id: edge_id.to_string(),
        });
        true
    }

    /// Connect two nodes, returning the edge identifier.
    ///
    /// If any edge already joins the two nodes (in either direction) its
    /// identifier is returned and nothing changes. Edge ids stay unique, see
    /// [`connect`](Self::connect).
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        edge_id: Option<String>,
        style: Option<EdgeStyle>,
    ) -> String {
        let mut request = NewEdge::new(source, target);
        request.id = edge_id;
        request.style = style;
        self.connect(request)
    }

    /// Like [`add_edge`](Self::add_edge), with full control over handles.
    ///
    /// An id already held by another edge gets a `-2`, `-3`, ... suffix.
    pub fn connect(&mut self, request: NewEdge) -> String {
        if let Some(existing) = self
            .edges
            .iter()
            .find(|e| e.connects(&request.source, &request.target))
        {
            return existing.id.clone();
        }

        for endpoint in [&request.source, &request.target] {
            if self.node(endpoint).is_none() {
                tracing::warn!("Edge endpoint {} does not exist in the circuit", endpoint);
            }
        }

        let mut edge = request.into_edge();
        if self.edge(&edge.id).is_some() {
            let unique = self.unique_edge_id(&edge.id);
            tracing::warn!("Edge id {} is taken, using {}", edge.id, unique);
            edge.id = unique;
        }
        let id = edge.id.clone();
        self.edges.push(edge);

        tracing::debug!("Added edge {}", id);
        self.touch();
        self.emit(GraphChange::EdgeAdded { id: id.clone() });
        id
    }

    /// Move a node; the new position is snapped to the grid.
    ///
    /// Non-finite coordinates are refused.
    pub fn update_node_position(&mut self, node_id: &str, position: Position) -> bool {
        if !position.is_finite() {
            return false;
        }
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == node_id) else {
            return false;
        };
        let snapped = position.snapped();
        node.position = snapped;

        self.touch();
        self.emit(GraphChange::NodeMoved {
            id: node_id.to_string(),
            position: snapped,
        });
        true
    }

    /// Shallow-merge `patch` into a node's data.
    pub fn update_node_data(&mut self, node_id: &str, patch: NodeDataPatch) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == node_id) else {
            return false;
        };
        node.data.merge(patch);

        self.touch();
        self.emit(GraphChange::NodeDataChanged {
            id: node_id.to_string(),
        });
        true
    }

    /// Mark exactly the given nodes as selected.
    pub fn select_nodes(&mut self, node_ids: &[&str]) {
        let mut selected = Vec::new();
        for node in &mut self.nodes {
            node.selected = node_ids.contains(&node.id.as_str());
            if node.selected {
                selected.push(node.id.clone());
            }
        }

        self.touch();
        self.emit(GraphChange::SelectionChanged { selected });
    }

    /// Empty the graph and restart identifier numbering.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.node_counter = INITIAL_NODE_COUNTER;
        self.sequences.clear();

        self.touch();
        self.emit(GraphChange::Cleared);
    }

    pub fn nodes(&self) -> &[CircuitNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CircuitEdge] {
        &self.edges
    }

    pub fn node(&self, node_id: &str) -> Option<&CircuitNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn edge(&self, edge_id: &str) -> Option<&CircuitEdge> {
        self.edges.iter().find(|e| e.id == edge_id)
    }

    pub fn nodes_by_type(&self, kind: ComponentKind) -> Vec<&CircuitNode> {
        self.nodes.iter().filter(|n| n.kind() == kind).collect()
    }

    /// Every edge where `node_id` is the source or the target.
    pub fn connected_edges(&self, node_id: &str) -> Vec<&CircuitEdge> {
        self.edges.iter().filter(|e| e.touches(node_id)).collect()
    }

    pub fn node_counter(&self) -> u64 {
        self.node_counter
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Swap in a complete graph (used by imports).
    ///
    /// The node counter becomes the larger of `node_counter` and
    /// `nodes.len() + 1`; per-type sequences continue after the highest
    /// numeric suffix found among the new node ids.
    pub(crate) fn replace_graph(
        &mut self,
        nodes: Vec<CircuitNode>,
        edges: Vec<CircuitEdge>,
        node_counter: Option<u64>,
        last_modified: Option<DateTime<Utc>>,
    ) {
        let floor = nodes.len() as u64 + 1;
        self.node_counter = node_counter.unwrap_or(INITIAL_NODE_COUNTER).max(floor);
        self.sequences = resume_sequences(&nodes);
        self.nodes = nodes;
        self.edges = edges;
        self.last_modified = last_modified.unwrap_or_else(Utc::now);

        self.emit(GraphChange::Imported {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
        });
    }

    /// Mint `{type}-{n}`, skipping numbers already taken by imported nodes.
    fn next_node_id(&mut self, kind: ComponentKind) -> String {
        let mut sequence = *self.sequences.get(&kind).unwrap_or(&INITIAL_NODE_COUNTER);
        let mut id = format!("{}-{}", kind, sequence);
        while self.node(&id).is_some() && sequence < u64::MAX {
            sequence += 1;
            id = format!("{}-{}", kind, sequence);
        }
        self.sequences.insert(kind, sequence.saturating_add(1));
        id
    }

    fn unique_edge_id(&self, base: &str) -> String {
        (2u64..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| self.edge(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    fn touch(&mut self) {
        self.last_modified = Utc::now();
    }

    fn emit(&self, change: GraphChange) {
        // No subscribers is not an error.
        let _ = self.changes.send(change);
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Next free sequence number per kind, given ids shaped like `{type}-{n}`.
///
/// The prefix decides the kind, not the node's own type, so a capacitor
/// imported as `resistor-4` still reserves `resistor-4`. Suffixes that
/// cannot be advanced past are ignored.
fn resume_sequences(nodes: &[CircuitNode]) -> HashMap<ComponentKind, u64> {
    let mut sequences = HashMap::new();
    for node in nodes {
        let Some((kind, next)) = ComponentKind::ALL.into_iter().find_map(|kind| {
            node.id
                .strip_prefix(kind.as_str())
                .and_then(|rest| rest.strip_prefix('-'))
                .and_then(|n| n.parse::<u64>().ok())
                .and_then(|n| n.checked_add(1))
                .map(|next| (kind, next))
        }) else {
            continue;
        };
        let entry = sequences.entry(kind).or_insert(INITIAL_NODE_COUNTER);
        *entry = (*entry).max(next);
    }
    sequences
}
