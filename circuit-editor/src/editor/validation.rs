//! Circuit validation and statistics
//!
//! Validation only ever produces warnings: nothing found here blocks a save
//! or an analysis run. The `errors` list is kept in the report shape so
//! callers can gate on it once hard rules exist.

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::model::ComponentKind;
use super::state::EditorState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Aggregate counts over the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Count per component kind; every kind is present, possibly with zero
    pub component_counts: BTreeMap<ComponentKind, usize>,
}

impl CircuitStats {
    pub fn count(&self, kind: ComponentKind) -> usize {
        self.component_counts.get(&kind).copied().unwrap_or(0)
    }
}

impl EditorState {
    pub fn circuit_stats(&self) -> CircuitStats {
        let mut component_counts: BTreeMap<ComponentKind, usize> =
            ComponentKind::ALL.iter().map(|&kind| (kind, 0)).collect();
        for node in self.nodes() {
            *component_counts.entry(node.kind()).or_insert(0) += 1;
        }

        CircuitStats {
            total_nodes: self.nodes().len(),
            total_edges: self.edges().len(),
            component_counts,
        }
    }

    /// Groups of node ids joined by edges, in node order.
    ///
    /// A node with no edges forms a group of its own. Edges pointing at
    /// missing nodes are ignored.
    pub fn networks(&self) -> Vec<Vec<String>> {
        let index: HashMap<&str, usize> = self
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut sets = UnionFind::new(self.nodes().len());
        for edge in self.edges() {
            if let (Some(&a), Some(&b)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) {
                sets.union(a, b);
            }
        }

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        for (i, node) in self.nodes().iter().enumerate() {
            let root = sets.find(i);
            let slot = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(node.id.clone());
        }
        groups
    }

    pub fn validate_circuit(&self) -> ValidationReport {
        let errors = Vec::new();
        let mut warnings = Vec::new();

        let unconnected: Vec<&str> = self
            .nodes()
            .iter()
            .filter(|n| self.connected_edges(&n.id).is_empty())
            .map(|n| n.id.as_str())
            .collect();
        if !unconnected.is_empty() {
            warnings.push(format!(
                "{} component(s) not connected: {}",
                unconnected.len(),
                unconnected.join(", ")
            ));
        }

        if !self.nodes().is_empty() && !self.nodes().iter().any(|n| n.kind().is_source()) {
            warnings.push("Circuit has no voltage source".to_string());
        }

        for edge in self.edges() {
            for endpoint in [&edge.source, &edge.target] {
                if self.node(endpoint).is_none() {
                    warnings.push(format!(
                        "Connection {} references missing component {}",
                        edge.id, endpoint
                    ));
                }
            }
        }

        let wired = self
            .networks()
            .into_iter()
            .filter(|group| {
                group
                    .iter()
                    .any(|id| !self.connected_edges(id).is_empty())
            })
            .count();
        if wired > 1 {
            warnings.push(format!(
                "Circuit is split into {} separate networks",
                wired
            ));
        }

        for warning in &warnings {
            tracing::debug!("Validation warning: {}", warning);
        }

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::model::Position;

    #[test]
    fn test_stats_scenario() {
        let mut state = EditorState::new();
        assert_eq!(state.add_component(ComponentKind::Voltage, None, None), "voltage-1");
        assert_eq!(state.add_component(ComponentKind::Resistor, None, None), "resistor-1");
        assert_eq!(
            state.add_edge("voltage-1", "resistor-1", None, None),
            "evoltage-1-resistor-1"
        );

        let stats = state.circuit_stats();
        assert_eq!(stats.total_nodes, 2);
        assert_eq!(stats.total_edges, 1);
        assert_eq!(stats.count(ComponentKind::Voltage), 1);
        assert_eq!(stats.count(ComponentKind::Resistor), 1);
        assert_eq!(stats.count(ComponentKind::Capacitor), 0);
        assert_eq!(stats.count(ComponentKind::Inductor), 0);
    }

    #[test]
    fn test_stats_json_shape() {
        let stats = EditorState::new().circuit_stats();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "totalNodes": 0,
                "totalEdges": 0,
                "componentCounts": {"voltage": 0, "resistor": 0, "capacitor": 0, "inductor": 0}
            })
        );
    }

    #[test]
    fn test_validate_empty() {
        let report = EditorState::new().validate_circuit();
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_validate_lone_resistor() {
        let mut state = EditorState::new();
        state.add_component(ComponentKind::Resistor, None, None);

        let report = state.validate_circuit();
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("not connected"));
        assert!(report.warnings[1].contains("voltage source"));
    }

    #[test]
    fn test_validate_complete_loop() {
        let mut state = EditorState::new();
        state.add_component(ComponentKind::Voltage, None, None);
        state.add_component(ComponentKind::Resistor, None, None);
        state.add_edge("voltage-1", "resistor-1", None, None);

        let report = state.validate_circuit();
        assert!(report.is_valid);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_validate_dangling_edge() {
        let mut state = EditorState::new();
        state.add_component(ComponentKind::Voltage, None, None);
        state.add_edge("voltage-1", "resistor-9", None, None);

        let report = state.validate_circuit();
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("resistor-9"));
    }

    #[test]
    fn test_networks_and_split_warning() {
        let mut state = EditorState::new();
        for _ in 0..2 {
            state.add_component(ComponentKind::Voltage, None, None);
            state.add_component(ComponentKind::Resistor, Some(Position::new(200.0, 0.0)), None);
        }
        state.add_component(ComponentKind::Inductor, None, None);
        state.add_edge("voltage-1", "resistor-1", None, None);
        state.add_edge("voltage-2", "resistor-2", None, None);

        let networks = state.networks();
        assert_eq!(networks.len(), 3);
        assert_eq!(networks[0], vec!["voltage-1", "resistor-1"]);
        assert_eq!(networks[1], vec!["voltage-2", "resistor-2"]);
        assert_eq!(networks[2], vec!["inductor-1"]);

        let report = state.validate_circuit();
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("split into 2 separate networks")));
    }
}
