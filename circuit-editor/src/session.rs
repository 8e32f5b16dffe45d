//! Edit session
//!
//! A [`CircuitEditor`] pairs one persisted circuit with the [`EditorState`]
//! being edited and the [`CircuitApi`] it was loaded from.
//!
//! Saving and analysis take `&mut self`, so one session never has two saves
//! in flight. Different sessions editing the same circuit are not
//! coordinated: the backend keeps whichever save arrives last.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::{
    AnalysisRequest, AnalysisResponse, CircuitApi, CircuitId, CircuitPatch, CircuitRecord,
    NewCircuit,
};
use crate::core::CircuitEditorError;
use crate::editor::{EditorState, NodeDataPatch};
use crate::wire::WireError;

/// Per-component entry of an analysis response
#[derive(Debug, Deserialize)]
struct NodeResult {
    #[serde(default)]
    current: Option<f64>,
    #[serde(default)]
    voltages: Option<BTreeMap<String, f64>>,
}

/// Read-only view of a session's "saving" flag, for UI feedback
#[derive(Debug, Clone)]
pub struct SavingIndicator(Arc<AtomicBool>);

impl SavingIndicator {
    pub fn is_saving(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Raises the saving flag for as long as it lives.
struct SavingGuard(Arc<AtomicBool>);

impl SavingGuard {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag.clone())
    }
}

impl Drop for SavingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct CircuitEditor {
    api: Arc<dyn CircuitApi>,
    record: CircuitRecord,
    state: EditorState,
    saving: Arc<AtomicBool>,
}

impl CircuitEditor {
    /// Fetch a circuit and start editing it.
    pub async fn load(api: Arc<dyn CircuitApi>, id: CircuitId) -> Result<Self, CircuitEditorError> {
        let record = match api.get_circuit(id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Failed to load circuit {}: {}", id, e);
                return Err(e.into());
            }
        };
        Self::open(api, record)
    }

    /// Create a circuit on the backend and start editing it.
    pub async fn create(
        api: Arc<dyn CircuitApi>,
        circuit: NewCircuit,
    ) -> Result<Self, CircuitEditorError> {
        let record = match api.create_circuit(&circuit).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Failed to create circuit {:?}: {}", circuit.name, e);
                return Err(e.into());
            }
        };
        Self::open(api, record)
    }

    /// Start editing a record that has already been fetched.
    pub fn open(api: Arc<dyn CircuitApi>, record: CircuitRecord) -> Result<Self, CircuitEditorError> {
        let mut state = EditorState::new();
        if let Some(graph) = record.graph.clone() {
            state.import_from_api(graph)?;
        }

        tracing::info!(
            "Opened circuit {} ({}) via {}: {} components, {} connections",
            record.id,
            record.name,
            api.name(),
            state.nodes().len(),
            state.edges().len()
        );

        Ok(Self {
            api,
            record,
            state,
            saving: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn id(&self) -> CircuitId {
        self.record.id
    }

    /// Local copy of the persisted record as of the last load or save
    pub fn record(&self) -> &CircuitRecord {
        &self.record
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    pub fn saving_indicator(&self) -> SavingIndicator {
        SavingIndicator(self.saving.clone())
    }

    /// Push the current graph to the backend.
    ///
    /// Validation warnings are logged but never block the save.
    pub async fn save_circuit(&mut self) -> Result<&CircuitRecord, CircuitEditorError> {
        let report = self.state.validate_circuit();
        for warning in &report.warnings {
            tracing::warn!("Circuit {}: {}", self.record.id, warning);
        }

        let patch = CircuitPatch::new().with_graph(self.state.export_to_api());
        let result = {
            let _saving = SavingGuard::raise(&self.saving);
            self.api.update_circuit(self.record.id, &patch).await
        };

        match result {
            Ok(record) => {
                tracing::info!(
                    "Saved circuit {} ({} components)",
                    record.id,
                    self.state.nodes().len()
                );
                self.record = record;
                Ok(&self.record)
            }
            Err(e) => {
                tracing::error!("Failed to save circuit {}: {}", self.record.id, e);
                Err(e.into())
            }
        }
    }

    /// Save, then ask the backend to analyze the saved circuit.
    pub async fn analyze_circuit(
        &mut self,
        analysis_type: &str,
    ) -> Result<AnalysisResponse, CircuitEditorError> {
        self.save_circuit().await?;

        let request = AnalysisRequest::new(self.record.id, analysis_type);
        match self.api.analyze_circuit(&request).await {
            Ok(response) => {
                tracing::info!("Analysis {} finished for circuit {}", analysis_type, self.record.id);
                Ok(response)
            }
            Err(e) => {
                tracing::error!("Failed to analyze circuit {}: {}", self.record.id, e);
                Err(e.into())
            }
        }
    }

    /// Change the name and/or description without touching the graph.
    pub async fn update_details(
        &mut self,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<&CircuitRecord, CircuitEditorError> {
        let patch = CircuitPatch {
            name,
            description,
            graph: None,
        };
        if patch.is_empty() {
            return Ok(&self.record);
        }

        match self.api.update_circuit(self.record.id, &patch).await {
            Ok(record) => {
                self.record = record;
                Ok(&self.record)
            }
            Err(e) => {
                tracing::error!("Failed to update circuit {}: {}", self.record.id, e);
                Err(e.into())
            }
        }
    }

    /// Overlay analysis values on one component.
    pub fn apply_measurements(
        &mut self,
        node_id: &str,
        current: Option<f64>,
        voltages: BTreeMap<String, f64>,
    ) -> bool {
        let patch = NodeDataPatch {
            label: None,
            current,
            voltages: (!voltages.is_empty()).then_some(voltages),
        };
        self.state.update_node_data(node_id, patch)
    }

    /// Overlay per-component values from an analysis response.
    ///
    /// Looks for a `node_results` object mapping node ids to
    /// `{"current": .., "voltages": {..}}`; other keys in an entry are
    /// ignored. Returns how many components were updated. Entries for ids
    /// not in the graph, or whose values have the wrong shape, are skipped
    /// with a warning.
    pub fn apply_analysis(&mut self, response: &AnalysisResponse) -> Result<usize, CircuitEditorError> {
        let Some(results) = response.get("node_results") else {
            return Ok(0);
        };
        let results: BTreeMap<String, serde_json::Value> =
            serde_json::from_value(results.clone()).map_err(WireError::from)?;

        let mut applied = 0;
        for (node_id, value) in results {
            let result: NodeResult = match serde_json::from_value(value) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Unreadable analysis result for {}: {}", node_id, e);
                    continue;
                }
            };
            let patch = NodeDataPatch {
                label: None,
                current: result.current,
                voltages: result.voltages,
            };
            if self.state.update_node_data(&node_id, patch) {
                applied += 1;
            } else {
                tracing::warn!("Analysis result for unknown component {}", node_id);
            }
        }
        Ok(applied)
    }
}
