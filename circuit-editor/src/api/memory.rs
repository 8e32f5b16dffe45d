//! In-process circuit store implementing [`CircuitApi`].
//!
//! Used by tests and offline tooling. Analysis returns a small summary of
//! the stored graph instead of running a solver.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::client::CircuitApi;
use super::{
    AnalysisRequest, AnalysisResponse, ApiError, CircuitId, CircuitPatch, CircuitRecord,
    NewCircuit, Page,
};

/// Number of circuits per listing page.
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Default)]
struct Store {
    next_id: CircuitId,
    circuits: BTreeMap<CircuitId, CircuitRecord>,
    analyses: Vec<AnalysisRequest>,
}

#[derive(Debug, Default)]
pub struct InMemoryCircuitApi {
    store: RwLock<Store>,
}

impl InMemoryCircuitApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every analysis request received so far, oldest first
    pub async fn analysis_requests(&self) -> Vec<AnalysisRequest> {
        self.store.read().await.analyses.clone()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.circuits.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CircuitApi for InMemoryCircuitApi {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_circuits(&self, page: u32) -> Result<Page<CircuitRecord>, ApiError> {
        let store = self.store.read().await;
        let page = page.max(1) as usize;
        let start = (page - 1) * PAGE_SIZE;
        let count = store.circuits.len();

        let results: Vec<CircuitRecord> = store
            .circuits
            .values()
            .skip(start)
            .take(PAGE_SIZE)
            .cloned()
            .collect();

        Ok(Page {
            count: count as u64,
            next: (start + PAGE_SIZE < count).then(|| format!("?page={}", page + 1)),
            previous: (page > 1).then(|| format!("?page={}", page - 1)),
            results,
        })
    }

    async fn get_circuit(&self, id: CircuitId) -> Result<CircuitRecord, ApiError> {
        self.store
            .read()
            .await
            .circuits
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound(id))
    }

    async fn create_circuit(&self, circuit: &NewCircuit) -> Result<CircuitRecord, ApiError> {
        circuit.validate()?;
        let mut store = self.store.write().await;
        store.next_id += 1;
        let now = Utc::now();
        let record = CircuitRecord {
            id: store.next_id,
            name: circuit.name.clone(),
            description: circuit.description.clone(),
            created_at: now,
            updated_at: now,
            graph: circuit.graph.clone(),
        };
        store.circuits.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_circuit(
        &self,
        id: CircuitId,
        patch: &CircuitPatch,
    ) -> Result<CircuitRecord, ApiError> {
        let mut store = self.store.write().await;
        let record = store.circuits.get_mut(&id).ok_or(ApiError::NotFound(id))?;
        patch.apply_to(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_circuit(&self, id: CircuitId) -> Result<(), ApiError> {
        self.store
            .write()
            .await
            .circuits
            .remove(&id)
            .map(|_| ())
            .ok_or(ApiError::NotFound(id))
    }

    async fn analyze_circuit(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, ApiError> {
        let mut store = self.store.write().await;
        let record = store
            .circuits
            .get(&request.circuit_id)
            .ok_or(ApiError::NotFound(request.circuit_id))?;

        let (nodes, edges) = record
            .graph
            .as_ref()
            .map(|g| (g.nodes.len(), g.edges.len()))
            .unwrap_or((0, 0));
        let response = json!({
            "circuit_id": request.circuit_id,
            "analysis_type": request.analysis_type,
            "status": "completed",
            "node_count": nodes,
            "edge_count": edges,
        });

        store.analyses.push(request.clone());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_crud_cycle() {
        let api = InMemoryCircuitApi::new();
        let created = api
            .create_circuit(&NewCircuit::new("Divider").with_description("two resistors"))
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let fetched = api.get_circuit(created.id).await.unwrap();
        assert_eq!(fetched.description.as_deref(), Some("two resistors"));

        let updated = api
            .update_circuit(created.id, &CircuitPatch::new().with_name("Divider v2"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Divider v2");
        assert_eq!(updated.description.as_deref(), Some("two resistors"));

        api.delete_circuit(created.id).await.unwrap();
        assert!(api.get_circuit(created.id).await.unwrap_err().is_not_found());
        assert!(api.is_empty().await);
    }

    #[tokio::test]
    async fn test_pagination() {
        let api = InMemoryCircuitApi::new();
        for i in 0..(PAGE_SIZE + 3) {
            api.create_circuit(&NewCircuit::new(format!("c{}", i)))
                .await
                .unwrap();
        }

        let first = api.list_circuits(1).await.unwrap();
        assert_eq!(first.count, (PAGE_SIZE + 3) as u64);
        assert_eq!(first.results.len(), PAGE_SIZE);
        assert!(first.next.is_some());
        assert!(first.previous.is_none());

        let second = api.list_circuits(2).await.unwrap();
        assert_eq!(second.results.len(), 3);
        assert!(second.next.is_none());
    }

    #[tokio::test]
    async fn test_analysis_is_recorded() {
        let api = InMemoryCircuitApi::new();
        let created = api.create_circuit(&NewCircuit::new("RC")).await.unwrap();

        let response = api
            .analyze_circuit(&AnalysisRequest::static_analysis(created.id))
            .await
            .unwrap();
        assert_eq!(response["status"], "completed");
        assert_eq!(api.analysis_requests().await.len(), 1);

        let missing = api.analyze_circuit(&AnalysisRequest::static_analysis(42)).await;
        assert!(matches!(missing, Err(ApiError::NotFound(42))));
    }
}
