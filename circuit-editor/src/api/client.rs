//! Circuit API Trait
//!
//! Common interface for anything that can store and analyze circuits.

use async_trait::async_trait;

use super::{
    AnalysisRequest, AnalysisResponse, ApiError, CircuitId, CircuitPatch, CircuitRecord,
    NewCircuit, Page,
};

#[async_trait]
pub trait CircuitApi: Send + Sync {
    /// Short name of the backend, for logs
    fn name(&self) -> &str;

    /// List circuits, one page at a time (pages start at 1)
    async fn list_circuits(&self, page: u32) -> Result<Page<CircuitRecord>, ApiError>;

    async fn get_circuit(&self, id: CircuitId) -> Result<CircuitRecord, ApiError>;

    async fn create_circuit(&self, circuit: &NewCircuit) -> Result<CircuitRecord, ApiError>;

    /// Partially update a circuit; fields absent from `patch` are untouched
    async fn update_circuit(
        &self,
        id: CircuitId,
        patch: &CircuitPatch,
    ) -> Result<CircuitRecord, ApiError>;

    async fn delete_circuit(&self, id: CircuitId) -> Result<(), ApiError>;

    /// Trigger an analysis run; the response shape is backend-defined
    async fn analyze_circuit(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, ApiError>;
}
