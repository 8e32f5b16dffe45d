//! REST client for the circuit backend
//!
//! Endpoints, relative to the configured base URL:
//!
//! | operation | request |
//! |-----------|---------|
//! | list      | `GET circuits/?page=N` |
//! | get       | `GET circuits/{id}/` |
//! | create    | `POST circuits/` |
//! | update    | `PATCH circuits/{id}/` |
//! | delete    | `DELETE circuits/{id}/` |
//! | analyze   | `POST analysis/` |

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::client::CircuitApi;
use super::{
    AnalysisRequest, AnalysisResponse, ApiError, CircuitId, CircuitPatch, CircuitRecord,
    NewCircuit, Page,
};
use crate::config::ApiConfig;

pub struct HttpCircuitApi {
    client: Client,
    base_url: String,
}

impl HttpCircuitApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn circuit_url(&self, id: CircuitId) -> String {
        self.url(&format!("circuits/{}/", id))
    }

    /// Pass 2xx responses through; turn anything else into an error.
    async fn check(response: Response, id: Option<CircuitId>) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(ApiError::NotFound(id));
            }
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        id: Option<CircuitId>,
    ) -> Result<T, ApiError> {
        Self::check(response, id)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl CircuitApi for HttpCircuitApi {
    fn name(&self) -> &str {
        "http"
    }

    async fn list_circuits(&self, page: u32) -> Result<Page<CircuitRecord>, ApiError> {
        let response = self
            .client
            .get(self.url("circuits/"))
            .query(&[("page", page.max(1))])
            .send()
            .await?;
        Self::decode(response, None).await
    }

    async fn get_circuit(&self, id: CircuitId) -> Result<CircuitRecord, ApiError> {
        let response = self.client.get(self.circuit_url(id)).send().await?;
        Self::decode(response, Some(id)).await
    }

    async fn create_circuit(&self, circuit: &NewCircuit) -> Result<CircuitRecord, ApiError> {
        circuit.validate()?;
        let response = self
            .client
            .post(self.url("circuits/"))
            .json(circuit)
            .send()
            .await?;
        Self::decode(response, None).await
    }

    async fn update_circuit(
        &self,
        id: CircuitId,
        patch: &CircuitPatch,
    ) -> Result<CircuitRecord, ApiError> {
        let response = self
            .client
            .patch(self.circuit_url(id))
            .json(patch)
            .send()
            .await?;
        Self::decode(response, Some(id)).await
    }

    async fn delete_circuit(&self, id: CircuitId) -> Result<(), ApiError> {
        let response = self.client.delete(self.circuit_url(id)).send().await?;
        Self::check(response, Some(id)).await?;
        Ok(())
    }

    async fn analyze_circuit(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, ApiError> {
        let response = self
            .client
            .post(self.url("analysis/"))
            .json(request)
            .send()
            .await?;
        Self::decode(response, Some(request.circuit_id)).await
    }
}
