//! Circuit API boundary
//!
//! The backend owns persisted circuits. The editor reaches it only through
//! the [`CircuitApi`] trait; [`HttpCircuitApi`] talks to the REST service and
//! [`InMemoryCircuitApi`] keeps everything in process.
//!
//! Every remote operation is attempted once. Failures are reported to the
//! caller, never retried.

pub mod client;
pub mod http;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wire::WireGraph;

pub use client::CircuitApi;
pub use http::HttpCircuitApi;
pub use memory::InMemoryCircuitApi;

pub type CircuitId = u64;

/// Analysis output is defined by the backend and passed through untouched.
pub type AnalysisResponse = serde_json::Value;

/// The only analysis type the editor currently requests.
pub const STATIC_ANALYSIS: &str = "static";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Circuit {0} not found")]
    NotFound(CircuitId),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
            || matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// A circuit as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitRecord {
    pub id: CircuitId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<WireGraph>,
}

/// Body of a create request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCircuit {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<WireGraph>,
}

impl NewCircuit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            graph: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_graph(mut self, graph: WireGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// A circuit needs a non-blank name.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("circuit name is required".to_string()));
        }
        Ok(())
    }
}

/// Body of a partial update; absent fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<WireGraph>,
}

impl CircuitPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_graph(mut self, graph: WireGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.graph.is_none()
    }

    /// Apply this patch to a local copy of a record.
    pub fn apply_to(&self, record: &mut CircuitRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(description) = &self.description {
            record.description = Some(description.clone());
        }
        if let Some(graph) = &self.graph {
            record.graph = Some(graph.clone());
        }
    }
}

/// One page of a circuit listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub circuit_id: CircuitId,
    pub analysis_type: String,
}

impl AnalysisRequest {
    pub fn new(circuit_id: CircuitId, analysis_type: impl Into<String>) -> Self {
        Self {
            circuit_id,
            analysis_type: analysis_type.into(),
        }
    }

    pub fn static_analysis(circuit_id: CircuitId) -> Self {
        Self::new(circuit_id, STATIC_ANALYSIS)
    }
}
