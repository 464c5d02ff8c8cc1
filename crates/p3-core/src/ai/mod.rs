pub mod client;
pub mod mock;

pub use client::AnalysisClient;
pub use mock::MockAnalyst;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::request::{AnalyzeRequest, DocumentRequest, ImproveRequest};

/// Response body shared by every analysis endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Text the service extracted from the source document, when it reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_content: Option<String>,
}

impl AnalysisResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// `Ok(None)` means the service answered with an empty (`null`) body.
pub type AnalysisResult = Result<Option<AnalysisResponse>, AnalysisError>;

/// Something that can answer analysis requests: the remote service or the
/// offline mock.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, request: &AnalyzeRequest) -> AnalysisResult;

    async fn improve(&self, request: &ImproveRequest) -> AnalysisResult;

    async fn analyze_document(&self, request: &DocumentRequest) -> AnalysisResult;
}
