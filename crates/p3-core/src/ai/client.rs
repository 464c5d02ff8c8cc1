use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{AnalysisBackend, AnalysisResponse, AnalysisResult, MockAnalyst};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::request::{AnalyzeRequest, DocumentRequest, ImproveRequest};

/// HTTP client for the remote analysis service.
#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    analyze_endpoint: String,
    improve_endpoint: String,
    document_endpoint: Option<String>,
    // Answers document requests when the service has no document endpoint
    offline: MockAnalyst,
}

impl AnalysisClient {
    pub fn new(analyze_endpoint: &str, improve_endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            analyze_endpoint: analyze_endpoint.to_string(),
            improve_endpoint: improve_endpoint.to_string(),
            document_endpoint: None,
            offline: MockAnalyst::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.analyze_endpoint(), config.improve_endpoint())
            .with_document_endpoint(config.document_endpoint.clone())
            .with_offline_analyst(MockAnalyst::from_config(config))
    }

    pub fn with_document_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.document_endpoint = endpoint;
        self
    }

    pub fn with_offline_analyst(mut self, analyst: MockAnalyst) -> Self {
        self.offline = analyst;
        self
    }

    async fn post<T: Serialize + Sync>(&self, endpoint: &str, body: &T) -> AnalysisResult {
        tracing::info!(endpoint, "sending analysis request");

        let response = self
            .client
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(|source| AnalysisError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| AnalysisError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), "analysis request rejected");
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::debug!(endpoint, bytes = text.len(), "analysis response received");

        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Option<AnalysisResponse>>(&text)
            .map_err(|source| AnalysisError::Decode { source })
    }
}

#[async_trait]
impl AnalysisBackend for AnalysisClient {
    async fn analyze(&self, request: &AnalyzeRequest) -> AnalysisResult {
        self.post(&self.analyze_endpoint, request).await
    }

    async fn improve(&self, request: &ImproveRequest) -> AnalysisResult {
        self.post(&self.improve_endpoint, request).await
    }

    async fn analyze_document(&self, request: &DocumentRequest) -> AnalysisResult {
        match &self.document_endpoint {
            Some(endpoint) => self.post(endpoint, request).await,
            None => {
                tracing::debug!(file = %request.file_name, "no document endpoint, using offline analyst");
                self.offline.analyze_document(request).await
            }
        }
    }
}
