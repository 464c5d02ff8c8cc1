//! Outbound payloads for the analysis service.
//!
//! Payloads are derived from the current selection and never stored. Field
//! names are fixed by the service protocol.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::role::{action_label, RoleCode};

/// Action sent by the analyze endpoint when the analysis type is unknown.
pub const DEFAULT_URL_ACTION: &str = "Low Level Design";
/// Action sent by the improve endpoint when the analysis type is unknown.
pub const DEFAULT_FEEDBACK_ACTION: &str = "Test Cases";

/// Body of `POST /api/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub role: RoleCode,
    pub url: String,
    pub action: String,
}

/// Body of `POST /api/improve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImproveRequest {
    pub role: RoleCode,
    pub user_feedback: String,
    pub action: String,
}

/// Body of the document endpoint. `content` is the file in standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub role: RoleCode,
    pub action: String,
    pub file_name: String,
    pub content: String,
}

pub fn build_url_request(role: &str, analysis_type: &str, url: &str) -> AnalyzeRequest {
    AnalyzeRequest {
        role: RoleCode::resolve(role),
        url: url.to_string(),
        action: action_label(analysis_type)
            .unwrap_or(DEFAULT_URL_ACTION)
            .to_string(),
    }
}

pub fn build_feedback_request(role: &str, analysis_type: &str, feedback: &str) -> ImproveRequest {
    ImproveRequest {
        role: RoleCode::resolve(role),
        user_feedback: feedback.to_string(),
        action: action_label(analysis_type)
            .unwrap_or(DEFAULT_FEEDBACK_ACTION)
            .to_string(),
    }
}

pub fn build_document_request(
    role: &str,
    analysis_type: &str,
    file_name: &str,
    bytes: &[u8],
) -> DocumentRequest {
    DocumentRequest {
        role: RoleCode::resolve(role),
        action: action_label(analysis_type)
            .unwrap_or(DEFAULT_URL_ACTION)
            .to_string(),
        file_name: file_name.to_string(),
        content: STANDARD.encode(bytes),
    }
}

/// Prefixes `https://` when the URL has no scheme.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}
