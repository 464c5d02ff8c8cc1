use std::path::PathBuf;

use thiserror::Error;

use crate::role::{AnalysisType, Role};

/// Errors from talking to the analysis service or reading a source file
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("analysis service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response from analysis service: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file format for {name}: {mime}")]
    UnsupportedFile { name: String, mime: String },

    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Rejected user selections
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("{} is not available in {} mode", analysis_type.display_name(), role.display_name())]
    AnalysisNotForRole {
        analysis_type: AnalysisType,
        role: Role,
    },

    #[error("a request is already in progress")]
    Busy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = SelectionError::AnalysisNotForRole {
            analysis_type: AnalysisType::Lld,
            role: Role::Qa,
        };
        assert_eq!(err.to_string(), "Low Level Design is not available in QA mode");

        let err = AnalysisError::Status { status: 502, body: "bad gateway".into() };
        assert_eq!(err.to_string(), "analysis service returned status 502: bad gateway");
    }
}
