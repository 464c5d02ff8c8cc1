pub mod ai;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod knowledge;
pub mod markdown;
pub mod request;
pub mod role;
pub mod state;

// Re-export main types for convenience
pub use ai::{AnalysisBackend, AnalysisClient, AnalysisResponse, AnalysisResult, MockAnalyst};
pub use config::Config;
pub use controller::{dispatch, ChatController, PendingRequest, Phase, RequestKind};
pub use error::{AnalysisError, SelectionError};
pub use format::{format, DisplayContent};
pub use role::{AnalysisType, Role, RoleCode};
pub use state::{ConversationState, FileRef, Message, Sender, Source};
