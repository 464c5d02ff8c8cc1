//! Chat orchestration: admits user actions, builds requests and turns backend
//! outcomes into assistant messages.
//!
//! Requests are split into a synchronous `begin_*` step that returns a
//! [`PendingRequest`], an async [`dispatch`] that talks to the backend, and a
//! synchronous [`ChatController::complete`] that records the outcome. The TUI
//! runs `dispatch` on a spawned task; tests and simple callers use
//! [`ChatController::submit_source`] and [`ChatController::submit_feedback`].

use crate::ai::{AnalysisBackend, AnalysisResult};
use crate::error::{AnalysisError, SelectionError};
use crate::format::format;
use crate::request::{
    build_document_request, build_feedback_request, build_url_request, normalize_url,
    AnalyzeRequest, ImproveRequest,
};
use crate::role::{AnalysisType, Role};
use crate::state::{ConversationState, FileRef, Source};

pub const MISSING_SELECTION: &str = "Please select an analysis type and provide either a Confluence URL or upload a PDF before sending a message.";
pub const UNSUPPORTED_FILE: &str = "Sorry, currently only PDF files are supported for detailed analysis.";
pub const ANALYSIS_COMPLETED: &str = "Analysis completed successfully!";
pub const EMPTY_RESULT: &str = "The analysis returned an empty result. Please try again.";
pub const UNPROCESSABLE: &str = "I received a response but couldn't process it. Please try again.";
pub const PDF_ANALYZED: &str = "I've analyzed your PDF. Here's what I found:";

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingSource,
    Loading,
    Displaying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Analyze,
    Improve,
    Document,
}

/// A request admitted by the controller and not yet sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingRequest {
    Analyze(AnalyzeRequest),
    Improve(ImproveRequest),
    Document {
        file: FileRef,
        role: Role,
        analysis_type: AnalysisType,
    },
}

impl PendingRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            PendingRequest::Analyze(_) => RequestKind::Analyze,
            PendingRequest::Improve(_) => RequestKind::Improve,
            PendingRequest::Document { .. } => RequestKind::Document,
        }
    }
}

/// Sends a pending request to `backend`. Document requests read the file here.
pub async fn dispatch<B: AnalysisBackend + ?Sized>(
    backend: &B,
    request: &PendingRequest,
) -> AnalysisResult {
    match request {
        PendingRequest::Analyze(payload) => backend.analyze(payload).await,
        PendingRequest::Improve(payload) => backend.improve(payload).await,
        PendingRequest::Document {
            file,
            role,
            analysis_type,
        } => {
            let bytes = tokio::fs::read(&file.path)
                .await
                .map_err(|source| AnalysisError::Io {
                    path: file.path.clone(),
                    source,
                })?;
            if !bytes.starts_with(PDF_MAGIC) {
                return Err(AnalysisError::UnsupportedFile {
                    name: file.name.clone(),
                    mime: file.mime.clone(),
                });
            }
            tracing::debug!(file = %file.name, bytes = bytes.len(), "read document");
            let payload =
                build_document_request(role.as_str(), analysis_type.as_str(), &file.name, &bytes);
            backend.analyze_document(&payload).await
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatController {
    state: ConversationState,
    phase: Phase,
    in_flight: Option<RequestKind>,
}

impl ChatController {
    pub fn new(role: Role) -> Self {
        Self {
            state: ConversationState::new(role),
            phase: Phase::Idle,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    fn touch(&mut self) {
        if !self.state.is_loading() {
            self.phase = Phase::AwaitingSource;
        }
    }

    pub fn select_role(&mut self, role: Role) {
        if self.state.set_role(role) {
            tracing::info!(role = role.as_str(), "role changed");
        }
    }

    pub fn select_analysis_type(
        &mut self,
        analysis_type: Option<AnalysisType>,
    ) -> Result<(), SelectionError> {
        if self.state.is_loading() {
            return Err(SelectionError::Busy);
        }
        if let Some(t) = analysis_type {
            let role = self.state.role();
            if !role.allows(t) {
                return Err(SelectionError::AnalysisNotForRole {
                    analysis_type: t,
                    role,
                });
            }
        }
        self.state.set_analysis_type(analysis_type);
        self.touch();
        Ok(())
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.state.set_source(Source::Url(url.into()));
        self.touch();
    }

    pub fn set_file(&mut self, file: FileRef) {
        self.state.set_source(Source::File(file));
        self.touch();
    }

    pub fn clear_source(&mut self) {
        self.state.clear_source();
        self.touch();
    }

    /// Admits a request for the current source. Returns `None` when nothing
    /// should be sent; any message for the user has already been appended.
    pub fn begin_source_submission(&mut self) -> Option<PendingRequest> {
        if self.state.is_loading() {
            return None;
        }
        if !self.state.has_required_data() {
            self.state.append_assistant_message(MISSING_SELECTION);
            self.phase = Phase::AwaitingSource;
            return None;
        }
        let analysis_type = self.state.analysis_type()?;
        let role = self.state.role();

        let request = match self.state.source().clone() {
            Source::None => return None,
            Source::Url(url) => {
                let url = normalize_url(&url);
                self.state
                    .append_user_message(format!("I'm analyzing this Confluence page: {}", url));
                PendingRequest::Analyze(build_url_request(
                    role.as_str(),
                    analysis_type.as_str(),
                    &url,
                ))
            }
            Source::File(file) if !file.is_pdf() => {
                self.state
                    .append_user_message(format!("I've uploaded \"{}\" for analysis.", file.name));
                self.state.append_assistant_message(UNSUPPORTED_FILE);
                self.state.clear_source();
                self.phase = Phase::Displaying;
                tracing::info!(file = %file.name, mime = %file.mime, "rejected non-PDF upload");
                return None;
            }
            Source::File(file) => {
                self.state.append_user_message(format!(
                    "I've uploaded \"{}\" for {} analysis.",
                    file.name,
                    analysis_type.display_name()
                ));
                PendingRequest::Document {
                    file,
                    role,
                    analysis_type,
                }
            }
        };

        self.start(&request);
        Some(request)
    }

    /// Admits free-text feedback on the current analysis.
    pub fn begin_feedback(&mut self, text: &str) -> Option<PendingRequest> {
        if text.trim().is_empty() || self.state.is_loading() {
            return None;
        }
        if !self.state.has_required_data() {
            self.state.append_assistant_message(MISSING_SELECTION);
            self.phase = Phase::AwaitingSource;
            return None;
        }
        let analysis_type = self.state.analysis_type()?;

        self.state.append_user_message(text);
        let request = PendingRequest::Improve(build_feedback_request(
            self.state.role().as_str(),
            analysis_type.as_str(),
            text,
        ));
        self.start(&request);
        Some(request)
    }

    fn start(&mut self, request: &PendingRequest) {
        tracing::info!(kind = ?request.kind(), "request started");
        self.state.begin_loading();
        self.in_flight = Some(request.kind());
        self.phase = Phase::Loading;
    }

    /// Records the outcome of the in-flight request.
    pub fn complete(&mut self, outcome: AnalysisResult) {
        let kind = self.in_flight.take().unwrap_or(RequestKind::Analyze);

        match outcome {
            Ok(Some(response)) => {
                if kind == RequestKind::Analyze && response.is_success() {
                    self.state.append_assistant_message(ANALYSIS_COMPLETED);
                }
                match (response.generated_content, response.error) {
                    (Some(content), _) if !content.is_empty() => {
                        if kind == RequestKind::Document {
                            self.state.append_assistant_message(PDF_ANALYZED);
                        }
                        self.state.set_extracted_content(
                            response.extracted_content.unwrap_or_else(|| content.clone()),
                        );
                        self.state.append_reply(format(&content));
                    }
                    (_, Some(error)) => {
                        tracing::warn!(kind = ?kind, "analysis service reported an error");
                        self.state.append_assistant_message(error);
                    }
                    _ => self.state.append_assistant_message(UNPROCESSABLE),
                }
            }
            Ok(None) => self.state.append_assistant_message(EMPTY_RESULT),
            Err(err) => {
                tracing::error!(kind = ?kind, "request failed: {}", err);
                let prefix = match kind {
                    RequestKind::Analyze => "Sorry, there was an error analyzing the Confluence URL",
                    RequestKind::Improve => "Sorry, I'm having trouble processing your request",
                    RequestKind::Document => "Sorry, there was an error processing your file",
                };
                self.state.append_assistant_message(format!("{}: {}", prefix, err));
            }
        }

        if kind == RequestKind::Document {
            self.state.clear_source();
        }
        self.state.end_loading();
        self.phase = Phase::Displaying;
    }

    /// Runs the source flow to completion against `backend`.
    pub async fn submit_source<B: AnalysisBackend + ?Sized>(&mut self, backend: &B) -> bool {
        match self.begin_source_submission() {
            Some(request) => {
                let outcome = dispatch(backend, &request).await;
                self.complete(outcome);
                true
            }
            None => false,
        }
    }

    /// Runs the feedback flow to completion against `backend`.
    pub async fn submit_feedback<B: AnalysisBackend + ?Sized>(
        &mut self,
        text: &str,
        backend: &B,
    ) -> bool {
        match self.begin_feedback(text) {
            Some(request) => {
                let outcome = dispatch(backend, &request).await;
                self.complete(outcome);
                true
            }
            None => false,
        }
    }
}

impl Default for ChatController {
    fn default() -> Self {
        Self::new(Role::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AnalysisResponse;
    use crate::request::DocumentRequest;
    use crate::role::RoleCode;
    use crate::state::GREETING;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct Recorder {
        analyze: Mutex<Vec<AnalyzeRequest>>,
        improve: Mutex<Vec<ImproveRequest>>,
        documents: Mutex<Vec<DocumentRequest>>,
        reply: Mutex<Option<AnalysisResponse>>,
    }

    impl Recorder {
        fn replying(response: AnalysisResponse) -> Self {
            Self {
                reply: Mutex::new(Some(response)),
                ..Self::default()
            }
        }

        fn reply(&self) -> AnalysisResult {
            Ok(self.reply.lock().unwrap().clone())
        }

        fn sent(&self) -> usize {
            self.analyze.lock().unwrap().len()
                + self.improve.lock().unwrap().len()
                + self.documents.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AnalysisBackend for Recorder {
        async fn analyze(&self, request: &AnalyzeRequest) -> AnalysisResult {
            self.analyze.lock().unwrap().push(request.clone());
            self.reply()
        }

        async fn improve(&self, request: &ImproveRequest) -> AnalysisResult {
            self.improve.lock().unwrap().push(request.clone());
            self.reply()
        }

        async fn analyze_document(&self, request: &DocumentRequest) -> AnalysisResult {
            self.documents.lock().unwrap().push(request.clone());
            self.reply()
        }
    }

    fn texts(controller: &ChatController) -> Vec<String> {
        controller
            .state()
            .messages()
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_url_analysis_flow() {
        let backend = Recorder::replying(AnalysisResponse {
            status: Some("success".into()),
            generated_content: Some("## Title\n### SectionA\ntext".into()),
            ..AnalysisResponse::default()
        });
        let mut controller = ChatController::new(Role::Developer);
        controller.select_analysis_type(Some(AnalysisType::Lld)).unwrap();
        controller.set_url("acme.atlassian.net/x");
        assert_eq!(controller.phase(), Phase::AwaitingSource);

        assert!(controller.submit_source(&backend).await);

        let sent = backend.analyze.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![AnalyzeRequest {
                role: RoleCode::Dev,
                url: "https://acme.atlassian.net/x".into(),
                action: "Low Level Design".into(),
            }]
        );
        assert_eq!(
            texts(&controller),
            vec![
                GREETING.to_string(),
                "I'm analyzing this Confluence page: https://acme.atlassian.net/x".to_string(),
                ANALYSIS_COMPLETED.to_string(),
                "# Title\n\n### SectionA\ntext".to_string(),
            ]
        );
        assert_eq!(controller.phase(), Phase::Displaying);
        assert!(!controller.is_loading());
        assert_eq!(
            controller.state().last_extracted_content(),
            Some("## Title\n### SectionA\ntext")
        );
    }

    #[tokio::test]
    async fn test_feedback_without_selection_sends_nothing() {
        let backend = Recorder::default();
        let mut controller = ChatController::new(Role::ProjectManager);

        assert!(!controller.submit_feedback("What is the timeline?", &backend).await);
        assert_eq!(backend.sent(), 0);
        assert_eq!(
            controller.state().last_message().map(|m| m.text.as_str()),
            Some(MISSING_SELECTION)
        );
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_url_without_analysis_type_is_blocked() {
        let backend = Recorder::default();
        let mut controller = ChatController::new(Role::Qa);
        controller.set_url("http://x");

        assert!(!controller.submit_source(&backend).await);
        assert_eq!(backend.sent(), 0);
        assert_eq!(
            controller.state().last_message().map(|m| m.text.as_str()),
            Some(MISSING_SELECTION)
        );
        assert_eq!(controller.phase(), Phase::AwaitingSource);
    }

    #[tokio::test]
    async fn test_feedback_flow() {
        let backend = Recorder::replying(AnalysisResponse {
            generated_content: Some("Plan in two sprints.".into()),
            ..AnalysisResponse::default()
        });
        let mut controller = ChatController::new(Role::ProjectManager);
        controller.select_analysis_type(Some(AnalysisType::Timeline)).unwrap();
        controller.set_url("https://acme.atlassian.net/wiki/p");

        assert!(!controller.submit_feedback("   ", &backend).await);
        assert!(controller.submit_feedback("How long?", &backend).await);

        let sent = backend.improve.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].role, RoleCode::Pm);
        assert_eq!(sent[0].user_feedback, "How long?");
        assert_eq!(sent[0].action, "Timeline Estimation");
        let texts = texts(&controller);
        assert_eq!(&texts[texts.len() - 2..], ["How long?", "Plan in two sprints."]);
    }

    #[tokio::test]
    async fn test_error_response_shown_verbatim() {
        let backend = Recorder::replying(AnalysisResponse {
            error: Some("Page not found".into()),
            ..AnalysisResponse::default()
        });
        let mut controller = ChatController::new(Role::Qa);
        controller.select_analysis_type(Some(AnalysisType::TestPlan)).unwrap();
        controller.set_url("https://acme.atlassian.net/missing");
        controller.submit_source(&backend).await;

        assert_eq!(
            controller.state().last_message().map(|m| m.text.as_str()),
            Some("Page not found")
        );
        assert_eq!(controller.state().last_extracted_content(), None);
    }

    #[tokio::test]
    async fn test_empty_and_unprocessable_responses() {
        let mut controller = ChatController::new(Role::Qa);
        controller.select_analysis_type(Some(AnalysisType::TestCases)).unwrap();
        controller.set_url("https://acme.atlassian.net/p");

        controller.submit_source(&Recorder::default()).await;
        assert_eq!(
            controller.state().last_message().map(|m| m.text.as_str()),
            Some(EMPTY_RESULT)
        );

        controller
            .submit_source(&Recorder::replying(AnalysisResponse::default()))
            .await;
        assert_eq!(
            controller.state().last_message().map(|m| m.text.as_str()),
            Some(UNPROCESSABLE)
        );
    }

    #[tokio::test]
    async fn test_whitespace_content_counts_as_content() {
        let backend = Recorder::replying(AnalysisResponse {
            generated_content: Some(" \n".into()),
            ..AnalysisResponse::default()
        });
        let mut controller = ChatController::new(Role::Developer);
        controller.select_analysis_type(Some(AnalysisType::Gaps)).unwrap();
        controller.set_url("https://acme.atlassian.net/p");
        controller.submit_source(&backend).await;

        assert!(!texts(&controller).iter().any(|t| t == UNPROCESSABLE));
        assert_eq!(controller.state().last_extracted_content(), Some(" \n"));
    }

    #[tokio::test]
    async fn test_reply_keeps_formatted_document() {
        let backend = Recorder::replying(AnalysisResponse {
            generated_content: Some("## Review\n### Risks\n1. **Auth**\n   - no lockout".into()),
            ..AnalysisResponse::default()
        });
        let mut controller = ChatController::new(Role::Developer);
        controller.select_analysis_type(Some(AnalysisType::Gaps)).unwrap();
        controller.set_url("https://acme.atlassian.net/p");
        controller.submit_source(&backend).await;

        let reply = controller.state().last_message().unwrap();
        assert_eq!(reply.document, format(&reply.text).document);
        assert_eq!(reply.document.blocks.len(), 3);
    }

    #[test]
    fn test_transport_failure_clears_loading() {
        let mut controller = ChatController::new(Role::Developer);
        controller.select_analysis_type(Some(AnalysisType::Gaps)).unwrap();
        controller.set_url("https://acme.atlassian.net/p");
        let request = controller.begin_source_submission().unwrap();
        assert_eq!(request.kind(), RequestKind::Analyze);
        assert!(controller.is_loading());
        assert_eq!(controller.begin_source_submission(), None);
        assert_eq!(controller.begin_feedback("more"), None);

        controller.complete(Err(AnalysisError::Status {
            status: 500,
            body: "boom".into(),
        }));
        assert!(!controller.is_loading());
        assert_eq!(controller.phase(), Phase::Displaying);
        assert_eq!(
            controller.state().last_message().map(|m| m.text.as_str()),
            Some("Sorry, there was an error analyzing the Confluence URL: analysis service returned status 500: boom")
        );
    }

    #[test]
    fn test_blank_url_is_not_sent() {
        let mut controller = ChatController::new(Role::Developer);
        controller.select_analysis_type(Some(AnalysisType::Lld)).unwrap();
        controller.set_url("   ");
        assert_eq!(controller.begin_source_submission(), None);
        assert_eq!(
            controller.state().last_message().map(|m| m.text.as_str()),
            Some(MISSING_SELECTION)
        );
    }

    #[test]
    fn test_analysis_type_must_match_role() {
        let mut controller = ChatController::new(Role::Developer);
        let err = controller
            .select_analysis_type(Some(AnalysisType::TestPlan))
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::AnalysisNotForRole {
                analysis_type: AnalysisType::TestPlan,
                role: Role::Developer,
            }
        );
        assert_eq!(controller.state().analysis_type(), None);

        controller.select_analysis_type(Some(AnalysisType::Lld)).unwrap();
        controller.select_role(Role::Qa);
        assert_eq!(controller.state().analysis_type(), None);
        let count = controller.state().messages().len();
        controller.select_role(Role::Qa);
        assert_eq!(controller.state().messages().len(), count);
    }

    #[tokio::test]
    async fn test_non_pdf_upload_is_rejected_locally() {
        let backend = Recorder::default();
        let mut controller = ChatController::new(Role::Developer);
        controller.select_analysis_type(Some(AnalysisType::Lld)).unwrap();
        controller.set_file(FileRef::from_path("/tmp/notes.docx"));

        assert!(!controller.submit_source(&backend).await);
        assert_eq!(backend.sent(), 0);
        let texts = texts(&controller);
        assert_eq!(
            &texts[texts.len() - 2..],
            ["I've uploaded \"notes.docx\" for analysis.", UNSUPPORTED_FILE]
        );
        assert!(controller.state().source().is_none());
    }

    #[tokio::test]
    async fn test_pdf_upload_flow() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("design.pdf");
        std::fs::write(&path, b"%PDF-1.7\nbody").unwrap();

        let backend = Recorder::replying(AnalysisResponse {
            status: Some("success".into()),
            generated_content: Some("Looks complete.".into()),
            extracted_content: Some("raw text".into()),
            ..AnalysisResponse::default()
        });
        let mut controller = ChatController::new(Role::Qa);
        controller.select_analysis_type(Some(AnalysisType::TestCoverage)).unwrap();
        controller.set_file(FileRef::from_path(&path));

        assert!(controller.submit_source(&backend).await);

        let sent = backend.documents.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].file_name, "design.pdf");
        assert_eq!(sent[0].action, "Test Coverage");
        let texts = texts(&controller);
        assert_eq!(
            &texts[texts.len() - 3..],
            [
                "I've uploaded \"design.pdf\" for Test Coverage analysis.",
                PDF_ANALYZED,
                "Looks complete.",
            ]
        );
        assert_eq!(controller.state().last_extracted_content(), Some("raw text"));
        assert!(controller.state().source().is_none());
    }

    #[tokio::test]
    async fn test_pdf_extension_without_pdf_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"plain text").unwrap();

        let backend = Recorder::default();
        let mut controller = ChatController::new(Role::Developer);
        controller.select_analysis_type(Some(AnalysisType::Lld)).unwrap();
        controller.set_file(FileRef::from_path(&path));
        controller.submit_source(&backend).await;

        assert_eq!(backend.sent(), 0);
        let last = controller.state().last_message().unwrap().text.clone();
        assert!(last.starts_with("Sorry, there was an error processing your file: unsupported file format for fake.pdf"));
        assert!(!controller.is_loading());
    }
}
