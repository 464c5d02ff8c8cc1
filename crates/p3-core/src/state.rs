//! UI-agnostic conversation state
//!
//! One [`ConversationState`] is owned per session. Front-ends (the TUI, tests)
//! read it to render and mutate it only through the chat controller.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::DisplayContent;
use crate::markdown::{self, Document};
use crate::role::{AnalysisType, Role};

pub const GREETING: &str = "Hi! I'm your AI assistant, P3 - your Peak Productivity Partner. How can I help you today? Please select an analysis type and provide either a Confluence URL or upload a PDF to begin.";

/// The sender of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    /// Parsed form of `text`; empty for user messages, which are shown verbatim.
    #[serde(skip)]
    pub document: Document,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            document: Document::default(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        let text = text.into();
        let document = markdown::parse(&text);
        Self {
            sender: Sender::Assistant,
            text,
            document,
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

impl From<DisplayContent> for Message {
    fn from(content: DisplayContent) -> Self {
        Self {
            sender: Sender::Assistant,
            text: content.text,
            document: content.document,
        }
    }
}

/// A file chosen for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
}

impl FileRef {
    /// Builds a reference from a path, deriving the MIME type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        let mime = if is_pdf {
            mime::APPLICATION_PDF
        } else {
            mime::APPLICATION_OCTET_STREAM
        };

        Self {
            path: path.to_path_buf(),
            name,
            mime: mime.essence_str().to_string(),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime == mime::APPLICATION_PDF.essence_str()
    }
}

/// Input artifact for an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    None,
    Url(String),
    File(FileRef),
}

impl Source {
    pub fn is_none(&self) -> bool {
        matches!(self, Source::None)
    }
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    messages: Vec<Message>,
    role: Role,
    analysis_type: Option<AnalysisType>,
    source: Source,
    is_loading: bool,
    last_extracted_content: Option<String>,
}

impl ConversationState {
    pub fn new(role: Role) -> Self {
        Self {
            messages: vec![Message::assistant(GREETING)],
            role,
            analysis_type: None,
            source: Source::None,
            is_loading: false,
            last_extracted_content: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn analysis_type(&self) -> Option<AnalysisType> {
        self.analysis_type
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_extracted_content(&self) -> Option<&str> {
        self.last_extracted_content.as_deref()
    }

    pub fn append_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    pub fn append_assistant_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// Appends a formatted reply, keeping the tree it was parsed into.
    pub fn append_reply(&mut self, content: DisplayContent) {
        self.messages.push(content.into());
    }

    /// Switches role. Returns false (and changes nothing) if already in `role`.
    pub fn set_role(&mut self, role: Role) -> bool {
        if role == self.role {
            return false;
        }
        self.role = role;
        if let Some(t) = self.analysis_type {
            if !role.allows(t) {
                self.analysis_type = None;
            }
        }
        self.append_assistant_message(role.mode_switch_message());
        true
    }

    pub fn set_analysis_type(&mut self, analysis_type: Option<AnalysisType>) {
        self.analysis_type = analysis_type;
    }

    pub fn set_source(&mut self, source: Source) {
        self.source = source;
    }

    pub fn clear_source(&mut self) {
        self.source = Source::None;
    }

    pub fn set_extracted_content(&mut self, content: impl Into<String>) {
        self.last_extracted_content = Some(content.into());
    }

    /// Admission gate for every request.
    pub fn has_required_data(&self) -> bool {
        if self.analysis_type.is_none() {
            return false;
        }
        match &self.source {
            Source::Url(url) => !url.trim().is_empty(),
            Source::File(_) => true,
            Source::None => false,
        }
    }

    pub fn begin_loading(&mut self) {
        self.is_loading = true;
    }

    pub fn end_loading(&mut self) {
        self.is_loading = false;
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(Role::default())
    }
}
