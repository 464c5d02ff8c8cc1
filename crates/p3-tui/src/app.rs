use std::sync::Arc;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use p3_core::{
    dispatch, AnalysisBackend, AnalysisResult, AnalysisType, ChatController, FileRef,
    PendingRequest, Role, Source,
};

use crate::ui;

/// Rotated while a request is in flight.
pub const LOADING_MESSAGES: &[&str] = &[
    "Thinking deep thoughts...",
    "Consulting my digital brain...",
    "Brewing insights for you...",
    "Hold on, this is taking longer than expected...",
    "Searching for the meaning of life... and your answer...",
    "If I were human, I'd be scratching my head right now...",
    "Analyzing data at the speed of... well, not light...",
    "Doing AI push-ups to get stronger answers...",
    "Processing... please enjoy this digital moment of zen...",
    "Converting coffee to code... wait, I don't drink coffee...",
];

// Ticks are 300ms, so the loading message changes about every 3s
const TICKS_PER_LOADING_MESSAGE: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Analysis,
    Source,
    Chat,
    Input,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Analysis => FocusPane::Source,
            FocusPane::Source => FocusPane::Chat,
            FocusPane::Chat => FocusPane::Input,
            FocusPane::Input => FocusPane::Analysis,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusPane::Analysis => FocusPane::Input,
            FocusPane::Source => FocusPane::Analysis,
            FocusPane::Chat => FocusPane::Source,
            FocusPane::Input => FocusPane::Chat,
        }
    }
}

/// Which kind of source the source box edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Url,
    File,
}

impl SourceKind {
    pub fn toggle(self) -> Self {
        match self {
            SourceKind::Url => SourceKind::File,
            SourceKind::File => SourceKind::Url,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    pub controller: ChatController,
    pub backend: Arc<dyn AnalysisBackend>,
    pub request_task: Option<tokio::task::JoinHandle<AnalysisResult>>,
    pub offline: bool,

    // Analysis picker
    pub analysis_state: ListState,

    // Source box (URL or file path)
    pub source_kind: SourceKind,
    pub source_input: String,
    pub source_cursor: usize,

    // Feedback input
    pub query_input: String,
    pub query_cursor: usize,

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub show_extracted: bool,
    pub extracted_scroll: u16,

    // Transient status line (selection errors)
    pub status: Option<String>,

    // Animation state
    pub animation_frame: u8,
    pub loading_ticks: u16,

    // Panel areas for mouse hit-testing (updated during render)
    pub analysis_area: Option<Rect>,
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(role: Role, backend: Arc<dyn AnalysisBackend>, offline: bool) -> Self {
        let mut analysis_state = ListState::default();
        analysis_state.select(Some(0));

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Analysis,

            controller: ChatController::new(role),
            backend,
            request_task: None,
            offline,

            analysis_state,

            source_kind: SourceKind::Url,
            source_input: String::new(),
            source_cursor: 0,

            query_input: String::new(),
            query_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            show_extracted: false,
            extracted_scroll: 0,

            status: None,

            animation_frame: 0,
            loading_ticks: 0,

            analysis_area: None,
            chat_area: None,
        }
    }

    pub fn role(&self) -> Role {
        self.controller.state().role()
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    pub fn analysis_options(&self) -> &'static [AnalysisType] {
        self.role().analysis_types()
    }

    pub fn select_role(&mut self, role: Role) {
        if role == self.role() {
            return;
        }
        self.controller.select_role(role);
        self.analysis_state.select(Some(0));
        self.status = None;
        self.scroll_chat_to_bottom();
    }

    pub fn analysis_nav_down(&mut self) {
        let len = self.analysis_options().len();
        if len > 0 {
            let i = self.analysis_state.selected().unwrap_or(0);
            self.analysis_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn analysis_nav_up(&mut self) {
        let i = self.analysis_state.selected().unwrap_or(0);
        self.analysis_state.select(Some(i.saturating_sub(1)));
    }

    /// Selects the highlighted analysis type, or clears it if already selected.
    pub fn toggle_highlighted_analysis(&mut self) {
        let Some(highlighted) = self
            .analysis_state
            .selected()
            .and_then(|i| self.analysis_options().get(i).copied())
        else {
            return;
        };
        let next = if self.controller.state().analysis_type() == Some(highlighted) {
            None
        } else {
            Some(highlighted)
        };
        self.status = match self.controller.select_analysis_type(next) {
            Ok(()) => None,
            Err(err) => Some(err.to_string()),
        };
    }

    pub fn toggle_source_kind(&mut self) {
        self.source_kind = self.source_kind.toggle();
        self.source_input.clear();
        self.source_cursor = 0;
        self.controller.clear_source();
    }

    /// Pushes the source box into the conversation state.
    pub fn sync_source(&mut self) {
        let text = self.source_input.trim();
        match self.source_kind {
            SourceKind::Url => self.controller.set_url(self.source_input.clone()),
            SourceKind::File if text.is_empty() => self.controller.clear_source(),
            SourceKind::File => self.controller.set_file(FileRef::from_path(expand_home(text))),
        }
    }

    pub fn submit_source(&mut self) {
        if self.request_task.is_some() {
            return;
        }
        self.sync_source();
        let request = self.controller.begin_source_submission();
        if matches!(self.controller.state().source(), Source::None) {
            self.source_input.clear();
            self.source_cursor = 0;
        }
        if let Some(request) = request {
            self.spawn_request(request);
        }
        self.scroll_chat_to_bottom();
    }

    pub fn submit_query(&mut self) {
        if self.request_task.is_some() || self.query_input.trim().is_empty() {
            return;
        }
        self.sync_source();
        let text = self.query_input.clone();
        // A rejected message stays in the box
        if let Some(request) = self.controller.begin_feedback(&text) {
            self.query_input.clear();
            self.query_cursor = 0;
            self.spawn_request(request);
        }
        self.scroll_chat_to_bottom();
    }

    fn spawn_request(&mut self, request: PendingRequest) {
        let backend = Arc::clone(&self.backend);
        self.loading_ticks = 0;
        self.request_task = Some(tokio::spawn(async move {
            dispatch(backend.as_ref(), &request).await
        }));
    }

    /// Applies the outcome of a finished request task, if any.
    pub async fn poll_request_task(&mut self) {
        let finished = self
            .request_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        if let Some(task) = self.request_task.take() {
            let outcome = task.await.unwrap_or_else(|err| Err(err.into()));
            self.controller.complete(outcome);
            if matches!(self.controller.state().source(), Source::None) {
                self.source_input.clear();
                self.source_cursor = 0;
            }
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
            self.loading_ticks = self.loading_ticks.wrapping_add(1);
        }
    }

    pub fn loading_message(&self) -> &'static str {
        let idx = (self.loading_ticks / TICKS_PER_LOADING_MESSAGE) as usize % LOADING_MESSAGES.len();
        LOADING_MESSAGES[idx]
    }

    pub fn scroll_down(&mut self) {
        if self.show_extracted {
            self.extracted_scroll = self.extracted_scroll.saturating_add(1);
        } else {
            self.chat_scroll = self.chat_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        if self.show_extracted {
            self.extracted_scroll = self.extracted_scroll.saturating_sub(1);
        } else {
            self.chat_scroll = self.chat_scroll.saturating_sub(1);
        }
    }

    pub fn toggle_extracted(&mut self) {
        if self.controller.state().last_extracted_content().is_some() {
            self.show_extracted = !self.show_extracted;
            self.extracted_scroll = 0;
        }
    }

    /// Scroll chat to bottom so the newest message is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        // Count what the chat panel draws, wrapped to the panel width
        let total_lines: usize = ui::chat_lines(self)
            .iter()
            .map(|line| line.width().div_ceil(wrap_width).max(1))
            .sum();

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        let total_lines = u16::try_from(total_lines).unwrap_or(u16::MAX);
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}

fn expand_home(path: &str) -> std::path::PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    std::path::PathBuf::from(path)
}
