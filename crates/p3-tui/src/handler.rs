use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use p3_core::Role;

use crate::app::{App, FocusPane, InputMode, SourceKind};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_request_task().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn start_editing(app: &mut App, focus: FocusPane) {
    app.focus = focus;
    app.input_mode = InputMode::Editing;
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Roles
        KeyCode::Char('1') => app.select_role(Role::Developer),
        KeyCode::Char('2') => app.select_role(Role::ProjectManager),
        KeyCode::Char('3') => app.select_role(Role::Qa),

        // Focus
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Analysis => app.analysis_nav_down(),
            _ => app.scroll_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Analysis => app.analysis_nav_up(),
            _ => app.scroll_up(),
        },
        KeyCode::PageDown => {
            let page = (app.chat_height / 2).max(1);
            app.chat_scroll = app.chat_scroll.saturating_add(page);
        }
        KeyCode::PageUp => {
            let page = (app.chat_height / 2).max(1);
            app.chat_scroll = app.chat_scroll.saturating_sub(page);
        }
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        KeyCode::Enter | KeyCode::Char(' ') => match app.focus {
            FocusPane::Analysis => app.toggle_highlighted_analysis(),
            FocusPane::Source => start_editing(app, FocusPane::Source),
            FocusPane::Input => start_editing(app, FocusPane::Input),
            FocusPane::Chat => {}
        },

        // Source
        KeyCode::Char('u') => {
            if app.source_kind != SourceKind::Url {
                app.toggle_source_kind();
            }
            start_editing(app, FocusPane::Source);
        }
        KeyCode::Char('f') => {
            if app.source_kind != SourceKind::File {
                app.toggle_source_kind();
            }
            start_editing(app, FocusPane::Source);
        }
        KeyCode::Char('m') => app.toggle_source_kind(),
        KeyCode::Char('s') => app.submit_source(),

        KeyCode::Char('i') | KeyCode::Char('/') => start_editing(app, FocusPane::Input),
        KeyCode::Char('x') => app.toggle_extracted(),
        KeyCode::Esc => app.status = None,
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            if app.focus == FocusPane::Source {
                app.sync_source();
            }
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            match app.focus {
                FocusPane::Source => app.submit_source(),
                _ => app.submit_query(),
            }
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            if app.focus == FocusPane::Source {
                app.sync_source();
            }
            app.focus = app.focus.next();
        }
        _ => {
            let (input, cursor) = if app.focus == FocusPane::Source {
                (&mut app.source_input, &mut app.source_cursor)
            } else {
                (&mut app.query_input, &mut app.query_cursor)
            };
            edit_line(input, cursor, key.code);
        }
    }
}

/// Applies a line-editing key to `input` with a character-indexed cursor.
fn edit_line(input: &mut String, cursor: &mut usize, code: KeyCode) {
    match code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = input.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = input.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_analysis = app.analysis_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                for _ in 0..3 {
                    app.scroll_down();
                }
            } else if in_analysis {
                app.analysis_nav_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                for _ in 0..3 {
                    app.scroll_up();
                }
            } else if in_analysis {
                app.analysis_nav_up();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p3_core::{AnalysisType, MockAnalyst};
    use std::sync::Arc;
    use std::time::Duration;

    fn app() -> App {
        let backend = Arc::new(MockAnalyst::with_seed(3).with_latency(Duration::ZERO));
        App::new(Role::Developer, backend, true)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[test]
    fn test_edit_line_multibyte() {
        let mut input = String::new();
        let mut cursor = 0;
        for c in "añb".chars() {
            edit_line(&mut input, &mut cursor, KeyCode::Char(c));
        }
        edit_line(&mut input, &mut cursor, KeyCode::Left);
        edit_line(&mut input, &mut cursor, KeyCode::Backspace);
        assert_eq!(input, "ab");
        assert_eq!(cursor, 1);
        edit_line(&mut input, &mut cursor, KeyCode::Home);
        edit_line(&mut input, &mut cursor, KeyCode::Delete);
        assert_eq!(input, "b");
    }

    #[test]
    fn test_role_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.role(), Role::ProjectManager);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.role(), Role::Qa);
    }

    #[test]
    fn test_typing_does_not_trigger_shortcuts() {
        let mut app = app();
        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.input_mode, InputMode::Editing);
        type_str(&mut app, "q123");
        assert!(!app.should_quit);
        assert_eq!(app.role(), Role::Developer);
        assert_eq!(app.source_input, "q123");
    }

    #[test]
    fn test_submit_without_selection_shows_guidance() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "hello");
        press(&mut app, KeyCode::Enter);
        assert!(app.request_task.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
        let last = app.controller.state().last_message().unwrap();
        assert_eq!(last.text, p3_core::controller::MISSING_SELECTION);
    }

    #[tokio::test]
    async fn test_rejected_message_keeps_typed_text() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "long question");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.query_input, "long question");
        assert_eq!(app.query_cursor, "long question".len());
        assert_eq!(
            app.controller.state().last_message().unwrap().text,
            p3_core::controller::MISSING_SELECTION
        );

        // Once the selection is complete the same text goes out and the box clears
        app.focus = FocusPane::Analysis;
        press(&mut app, KeyCode::Enter);
        app.source_input = "https://acme.atlassian.net/wiki/p".into();
        press(&mut app, KeyCode::Char('i'));
        press(&mut app, KeyCode::Enter);
        assert!(app.request_task.is_some());
        assert!(app.query_input.is_empty());
        assert_eq!(app.query_cursor, 0);
    }

    #[tokio::test]
    async fn test_analyze_from_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.controller.state().analysis_type(), Some(AnalysisType::Lld));
        press(&mut app, KeyCode::Char('u'));
        type_str(&mut app, "acme.atlassian.net/wiki/p");
        press(&mut app, KeyCode::Enter);
        assert!(app.is_loading());

        while app.request_task.is_some() {
            tokio::time::sleep(Duration::from_millis(5)).await;
            handle_event(&mut app, AppEvent::Tick).await.unwrap();
        }
        let texts: Vec<&str> = app
            .controller
            .state()
            .messages()
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert!(texts.contains(&"I'm analyzing this Confluence page: https://acme.atlassian.net/wiki/p"));
        assert!(texts.contains(&p3_core::controller::ANALYSIS_COMPLETED));
    }
}
