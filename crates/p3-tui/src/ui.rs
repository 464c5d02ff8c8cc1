use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap},
};
use p3_core::markdown::{Block as MdBlock, Document, Inline};
use p3_core::{Role, Sender, Source};

use crate::app::{App, FocusPane, InputMode, SourceKind};

fn inline_spans(inlines: &[Inline], style: Style, lines: &mut Vec<Vec<Span<'static>>>) {
    for inline in inlines {
        let span = match inline {
            Inline::Text(text) => Span::styled(text.clone(), style),
            Inline::Code(code) => Span::styled(code.clone(), style.fg(Color::Green)),
            Inline::Strong(children) => {
                inline_spans(children, style.add_modifier(Modifier::BOLD), lines);
                continue;
            }
            Inline::Emphasis(children) => {
                inline_spans(children, style.add_modifier(Modifier::ITALIC), lines);
                continue;
            }
            Inline::LineBreak => {
                lines.push(Vec::new());
                continue;
            }
        };
        if let Some(line) = lines.last_mut() {
            line.push(span);
        }
    }
}

fn inline_lines(inlines: &[Inline], style: Style) -> Vec<Line<'static>> {
    let mut lines = vec![Vec::new()];
    inline_spans(inlines, style, &mut lines);
    lines.into_iter().map(Line::from).collect()
}

fn heading_style(level: u8) -> Style {
    match level {
        1 => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        2 => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        _ => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

/// Puts `first` before the first line and `rest` before the others.
fn prefixed(mut lines: Vec<Line<'static>>, first: String, rest: &str) -> Vec<Line<'static>> {
    if lines.is_empty() {
        lines.push(Line::default());
    }
    let style = Style::default().fg(Color::DarkGray);
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let marker = if i == 0 { first.clone() } else { rest.to_string() };
            let mut spans = vec![Span::styled(marker, style)];
            spans.extend(line.spans);
            Line::from(spans)
        })
        .collect()
}

fn block_lines(block: &MdBlock) -> Vec<Line<'static>> {
    match block {
        MdBlock::Heading { level, content } => inline_lines(content, heading_style(*level)),
        MdBlock::Paragraph(content) | MdBlock::Text(content) => {
            inline_lines(content, Style::default())
        }
        MdBlock::CodeBlock { code, .. } => code
            .lines()
            .map(|line| {
                Line::from(Span::styled(
                    format!("  {}", line),
                    Style::default().fg(Color::Green),
                ))
            })
            .collect(),
        MdBlock::List { start, items } => {
            let mut lines = Vec::new();
            for (n, item) in (0u64..).zip(items) {
                let bullet = match start {
                    Some(first) => format!("{}. ", first + n),
                    None => "• ".to_string(),
                };
                let indent = " ".repeat(bullet.chars().count());
                lines.extend(prefixed(blocks_lines(item, false), bullet, &indent));
            }
            lines
        }
        MdBlock::Quote(blocks) => prefixed(blocks_lines(blocks, true), "│ ".to_string(), "│ "),
        MdBlock::Rule => vec![Line::from(Span::styled(
            "─".repeat(24),
            Style::default().fg(Color::DarkGray),
        ))],
    }
}

/// Blocks separated by a blank line when `spaced`; list items stay tight.
fn blocks_lines(blocks: &[MdBlock], spaced: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        if spaced && i > 0 {
            lines.push(Line::default());
        }
        lines.extend(block_lines(block));
    }
    lines
}

/// Converts a parsed reply into styled terminal lines.
fn document_lines(document: &Document) -> Vec<Line<'static>> {
    blocks_lines(&document.blocks, true)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, roles, body, footer
    let [header_area, roles_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_roles(app, frame, roles_area);

    let [side_area, main_area] = Layout::horizontal([
        Constraint::Length(34),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_sidebar(app, frame, side_area);
    render_chat_panel(app, frame, main_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mode = if app.offline { " [offline]" } else { "" };

    let title = Line::from(vec![
        Span::styled(" P3 - Peak Productivity Partner ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(mode, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_roles(app: &App, frame: &mut Frame, area: Rect) {
    let roles = Role::all();
    let titles: Vec<Line> = roles
        .iter()
        .enumerate()
        .map(|(i, role)| Line::from(format!(" {} {} ", i + 1, role.display_name())))
        .collect();
    let selected = roles.iter().position(|r| *r == app.role()).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" Role "))
        .select(selected)
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn border_color(focused: bool) -> Color {
    if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    }
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let [analysis_area, source_area, status_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(4),
        Constraint::Length(if app.status.is_some() { 3 } else { 0 }),
    ])
    .areas(area);

    app.analysis_area = Some(analysis_area);

    // Analysis picker
    let selected_type = app.controller.state().analysis_type();
    let items: Vec<ListItem> = app
        .analysis_options()
        .iter()
        .map(|t| {
            let marker = if Some(*t) == selected_type { "[x]" } else { "[ ]" };
            ListItem::new(format!("{} {}", marker, t.display_name()))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color(app.focus == FocusPane::Analysis)))
                .title(" Analysis "),
        )
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, analysis_area, &mut app.analysis_state);

    // Source box
    let editing = app.focus == FocusPane::Source && app.input_mode == InputMode::Editing;
    let title = match app.source_kind {
        SourceKind::Url => " Confluence URL (m: PDF) ",
        SourceKind::File => " PDF path (m: URL) ",
    };
    let source_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing {
            Color::Yellow
        } else {
            border_color(app.focus == FocusPane::Source)
        }))
        .title(title);

    let attached = match app.controller.state().source() {
        Source::File(file) => Span::styled(
            format!("attached: {}", file.name),
            Style::default().fg(Color::DarkGray),
        ),
        _ => Span::raw(""),
    };

    let inner_width = source_area.width.saturating_sub(2) as usize;
    let scroll_offset = horizontal_scroll(app.source_cursor, inner_width);
    let visible: String = app
        .source_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();
    let source = Paragraph::new(vec![
        Line::from(Span::styled(visible, Style::default().fg(Color::Cyan))),
        Line::from(attached),
    ])
    .block(source_block);
    frame.render_widget(source, source_area);

    if editing {
        let cursor_x = (app.source_cursor - scroll_offset) as u16;
        frame.set_cursor_position((source_area.x + cursor_x + 1, source_area.y + 1));
    }

    if let Some(status) = &app.status {
        let status = Paragraph::new(status.as_str())
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(status, status_area);
    }
}

/// Offset that keeps the cursor inside a single-line input of `width` columns.
fn horizontal_scroll(cursor: usize, width: usize) -> usize {
    if width == 0 {
        0
    } else if cursor >= width {
        cursor - width + 1
    } else {
        0
    }
}

/// Everything the chat panel draws, before wrapping.
pub fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.controller.state().messages() {
        match msg.sender {
            Sender::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Sender::Assistant => {
                lines.push(Line::from(Span::styled(
                    "P3:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(document_lines(&msg.document));
            }
        }
        lines.push(Line::default());
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            "P3:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("{} {}", app.loading_message(), dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_focused = app.focus == FocusPane::Chat;

    if app.show_extracted {
        let extracted = app
            .controller
            .state()
            .last_extracted_content()
            .unwrap_or_default()
            .to_string();
        let panel = Paragraph::new(extracted)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Magenta))
                    .title(" Extracted content (x to close) "),
            )
            .wrap(Wrap { trim: false })
            .scroll((app.extracted_scroll, 0));
        frame.render_widget(panel, chat_area);
    } else {
        let analysis = app
            .controller
            .state()
            .analysis_type()
            .map(|t| t.display_name())
            .unwrap_or("no analysis selected");
        let chat_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color(chat_focused)))
            .title(format!(" {} mode: {} ", app.role().display_name(), analysis));

        let chat = Paragraph::new(Text::from(chat_lines(app)))
            .block(chat_block)
            .wrap(Wrap { trim: false })
            .scroll((app.chat_scroll, 0));
        frame.render_widget(chat, chat_area);
    }

    // Feedback input
    let editing = app.focus == FocusPane::Input && app.input_mode == InputMode::Editing;
    let input_border = if editing {
        Color::Yellow
    } else {
        border_color(app.focus == FocusPane::Input)
    };
    let input_title = if app.is_loading() {
        " Waiting for response... "
    } else {
        " Message (i to type, Enter to send) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border))
        .title(input_title);

    let inner_width = input_area.width.saturating_sub(2) as usize;
    let scroll_offset = horizontal_scroll(app.query_cursor, inner_width);
    let visible_text: String = app
        .query_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if editing {
        let cursor_x = (app.query_cursor - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Normal => &[
            ("1-3", "role"),
            ("Tab", "focus"),
            ("Enter", "select"),
            ("u/f", "url/pdf"),
            ("s", "analyze"),
            ("i", "message"),
            ("x", "extracted"),
            ("q", "quit"),
        ],
        InputMode::Editing => &[("Enter", "send"), ("Esc", "done"), ("Tab", "next")],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use p3_core::markdown;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_document_lines() {
        let doc = markdown::parse("# Title\n\n### Section\n- **bold** item\n- `code`\n\n```\nfn main() {}\n```");
        let lines = document_lines(&doc);
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(
            text,
            vec![
                "Title",
                "",
                "Section",
                "",
                "• bold item",
                "• code",
                "",
                "  fn main() {}",
            ]
        );
        let bold = &lines[4].spans[1];
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_nested_list_and_quote_lines() {
        let doc = markdown::parse("1. **Auth**\n   - no lockout\n2. Data\n\n> Note: draft\n> more");
        let text: Vec<String> = document_lines(&doc).iter().map(plain).collect();
        assert_eq!(
            text,
            vec![
                "1. Auth",
                "   • no lockout",
                "2. Data",
                "",
                "│ Note: draft",
                "│ more",
            ]
        );
    }

    #[test]
    fn test_ordered_list_numbers_from_start() {
        let doc = markdown::parse("4. four\n5. five");
        let text: Vec<String> = document_lines(&doc).iter().map(plain).collect();
        assert_eq!(text, vec!["4. four", "5. five"]);
    }

    #[test]
    fn test_horizontal_scroll() {
        assert_eq!(horizontal_scroll(3, 10), 0);
        assert_eq!(horizontal_scroll(10, 10), 1);
        assert_eq!(horizontal_scroll(5, 0), 0);
    }
}
