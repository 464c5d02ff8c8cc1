//! Markdown tree for assistant replies.
//!
//! Replies are parsed with `pulldown-cmark` into a small block/inline tree
//! that the TUI walks to draw styled lines. HTML output goes through the
//! parser's own renderer. Raw HTML in a reply is kept as text either way.

use pulldown_cmark::{html, CodeBlockKind, Event, Parser as MdParser, Tag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Code(String),
    /// Soft or hard break; source lines are kept apart when rendered.
    LineBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph(Vec<Inline>),
    /// Inline content of a tight list item, not wrapped in a paragraph.
    Text(Vec<Inline>),
    CodeBlock { language: Option<String>, code: String },
    /// `start` is set for ordered lists.
    List { start: Option<u64>, items: Vec<Vec<Block>> },
    Quote(Vec<Block>),
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// Open container while walking parser events.
enum Frame {
    Paragraph(Vec<Inline>),
    Loose(Vec<Inline>),
    Heading(u8, Vec<Inline>),
    Code { language: Option<String>, code: String },
    List { start: Option<u64>, items: Vec<Vec<Block>> },
    Item(Vec<Block>),
    Quote(Vec<Block>),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    /// Links and images keep only their text.
    Span(Vec<Inline>),
    Skip,
}

impl Frame {
    fn inlines_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Frame::Paragraph(content)
            | Frame::Loose(content)
            | Frame::Heading(_, content)
            | Frame::Strong(content)
            | Frame::Emphasis(content)
            | Frame::Span(content) => Some(content),
            _ => None,
        }
    }
}

#[derive(Default)]
struct TreeBuilder {
    blocks: Vec<Block>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                match self.stack.last_mut() {
                    Some(Frame::Code { code, .. }) => code.push_str(&text),
                    _ => self.push_inline(Inline::Text(text.into_string())),
                }
            }
            Event::Code(code) => self.push_inline(Inline::Code(code.into_string())),
            Event::SoftBreak | Event::HardBreak => self.push_inline(Inline::LineBreak),
            Event::Rule => {
                self.close_loose();
                self.push_block(Block::Rule);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Strong => return self.open_span(Frame::Strong(Vec::new())),
            Tag::Emphasis => return self.open_span(Frame::Emphasis(Vec::new())),
            Tag::Link { .. } | Tag::Image { .. } => return self.open_span(Frame::Span(Vec::new())),
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading(level as u8, Vec::new()),
            Tag::CodeBlock(kind) => Frame::Code {
                language: match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
                    CodeBlockKind::Indented => None,
                },
                code: String::new(),
            },
            Tag::HtmlBlock => Frame::Code {
                language: None,
                code: String::new(),
            },
            Tag::List(start) => Frame::List {
                start,
                items: Vec::new(),
            },
            Tag::Item => Frame::Item(Vec::new()),
            Tag::BlockQuote(_) => Frame::Quote(Vec::new()),
            _ => Frame::Skip,
        };
        self.close_loose();
        self.stack.push(frame);
    }

    fn end(&mut self) {
        self.close_loose();
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Paragraph(content) => self.push_block(Block::Paragraph(content)),
            Frame::Heading(level, content) => self.push_block(Block::Heading { level, content }),
            Frame::Code { language, mut code } => {
                code.truncate(code.trim_end_matches('\n').len());
                self.push_block(Block::CodeBlock { language, code });
            }
            Frame::List { start, items } => self.push_block(Block::List { start, items }),
            Frame::Item(blocks) => {
                if let Some(Frame::List { items, .. }) = self.stack.last_mut() {
                    items.push(blocks);
                }
            }
            Frame::Quote(blocks) => self.push_block(Block::Quote(blocks)),
            Frame::Strong(content) => self.push_inline(Inline::Strong(content)),
            Frame::Emphasis(content) => self.push_inline(Inline::Emphasis(content)),
            Frame::Span(content) => content.into_iter().for_each(|inline| self.push_inline(inline)),
            Frame::Loose(_) | Frame::Skip => {}
        }
    }

    /// Inline content directly under a block container gets a loose text block.
    fn open_inline_context(&mut self) {
        if matches!(self.stack.last(), None | Some(Frame::Item(_) | Frame::Quote(_))) {
            self.stack.push(Frame::Loose(Vec::new()));
        }
    }

    fn open_span(&mut self, frame: Frame) {
        self.open_inline_context();
        self.stack.push(frame);
    }

    fn close_loose(&mut self) {
        if !matches!(self.stack.last(), Some(Frame::Loose(_))) {
            return;
        }
        if let Some(Frame::Loose(content)) = self.stack.pop() {
            self.push_block(Block::Text(content));
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        self.open_inline_context();
        let Some(content) = self.stack.last_mut().and_then(Frame::inlines_mut) else {
            return;
        };
        // The parser splits text at delimiter runs and entities
        match (content.last_mut(), inline) {
            (Some(Inline::Text(prev)), Inline::Text(next)) => prev.push_str(&next),
            (_, inline) => content.push(inline),
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.stack.last_mut() {
            None => self.blocks.push(block),
            Some(Frame::Item(blocks) | Frame::Quote(blocks)) => blocks.push(block),
            _ => {}
        }
    }

    fn finish(mut self) -> Document {
        while !self.stack.is_empty() {
            self.end();
        }
        Document {
            blocks: self.blocks,
        }
    }
}

pub fn parse(text: &str) -> Document {
    let mut builder = TreeBuilder::default();
    for event in MdParser::new(text) {
        builder.event(event);
    }
    builder.finish()
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Renders `text` to HTML. Raw HTML in the source is emitted as escaped text.
pub fn to_html(text: &str) -> String {
    let events = MdParser::new(text).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn paragraph(s: &str) -> Block {
        Block::Paragraph(vec![text(s)])
    }

    fn item(s: &str) -> Vec<Block> {
        vec![Block::Text(vec![text(s)])]
    }

    #[test]
    fn test_headings() {
        let doc = parse("# One\n### Three\n####### not a heading\n#hashtag");
        assert_eq!(
            doc.blocks,
            vec![
                Block::Heading { level: 1, content: vec![text("One")] },
                Block::Heading { level: 3, content: vec![text("Three")] },
                Block::Paragraph(vec![
                    text("####### not a heading"),
                    Inline::LineBreak,
                    text("#hashtag"),
                ]),
            ]
        );
    }

    #[test]
    fn test_inline_emphasis_and_code() {
        let doc = parse("a **bold *mixed* text** and `x*y*z` and _it_");
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![
                text("a "),
                Inline::Strong(vec![
                    text("bold "),
                    Inline::Emphasis(vec![text("mixed")]),
                    text(" text"),
                ]),
                text(" and "),
                Inline::Code("x*y*z".to_string()),
                text(" and "),
                Inline::Emphasis(vec![text("it")]),
            ])]
        );
    }

    #[test]
    fn test_identifiers_with_underscores_stay_plain() {
        assert_eq!(parse("use code_gen or test_plan").blocks, vec![paragraph("use code_gen or test_plan")]);
    }

    #[test]
    fn test_unclosed_markers_are_literal() {
        assert_eq!(parse("2 * 3 = 6 and **open").blocks, vec![paragraph("2 * 3 = 6 and **open")]);
    }

    #[test]
    fn test_flat_lists() {
        let doc = parse("- a\n- b\n\n1. one\n2. two\n\nafter");
        assert_eq!(
            doc.blocks,
            vec![
                Block::List { start: None, items: vec![item("a"), item("b")] },
                Block::List { start: Some(1), items: vec![item("one"), item("two")] },
                paragraph("after"),
            ]
        );
    }

    #[test]
    fn test_nested_list_stays_inside_its_item() {
        let doc = parse("1. **Auth**\n   - no lockout\n   - no recovery\n2. **Data**\n\n> Note: draft");
        assert_eq!(
            doc.blocks,
            vec![
                Block::List {
                    start: Some(1),
                    items: vec![
                        vec![
                            Block::Text(vec![Inline::Strong(vec![text("Auth")])]),
                            Block::List {
                                start: None,
                                items: vec![item("no lockout"), item("no recovery")],
                            },
                        ],
                        vec![Block::Text(vec![Inline::Strong(vec![text("Data")])])],
                    ],
                },
                Block::Quote(vec![paragraph("Note: draft")]),
            ]
        );
    }

    #[test]
    fn test_nested_list_and_quote_html() {
        let html = to_html("1. **Auth**\n   - no lockout\n   - no recovery\n2. **Data**\n\n> Note: draft");
        assert_eq!(html.matches("<ol>").count(), 1);
        assert_eq!(html.matches("<ul>").count(), 1);
        assert!(html.contains("<li><strong>Auth</strong>\n<ul>\n<li>no lockout</li>\n<li>no recovery</li>\n</ul>\n</li>"));
        assert!(html.contains("<li><strong>Data</strong></li>\n</ol>"));
        assert!(html.contains("<blockquote>\n<p>Note: draft</p>\n</blockquote>"));
        assert!(!html.contains("&gt;"));
    }

    #[test]
    fn test_ordered_list_keeps_start_number() {
        assert!(to_html("3. three\n4. four").starts_with("<ol start=\"3\">"));
    }

    #[test]
    fn test_fenced_code_is_not_parsed() {
        let doc = parse("```rust\nlet x = **y**;\n# not heading\n```\ntail");
        assert_eq!(
            doc.blocks,
            vec![
                Block::CodeBlock {
                    language: Some("rust".to_string()),
                    code: "let x = **y**;\n# not heading".to_string(),
                },
                paragraph("tail"),
            ]
        );
    }

    #[test]
    fn test_to_html_escapes_once() {
        let html = to_html("second <line> & more\n\n```\n<div>\n```");
        assert_eq!(
            html,
            "<p>second &lt;line&gt; &amp; more</p>\n<pre><code>&lt;div&gt;\n</code></pre>\n"
        );
        assert!(!html.contains("&amp;lt;"));
    }

    #[test]
    fn test_ordered_start_is_kept_in_tree() {
        let doc = parse("3. three\n4. four");
        assert_eq!(
            doc.blocks,
            vec![Block::List { start: Some(3), items: vec![item("three"), item("four")] }]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert_eq!(to_html(""), "");
    }
}
