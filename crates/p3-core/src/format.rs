//! Normalizes generated analysis text into a single display message.

use std::sync::OnceLock;

use regex::Regex;

use crate::markdown::{self, Document};

/// A reply ready for display: the normalized markdown and its parsed tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayContent {
    pub text: String,
    pub document: Document,
}

impl DisplayContent {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn to_html(&self) -> String {
        markdown::to_html(&self.text)
    }
}

fn section_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `###` at line start, but not `####` and deeper
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*###(?:[^#\n]|$)").expect("valid section regex"))
}

fn title_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*##[ \t]+(.+?)[ \t]*$").expect("valid title regex"))
}

/// Normalizes `raw` and parses it for rendering.
pub fn format(raw: &str) -> DisplayContent {
    let text = format_text(raw);
    let document = markdown::parse(&text);
    DisplayContent { text, document }
}

/// Rewrites sectioned text so it reads as one document:
///
/// * a `## Title` line before the first section becomes `# Title`
/// * every non-empty `###` section is re-emitted under a `### ` heading
///
/// Text without `###` sections is returned unchanged.
pub fn format_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let starts: Vec<usize> = section_marker().find_iter(raw).map(|m| m.start()).collect();
    let Some(&first) = starts.first() else {
        return raw.to_string();
    };

    let mut formatted = String::new();
    let mut preamble = raw[..first].to_string();

    let title = title_line()
        .captures(&preamble)
        .and_then(|caps| Some((caps.get(0)?.range(), caps.get(1)?.as_str().to_string())));
    if let Some((line, title)) = title {
        formatted.push_str(&format!("# {}\n\n", title));
        preamble.replace_range(line, "");
    }

    let preamble = preamble.trim();
    if !preamble.is_empty() {
        formatted.push_str(preamble);
        formatted.push_str("\n\n");
    }

    let ends = starts.iter().skip(1).copied().chain(std::iter::once(raw.len()));
    for (start, end) in starts.iter().copied().zip(ends) {
        let section = raw[start..end].trim_start().trim_start_matches("###").trim();
        if !section.is_empty() {
            formatted.push_str(&format!("### {}\n\n", section));
        }
    }

    formatted.trim_end().to_string()
}
