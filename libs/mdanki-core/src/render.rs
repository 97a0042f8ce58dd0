//! Markdown to HTML rendering for note fields.
//!
//! Math is handed to Anki's MathJax: `$...$` becomes `\(...\)` and
//! `$$...$$` becomes `\[...\]`. Everything else is plain CommonMark.

use pulldown_cmark::{html, CowStr, Event, Options, Parser};

/// Render markdown text to the HTML stored in a note field.
pub fn render_markdown(text: &str) -> String {
    let events = Parser::new_ext(text, Options::ENABLE_MATH).map(|event| match event {
        Event::InlineMath(tex) => math(r"\(", &tex, r"\)"),
        Event::DisplayMath(tex) => math(r"\[", &tex, r"\]"),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn math(open: &str, tex: &str, close: &str) -> Event<'static> {
    Event::InlineHtml(CowStr::from(format!("{open}{}{close}", escape(tex))))
}

fn escape(tex: &str) -> String {
    let mut escaped = String::with_capacity(tex.len());
    for ch in tex.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
