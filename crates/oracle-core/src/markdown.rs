//! Markdown to sanitized HTML for model answers

use pulldown_cmark::{html, Event, Options, Parser};

/// Renders untrusted markdown into HTML that is safe to inject
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
    breaks: bool,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        Self { options, breaks: true }
    }

    /// Keep single newlines as soft breaks instead of `<br>`
    pub fn without_breaks(mut self) -> Self {
        self.breaks = false;
        self
    }

    pub fn render(&self, raw: &str) -> String {
        sanitize(&self.to_html(raw))
    }

    fn to_html(&self, raw: &str) -> String {
        let breaks = self.breaks;
        let parser = Parser::new_ext(raw, self.options).map(move |event| match event {
            Event::SoftBreak if breaks => Event::HardBreak,
            other => other,
        });

        let mut out = String::with_capacity(raw.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Strip scripts, event handlers and unsafe URL schemes
pub fn sanitize(html: &str) -> String {
    ammonia::clean(html)
}
