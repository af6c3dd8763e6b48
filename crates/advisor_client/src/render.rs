//! Markdown → sanitized HTML for the output area.

use pulldown_cmark::{html, Options, Parser};

/// Render `markdown` as HTML, then strip anything unsafe (scripts, event
/// handler attributes, `javascript:` links).
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut raw = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut raw, parser);

    ammonia::clean(&raw)
}
