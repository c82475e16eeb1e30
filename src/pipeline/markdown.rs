//! Markdown → HTML fragment via pulldown-cmark.
//!
//! The extension set is fixed: GFM tables are switched on, fenced code blocks
//! are part of CommonMark itself, and CommonMark's list rules give the strict
//! ("sane") list behaviour: switching from `-` to `1.` starts a new list and
//! nesting follows the content column rather than lenient guessing.
//!
//! The same function feeds both the live preview and the PDF pipeline, so a
//! preview always shows exactly the fragment that ends up in the document.

use pulldown_cmark::{html, Options, Parser};
use tracing::debug;

/// Starter document shown when there is nothing else to convert.
pub const SAMPLE_MARKDOWN: &str = "# Markdown to PDF\n\nType your **Markdown** on the left.\n\n- Headings\n- Lists\n- *Emphasis*\n\n> Blockquotes are supported too.\n\n```python\nprint(\"Hello, PDF!\")\n```\n";

/// The named extensions the renderer runs with.
///
/// Not configurable; exposed so callers and tests can see what is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownExtensions {
    pub fenced_code: bool,
    pub tables: bool,
    pub strict_lists: bool,
}

impl MarkdownExtensions {
    /// Fenced code blocks, tables, strict list parsing.
    pub const FIXED: MarkdownExtensions = MarkdownExtensions {
        fenced_code: true,
        tables: true,
        strict_lists: true,
    };

    /// Extension names in the order the converter documents them.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(3);
        if self.fenced_code {
            names.push("fenced_code");
        }
        if self.tables {
            names.push("tables");
        }
        if self.strict_lists {
            names.push("sane_lists");
        }
        names
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        // fenced_code and strict_lists are CommonMark defaults in pulldown-cmark
        options
    }
}

/// Render Markdown to an HTML fragment (no `<html>`/`<body>` wrapper).
///
/// Never fails; any UTF-8 string is valid Markdown.
pub fn render_fragment(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, MarkdownExtensions::FIXED.parser_options());
    let mut fragment = String::with_capacity(markdown.len() + markdown.len() / 2);
    html::push_html(&mut fragment, parser);
    debug!(
        "Rendered {} bytes of Markdown → {} bytes of HTML",
        markdown.len(),
        fragment.len()
    );
    fragment
}
