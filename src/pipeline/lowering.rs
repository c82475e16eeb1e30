//! Rewrite a styled document into the element set printpdf can lay out.
//!
//! printpdf's HTML engine keeps only a fixed list of tags (`div`, `p`,
//! headings, `span`, lists, `strong`/`em`, links, images, `br`, `hr` and flat
//! tables). Any other element is dropped together with everything inside it,
//! so a `<pre>` block or a `<blockquote>` would vanish from the page. This
//! pass renames those elements to supported ones before layout:
//!
//! | Input | Laid out as |
//! |-------|-------------|
//! | `pre` | `div.md-pre`, line breaks become `<br>`, indentation kept |
//! | `code` and other inline tags | `span` |
//! | `blockquote` and other block tags | `div` |
//! | `table`, `tr` | `div.md-table`, `div.md-row`; cells joined with ` \| ` |
//! | `thead`, `tbody`, `tfoot`, void tags | removed, children kept |
//!
//! Only the `<body>` is rewritten. The text that should end up on the page is
//! collected along the way so the renderer can check nothing went missing.

/// Tags printpdf lays out as-is.
const SUPPORTED: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "img", "a", "ul", "ol", "li", "hr",
    "br", "strong", "em", "b", "i",
];

/// Tags printpdf strips before layout; their text never reaches the page.
const STRIPPED: &[&str] = &[
    "script", "noscript", "style", "template", "iframe", "canvas", "audio", "video", "object",
    "embed", "picture", "svg",
];

const BLOCK: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "dd", "details", "dl", "dt",
    "figcaption", "figure", "footer", "header", "main", "nav", "section", "summary",
];

/// Void tags other than the supported `br`, `hr` and `img`.
const VOID: &[&str] = &[
    "area", "base", "col", "input", "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Extra rules for the renamed elements.
///
/// printpdf only matches single selectors, so each class gets its own rule.
pub(crate) const LOWERED_STYLESHEET: &str = "
.md-pre { font-family: monospace; background-color: #f6f6f6; padding: 12px; }
.md-code { font-family: monospace; }
.md-blockquote { border-left: 4px solid #ddd; padding-left: 12px; color: #555; }
";

/// A document ready for printpdf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lowered {
    pub html: String,
    /// Body text as it should appear on the page, markup and entities removed.
    pub text: String,
}

/// Lower `html` for printpdf's layout engine.
pub(crate) fn lower_document(html: &str) -> Lowered {
    let (head, body, tail) = split_body(html);

    let mut lowerer = Lowerer::default();
    lowerer.run(body);

    let mut out = String::with_capacity(html.len() + LOWERED_STYLESHEET.len() + 32);
    match find_ci(head, "</head>") {
        Some(at) => {
            out.push_str(&head[..at]);
            push_style(&mut out);
            out.push_str(&head[at..]);
        }
        None => {
            push_style(&mut out);
            out.push_str(head);
        }
    }
    out.push_str(&lowerer.out);
    out.push_str(tail);

    Lowered {
        html: out,
        text: lowerer.text,
    }
}

fn push_style(out: &mut String) {
    out.push_str("<style>");
    out.push_str(LOWERED_STYLESHEET);
    out.push_str("</style>");
}

/// Split into (everything up to and including `<body ...>`, body, `</body>` onwards).
fn split_body(html: &str) -> (&str, &str, &str) {
    let body_start = find_ci(html, "<body")
        .and_then(|at| html[at..].find('>').map(|end| at + end + 1));
    let Some(start) = body_start else {
        return ("", html, "");
    };
    let end = rfind_ci(html, "</body>")
        .filter(|&end| end >= start)
        .unwrap_or(html.len());
    (&html[..start], &html[start..end], &html[end..])
}

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

fn rfind_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .rposition(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

#[derive(Default)]
struct Lowerer {
    out: String,
    text: String,
    /// Depth inside stripped elements.
    stripped: usize,
    /// Depth inside `pre`.
    pre: usize,
    at_line_start: bool,
    first_cell: bool,
}

struct Tag<'a> {
    raw: &'a str,
    name: String,
    closing: bool,
    self_closing: bool,
}

impl Lowerer {
    fn run(&mut self, body: &str) {
        let mut rest = body;
        while let Some(lt) = rest.find('<') {
            self.push_text(&rest[..lt]);
            rest = &rest[lt..];

            if rest.starts_with("<!--") {
                let end = rest.find("-->").map_or(rest.len(), |e| e + 3);
                self.out.push_str(&rest[..end]);
                rest = &rest[end..];
                continue;
            }

            match parse_tag(rest) {
                Some(tag) => {
                    rest = &rest[tag.raw.len()..];
                    self.push_tag(&tag);
                }
                None => {
                    // A stray `<` is text.
                    self.push_text("<");
                    rest = &rest[1..];
                }
            }
        }
        self.push_text(rest);
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.stripped > 0 {
            self.out.push_str(text);
            return;
        }

        self.text.push_str(&strip_entities(text));
        self.text.push(' ');

        if self.pre == 0 {
            self.out.push_str(text);
            return;
        }
        for ch in text.chars() {
            match ch {
                '\n' => {
                    self.out.push_str("<br>");
                    self.at_line_start = true;
                }
                ' ' if self.at_line_start => self.out.push_str("&#160;"),
                '\t' if self.at_line_start => self.out.push_str("&#160;&#160;&#160;&#160;"),
                _ => {
                    self.out.push(ch);
                    self.at_line_start = false;
                }
            }
        }
    }

    fn push_tag(&mut self, tag: &Tag<'_>) {
        let name = tag.name.as_str();

        if STRIPPED.contains(&name) {
            if !tag.self_closing {
                if tag.closing {
                    self.stripped = self.stripped.saturating_sub(1);
                } else {
                    self.stripped += 1;
                }
            }
            self.out.push_str(tag.raw);
            return;
        }
        if self.stripped > 0 || SUPPORTED.contains(&name) || name.is_empty() {
            self.out.push_str(tag.raw);
            return;
        }

        match (name, tag.closing) {
            ("pre", false) => {
                self.pre += 1;
                self.at_line_start = true;
                self.out.push_str("<div class=\"md-pre\">");
            }
            ("pre", true) => {
                self.pre = self.pre.saturating_sub(1);
                self.out.push_str("</div>");
            }
            ("code", false) => self.out.push_str("<span class=\"md-code\">"),
            ("blockquote", false) => self.out.push_str("<div class=\"md-blockquote\">"),
            ("table", false) => self.out.push_str("<div class=\"md-table\">"),
            ("tr", false) => {
                self.first_cell = true;
                self.out.push_str("<div class=\"md-row\">");
            }
            ("th", false) | ("td", false) => {
                if !self.first_cell {
                    self.out.push_str(" | ");
                }
                self.first_cell = false;
                self.out.push_str(if name == "th" { "<strong>" } else { "<span>" });
            }
            ("th", true) => self.out.push_str("</strong>"),
            ("td", true) => self.out.push_str("</span>"),
            ("thead" | "tbody" | "tfoot" | "colgroup" | "caption", _) => {}
            _ if VOID.contains(&name) => {}
            (_, closing) if tag.self_closing && !closing => {}
            (_, closing) => {
                let block = BLOCK.contains(&name) || matches!(name, "table" | "tr" | "blockquote");
                let element = if block { "div" } else { "span" };
                self.out.push('<');
                if closing {
                    self.out.push('/');
                }
                self.out.push_str(element);
                self.out.push('>');
            }
        }
    }
}

/// Parse one tag at the start of `input`, which begins with `<`.
fn parse_tag(input: &str) -> Option<Tag<'_>> {
    let bytes = input.as_bytes();
    let mut i = 1;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }
    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let name_end = i;
    let declaration = bytes.get(name_start).is_some_and(|&b| b == b'!' || b == b'?');
    if name_end == name_start && !declaration {
        return None;
    }

    let mut quote = None;
    while i < bytes.len() {
        match (bytes[i], quote) {
            (b'"' | b'\'', None) => quote = Some(bytes[i]),
            (q, Some(open)) if q == open => quote = None,
            (b'>', None) => {
                let raw = &input[..=i];
                return Some(Tag {
                    raw,
                    name: input[name_start..name_end].to_ascii_lowercase(),
                    closing,
                    self_closing: raw.ends_with("/>"),
                });
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Replace `&...;` references with a space.
fn strip_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let len = after
            .find(';')
            .filter(|&semi| semi > 0 && semi <= 10)
            .filter(|&semi| after[..semi].bytes().all(|b| b.is_ascii_alphanumeric() || b == b'#'));
        match len {
            Some(semi) => {
                out.push(' ');
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render_document;

    fn body(html: &str) -> String {
        let lowered = lower_document(html);
        let (_, body, _) = split_body(&lowered.html);
        body.to_string()
    }

    #[test]
    fn pre_becomes_div_with_line_breaks() {
        let out = body("<body><pre><code class=\"language-python\">def f():\n    return 1\n</code></pre></body>");
        assert_eq!(
            out,
            "<div class=\"md-pre\"><span class=\"md-code\">def f():<br>&#160;&#160;&#160;&#160;return 1<br></span></div>"
        );
    }

    #[test]
    fn inline_code_keeps_its_text() {
        let out = body("<body><p>Use <code>cargo</code> here</p></body>");
        assert_eq!(out, "<p>Use <span class=\"md-code\">cargo</span> here</p>");
    }

    #[test]
    fn blockquote_becomes_div() {
        let out = body("<body><blockquote>\n<p>Quoted</p>\n</blockquote></body>");
        assert_eq!(out, "<div class=\"md-blockquote\">\n<p>Quoted</p>\n</div>");
    }

    #[test]
    fn table_rows_become_divs() {
        let out = body(
            "<body><table><thead><tr><th>Name</th><th style=\"text-align: right\">Qty</th></tr></thead>\
             <tbody><tr><td>apples</td><td>3</td></tr></tbody></table></body>",
        );
        assert_eq!(
            out,
            "<div class=\"md-table\"><div class=\"md-row\"><strong>Name</strong> | <strong>Qty</strong></div>\
             <div class=\"md-row\"><span>apples</span> | <span>3</span></div></div>"
        );
    }

    #[test]
    fn supported_tags_pass_through() {
        let html = "<body><h1>T</h1><ul><li><em>x</em> <a href=\"u\">y</a></li></ul><br/><hr></body>";
        assert_eq!(body(html), "<h1>T</h1><ul><li><em>x</em> <a href=\"u\">y</a></li></ul><br/><hr>");
    }

    #[test]
    fn unknown_tags_are_renamed_and_voids_dropped() {
        let out = body("<body><p><sup>1</sup><kbd>Ctrl</kbd><input type=\"checkbox\"></p><details>d</details></body>");
        assert_eq!(out, "<p><span>1</span><span>Ctrl</span></p><div>d</div>");
    }

    #[test]
    fn text_skips_markup_entities_and_scripts() {
        let lowered =
            lower_document("<body><p>a &amp; b&quot;c</p><script>var hidden = 1;</script></body>");
        let words: Vec<&str> = lowered.text.split_whitespace().collect();
        assert_eq!(words, vec!["a", "b", "c"]);
        assert!(lowered.html.contains("<script>var hidden = 1;</script>"));
    }

    #[test]
    fn stylesheet_goes_into_head() {
        let lowered = lower_document(&render_document("# Hi"));
        let style_at = lowered.html.find(".md-pre").unwrap();
        let head_end = lowered.html.find("</head>").unwrap();
        assert!(style_at < head_end);
        assert!(lowered.html.contains("<h1>Hi</h1>"));
    }

    #[test]
    fn fragment_without_body_is_lowered_whole() {
        let lowered = lower_document("<pre>x</pre>");
        assert!(lowered.html.ends_with("<div class=\"md-pre\">x</div>"));
        assert_eq!(lowered.text.trim(), "x");
    }

    #[test]
    fn stray_angle_bracket_is_text() {
        assert_eq!(body("<body><p>1 < 2</p></body>"), "<p>1 < 2</p>");
    }
}
