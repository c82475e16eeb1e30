//! HTML document → PDF bytes.
//!
//! ## Status, not `Result`
//!
//! The renderer contract mirrors how HTML-to-PDF engines actually behave:
//! bytes are streamed into a caller-supplied sink and a [`RenderStatus`] is
//! returned afterwards. A renderer may have written a partial file before it
//! gives up, so the status flag, not the presence of bytes, decides whether
//! the output is usable. [`crate::convert::Converter`] owns that check and
//! turns a failed status into [`crate::error::Md2PdfError::ConversionFailed`].
//!
//! ## Default backend
//!
//! [`PrintPdfRenderer`] lays the document out with printpdf's HTML engine.
//! Elements that engine cannot place are lowered onto ones it can first, and
//! the finished file is checked for every word of the document body: a page
//! that lost text is a failed render, not a blank success. The trailer `/ID`
//! is derived from the document, so the same HTML always yields the same
//! bytes.
//!
//! Custom renderers (headless browsers, external services, test doubles) plug
//! in through [`crate::config::ConversionConfigBuilder::renderer`].

use super::lowering::lower_document;
use printpdf::{GeneratePdfOptions, PdfDocument, PdfSaveOptions};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Magic bytes every PDF file starts with.
pub const PDF_MAGIC: &[u8; 5] = b"%PDF-";

/// Outcome reported by a [`PdfRenderer`].
///
/// `err == false` means success. Anything written to the sink while `err` is
/// set must be treated as garbage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStatus {
    /// Failure flag.
    pub err: bool,
    /// Human-readable failure reason, set when `err` is true.
    pub reason: Option<String>,
    /// Non-fatal layout messages collected during rendering.
    pub warnings: Vec<String>,
}

impl RenderStatus {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            err: true,
            reason: Some(reason.into()),
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_err(&self) -> bool {
        self.err
    }
}

/// Renders a complete HTML document into PDF bytes.
///
/// Implementations must be `Send + Sync` so one renderer can sit behind an
/// `Arc` in [`crate::config::ConversionConfig`] and be shared by clones.
pub trait PdfRenderer: Send + Sync {
    /// Write the PDF for `html` into `sink` and report how it went.
    fn render(&self, html: &str, sink: &mut dyn Write) -> RenderStatus;

    /// Short identifier used in logs.
    fn name(&self) -> &str {
        "custom"
    }
}

/// The default renderer, backed by printpdf's HTML layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintPdfRenderer;

impl PrintPdfRenderer {
    pub fn new() -> Self {
        Self
    }

    fn render_bytes(&self, html: &str) -> Result<Rendered, String> {
        let lowered = lower_document(html);

        let mut layout_warnings = Vec::new();
        let doc = PdfDocument::from_html(
            &lowered.html,
            &BTreeMap::new(), // images
            &BTreeMap::new(), // fonts
            &GeneratePdfOptions::default(),
            &mut layout_warnings,
        )
        .map_err(|e| e.to_string())?;

        let mut save_warnings = Vec::new();
        let mut bytes = doc.save(&PdfSaveOptions::default(), &mut save_warnings);
        if !stamp_document_id(&mut bytes, html) {
            debug!("No trailer /ID found to stamp; output may differ between runs");
        }

        let mut warnings: Vec<String> = layout_warnings.iter().map(|w| format!("{w:?}")).collect();
        warnings.extend(save_warnings.iter().map(|w| format!("{w:?}")));
        Ok(Rendered {
            bytes,
            warnings,
            body_text: lowered.text,
        })
    }
}

struct Rendered {
    bytes: Vec<u8>,
    warnings: Vec<String>,
    /// Text the pages must show.
    body_text: String,
}

impl PdfRenderer for PrintPdfRenderer {
    fn render(&self, html: &str, sink: &mut dyn Write) -> RenderStatus {
        // The HTML engine is young; a panic inside it is a failed render, not a crash.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.render_bytes(html)));

        let Rendered {
            bytes,
            warnings,
            body_text,
        } = match outcome {
            Ok(Ok(rendered)) => rendered,
            Ok(Err(e)) => return RenderStatus::failed(format!("HTML layout failed: {e}")),
            Err(_) => return RenderStatus::failed("PDF renderer panicked"),
        };

        for w in &warnings {
            debug!("printpdf: {}", w);
        }

        if !bytes.starts_with(PDF_MAGIC) {
            warn!("Renderer produced {} bytes without a PDF header", bytes.len());
            return RenderStatus::failed("renderer output is not a PDF document")
                .with_warnings(warnings);
        }

        if let Some(word) = first_missing_word(&body_text, &bytes) {
            warn!("Laid-out PDF is missing document text, first gap at {:?}", word);
            return RenderStatus::failed(format!(
                "PDF layout dropped document content (missing {word:?})"
            ))
            .with_warnings(warnings);
        }

        if let Err(e) = sink.write_all(&bytes).and_then(|_| sink.flush()) {
            return RenderStatus::failed(format!("could not write PDF output: {e}"))
                .with_warnings(warnings);
        }

        RenderStatus::ok().with_warnings(warnings)
    }

    fn name(&self) -> &str {
        "printpdf"
    }
}

// ── Text check ───────────────────────────────────────────────────────────

fn ascii_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// First ASCII word of `expected` that no page of `pdf` shows.
///
/// A word broken across text items (a long token wrapped mid-word) still
/// counts as present.
fn first_missing_word(expected: &str, pdf: &[u8]) -> Option<String> {
    let page = page_text(pdf);
    let shown: HashSet<&str> = ascii_words(&page).collect();
    let joined: String = page.chars().filter(char::is_ascii_alphanumeric).collect();

    ascii_words(expected)
        .find(|w| !shown.contains(w) && !joined.contains(w))
        .map(str::to_string)
}

/// Text drawn by the content streams of an uncompressed PDF.
///
/// Reads the string operands of text operators, literal and hex, decoding
/// bytes as WinAnsi/Latin-1. Strings are separated by a space. This is enough
/// for files produced by [`PrintPdfRenderer`] with the standard fonts; it is
/// not a general PDF text extractor.
pub fn page_text(pdf: &[u8]) -> String {
    let mut text = String::new();
    let mut rest = pdf;
    while let Some(at) = find_bytes(rest, b"stream") {
        let after = &rest[at + b"stream".len()..];
        let body = if let Some(b) = after.strip_prefix(b"\r\n") {
            b
        } else if let Some(b) = after.strip_prefix(b"\n") {
            b
        } else {
            rest = after;
            continue;
        };
        let end = find_bytes(body, b"endstream").unwrap_or(body.len());
        push_strings(&body[..end], &mut text);
        rest = &body[(end + b"endstream".len()).min(body.len())..];
    }
    text
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn push_strings(content: &[u8], out: &mut String) {
    let mut i = 0;
    while i < content.len() {
        match content[i] {
            b'(' => {
                i = push_literal(content, i + 1, out);
                out.push(' ');
            }
            b'<' if content.get(i + 1) == Some(&b'<') => i += 2,
            b'<' => {
                i = push_hex(content, i + 1, out);
                out.push(' ');
            }
            _ => i += 1,
        }
    }
}

/// Decode a literal string starting after its `(`; returns the index past `)`.
fn push_literal(content: &[u8], mut i: usize, out: &mut String) -> usize {
    let mut depth = 1;
    while i < content.len() {
        let b = content[i];
        i += 1;
        match b {
            b'\\' => {
                let Some(&next) = content.get(i) else { break };
                i += 1;
                match next {
                    b'n' => out.push('\n'),
                    b'r' => out.push('\r'),
                    b't' => out.push('\t'),
                    b'0'..=b'7' => {
                        let mut code = u32::from(next - b'0');
                        for _ in 0..2 {
                            match content.get(i) {
                                Some(&d @ b'0'..=b'7') => {
                                    code = code * 8 + u32::from(d - b'0');
                                    i += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push(char::from((code & 0xFF) as u8));
                    }
                    b'\r' | b'\n' => {}
                    other => out.push(char::from(other)),
                }
            }
            b'(' => {
                depth += 1;
                out.push('(');
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                out.push(')');
            }
            other => out.push(char::from(other)),
        }
    }
    i
}

/// Decode a hex string starting after its `<`; returns the index past `>`.
fn push_hex(content: &[u8], mut i: usize, out: &mut String) -> usize {
    let mut high: Option<u8> = None;
    while i < content.len() {
        let b = content[i];
        i += 1;
        let nibble = match b {
            b'>' => break,
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => continue,
        };
        match high.take() {
            Some(h) => out.push(char::from(h << 4 | nibble)),
            None => high = Some(nibble),
        }
    }
    if let Some(h) = high {
        out.push(char::from(h << 4));
    }
    i
}

// ── Deterministic /ID ────────────────────────────────────────────────────

/// 32 printable bytes derived from `html`.
fn document_id(html: &str) -> [u8; 32] {
    let mut id = [0u8; 32];
    for (half, chunk) in id.chunks_mut(16).enumerate() {
        let mut hasher = DefaultHasher::new();
        half.hash(&mut hasher);
        html.hash(&mut hasher);
        chunk.copy_from_slice(format!("{:016X}", hasher.finish()).as_bytes());
    }
    id
}

/// Overwrite the two 32-byte trailer `/ID` strings in place.
///
/// The replacement has the same length, so xref offsets stay valid.
/// Returns false when the trailer does not have the expected shape.
fn stamp_document_id(pdf: &mut [u8], html: &str) -> bool {
    let Some(at) = pdf.windows(3).rposition(|w| w == b"/ID") else {
        return false;
    };

    let mut i = skip_ws(pdf, at + 3);
    if pdf.get(i) != Some(&b'[') {
        return false;
    }
    let mut ranges = Vec::with_capacity(2);
    for _ in 0..2 {
        i = skip_ws(pdf, i + 1);
        if pdf.get(i) != Some(&b'(') {
            return false;
        }
        let (start, end) = (i + 1, i + 33);
        let well_formed = pdf.get(end) == Some(&b')')
            && pdf[start..end].iter().all(u8::is_ascii_alphanumeric);
        if !well_formed {
            return false;
        }
        ranges.push(start..end);
        i = end;
    }

    let id = document_id(html);
    for range in ranges {
        pdf[range].copy_from_slice(&id);
    }
    true
}

fn skip_ws(pdf: &[u8], mut i: usize) -> usize {
    while pdf.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    i
}
