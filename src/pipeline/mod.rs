//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap the PDF backend without touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//! markdown ──▶ template ──▶ pdf
//! (fragment)   (document)   (bytes + status)
//! ```
//!
//! 1. [`markdown`] — render Markdown to an HTML fragment with the fixed
//!    extension set; also the whole of the live-preview path
//! 2. [`template`] — wrap the fragment in the styled HTML document
//! 3. [`pdf`]      — hand the document to a [`pdf::PdfRenderer`]; the only
//!    stage that can fail
//!
//! The default renderer runs the document through `lowering` first, which
//! maps elements printpdf cannot lay out onto ones it can.

mod lowering;
pub mod markdown;
pub mod pdf;
pub mod template;

/// Markdown → full styled HTML document (stages 1 and 2).
pub fn render_document(markdown_text: &str) -> String {
    template::wrap_document(&markdown::render_fragment(markdown_text))
}
