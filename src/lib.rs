//! # edgequake-md2pdf
//!
//! Convert Markdown to a clean, styled PDF, with a live HTML preview of the
//! same text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Markdown  pulldown-cmark → HTML fragment (fenced code, tables, strict lists)
//!  ├─ 2. Template  fragment → complete UTF-8 document with the fixed stylesheet
//!  ├─ 3. PDF       printpdf HTML layout → PDF bytes + status
//!  └─ 4. Export    status checked, result memoized, file named `*.pdf`
//!
//! Markdown ─▶ 1. Markdown ─▶ preview   (independent of PDF generation)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{ConversionConfig, Converter, ExportState, default_file_name_today};
//!
//! let converter = Converter::new(&ConversionConfig::default());
//! let text = "# Hello\n\nSome *Markdown*.";
//!
//! let preview = converter.preview_html(text);
//! let state = ExportState::from_result(converter.convert(text), "notes", &default_file_name_today());
//! match state.download() {
//!     Some(dl) => std::fs::write(&dl.file_name, &*dl.data)?,
//!     None => eprintln!("{}", state.error_message().unwrap_or_default()),
//! }
//! # let _ = preview;
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod filename;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{ConversionCache, MemoryCache};
pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_to_file, preview_html, read_markdown, Converter, PdfBytes};
pub use error::Md2PdfError;
pub use export::{resolve_output_path, save_download, Download, ExportState, PDF_MIME};
pub use filename::{default_file_name, default_file_name_today, normalize_file_name};
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::markdown::{render_fragment, MarkdownExtensions, SAMPLE_MARKDOWN};
pub use pipeline::pdf::{PdfRenderer, PrintPdfRenderer, RenderStatus};
pub use pipeline::render_document;
pub use pipeline::template::{wrap_document, STYLESHEET};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
