//! Error types for the edgequake-md2pdf library.
//!
//! The conversion itself has exactly one failure mode:
//! [`Md2PdfError::ConversionFailed`], raised when the PDF renderer reports a
//! failure status. Callers never see the renderer's own status-flag
//! convention; it is folded into this variant by [`crate::convert`].
//!
//! The remaining variants belong to the file-facing helpers
//! ([`crate::convert::convert_to_file`], [`crate::convert::read_markdown`])
//! and to configuration validation. Rendering Markdown to HTML never fails.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Conversion errors ─────────────────────────────────────────────────
    /// The PDF renderer reported a failure status. No bytes are returned.
    #[error("PDF generation failed: {reason}")]
    ConversionFailed { reason: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Markdown input file was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input was read but is not valid UTF-8 text.
    #[error("Input '{path}' is not valid UTF-8 text")]
    InputNotUtf8 { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Md2PdfError {
    /// `true` for the renderer-reported failure, as opposed to I/O or config errors.
    pub fn is_conversion_failure(&self) -> bool {
        matches!(self, Md2PdfError::ConversionFailed { .. })
    }

    /// The bare failure reason, without the variant's prefix.
    ///
    /// Used by [`crate::export::ExportState`] to build the user-facing message.
    pub fn reason(&self) -> String {
        match self {
            Md2PdfError::ConversionFailed { reason } => reason.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_failed_display() {
        let e = Md2PdfError::ConversionFailed {
            reason: "layout error".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("PDF generation failed"), "got: {msg}");
        assert!(msg.contains("layout error"), "got: {msg}");
        assert!(e.is_conversion_failure());
        assert_eq!(e.reason(), "layout error");
    }

    #[test]
    fn input_not_found_display() {
        let e = Md2PdfError::InputNotFound {
            path: PathBuf::from("/nope/notes.md"),
        };
        assert!(e.to_string().contains("/nope/notes.md"));
        assert!(!e.is_conversion_failure());
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = Md2PdfError::OutputWriteFailed {
            path: PathBuf::from("out.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(e.to_string().contains("disk full"));
        assert!(e.source().is_some());
    }

    #[test]
    fn reason_falls_back_to_display() {
        let e = Md2PdfError::InvalidConfig("cache capacity must be ≥ 1".into());
        assert_eq!(e.reason(), e.to_string());
    }
}
