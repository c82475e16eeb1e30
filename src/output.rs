//! Result types returned by detailed conversion.

use crate::convert::PdfBytes;
use serde::{Deserialize, Serialize};

/// A finished conversion plus what it took to produce it.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// The PDF, derived from exactly the Markdown that was passed in.
    pub pdf: PdfBytes,
    pub stats: ConversionStats,
}

/// Size and timing figures for one conversion.
///
/// Stage timings are zero when the result came from the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub markdown_bytes: usize,
    pub html_bytes: usize,
    pub pdf_bytes: usize,
    pub cache_hit: bool,
    /// Non-fatal messages the renderer reported.
    pub warnings: usize,
    pub markdown_duration_ms: u64,
    pub pdf_duration_ms: u64,
    pub total_duration_ms: u64,
}
