//! Progress-callback trait for conversion stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to observe
//! each conversion as it moves through the pipeline stages.
//!
//! Small documents convert in milliseconds, but a long manual with big tables
//! can keep the PDF layout busy for seconds; a front-end uses these events to
//! drive a spinner or status line. The library itself never decides *when*
//! to convert; the host owns scheduling (on every edit, debounced, or on
//! submit) and simply calls [`crate::convert::Converter::convert`].
//!
//! # Example
//!
//! ```rust
//! use edgequake_md2pdf::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     hits: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_cache_hit(&self, pdf_len: usize) {
//!         self.hits.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("served {pdf_len} bytes from cache");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     hits: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Markdown → HTML fragment.
    Markdown,
    /// Fragment → styled HTML document.
    Template,
    /// HTML document → PDF bytes.
    Pdf,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Markdown => "Rendering Markdown",
            Stage::Template => "Applying stylesheet",
            Stage::Pdf => "Laying out PDF",
        };
        f.write_str(label)
    }
}

/// Called by the conversion pipeline as it runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once per conversion, before the cache is consulted.
    ///
    /// # Arguments
    /// * `markdown_len` — byte length of the Markdown input
    fn on_conversion_start(&self, markdown_len: usize) {
        let _ = markdown_len;
    }

    /// Called when a cached PDF is returned; no stage runs afterwards.
    fn on_cache_hit(&self, pdf_len: usize) {
        let _ = pdf_len;
    }

    /// Called just before a stage runs.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a fresh PDF has been produced.
    ///
    /// # Arguments
    /// * `pdf_len` — byte length of the PDF
    fn on_conversion_complete(&self, pdf_len: usize) {
        let _ = pdf_len;
    }

    /// Called when the renderer reported a failure.
    fn on_conversion_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        stages: Mutex<Vec<Stage>>,
        hits: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_cache_hit(&self, _pdf_len: usize) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_start(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_conversion_complete(&self, _pdf_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_stage_start(Stage::Markdown);
        cb.on_cache_hit(10);
        cb.on_conversion_complete(42);
        cb.on_conversion_error("some error");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_stage_start(Stage::Markdown);
        tracker.on_stage_start(Stage::Template);
        tracker.on_stage_start(Stage::Pdf);
        tracker.on_conversion_complete(1024);
        tracker.on_cache_hit(1024);
        tracker.on_conversion_error("renderer failed");

        assert_eq!(
            *tracker.stages.lock().unwrap(),
            vec![Stage::Markdown, Stage::Template, Stage::Pdf]
        );
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.hits.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stage_display_and_serde() {
        assert_eq!(Stage::Pdf.to_string(), "Laying out PDF");
        let json = serde_json::to_string(&Stage::Template).unwrap();
        assert_eq!(json, "\"template\"");
    }
}
