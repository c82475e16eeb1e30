//! Conversion entry points.
//!
//! [`Converter`] is the pipeline: Markdown text in, PDF bytes out. It owns
//! its renderer and its cache, so two converters never share state unless
//! the caller hands them the same [`crate::cache::ConversionCache`].
//!
//! The call is synchronous and blocking. A host that re-exports on every edit
//! just calls it again with the new text; since only one call is ever in
//! flight, the latest input always wins. The async helpers at the bottom move
//! the blocking work onto tokio's blocking pool for hosts that already run
//! an executor.

use crate::cache::ConversionCache;
use crate::config::ConversionConfig;
use crate::error::Md2PdfError;
use crate::export::{resolve_output_path, write_atomic};
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::pdf::PdfRenderer;
use crate::pipeline::{markdown, template};
use crate::progress::{ProgressCallback, Stage};
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// An immutable PDF file held in memory.
///
/// Cloning is cheap (reference-counted), which lets the cache hand out the
/// same bytes to every caller.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PdfBytes(Arc<[u8]>);

impl PdfBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl From<Vec<u8>> for PdfBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Arc::from(bytes))
    }
}

impl Deref for PdfBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for PdfBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PdfBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PdfBytes({} bytes)", self.0.len())
    }
}

/// The Markdown-to-PDF pipeline.
///
/// # Example
/// ```rust,no_run
/// use edgequake_md2pdf::{ConversionConfig, Converter};
///
/// let converter = Converter::new(&ConversionConfig::default());
/// let pdf = converter.convert("# Hello")?;
/// std::fs::write("hello.pdf", &*pdf)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Converter {
    renderer: Arc<dyn PdfRenderer>,
    cache: Option<Arc<dyn ConversionCache>>,
    progress: Option<ProgressCallback>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(&ConversionConfig::default())
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("renderer", &self.renderer.name())
            .field("cached_entries", &self.cached_entries())
            .finish()
    }
}

impl Converter {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            renderer: config.resolve_renderer(),
            cache: config.resolve_cache(),
            progress: config.progress_callback.clone(),
        }
    }

    /// Convert Markdown to PDF bytes.
    ///
    /// # Errors
    /// [`Md2PdfError::ConversionFailed`] when the renderer reports a failure
    /// status. Whatever it wrote before failing is discarded.
    pub fn convert(&self, markdown_text: &str) -> Result<PdfBytes, Md2PdfError> {
        self.convert_detailed(markdown_text).map(|out| out.pdf)
    }

    /// Like [`Converter::convert`], with size and timing figures.
    pub fn convert_detailed(&self, markdown_text: &str) -> Result<ConversionOutput, Md2PdfError> {
        let total_start = Instant::now();
        if let Some(ref cb) = self.progress {
            cb.on_conversion_start(markdown_text.len());
        }

        // ── Step 1: Cache lookup ─────────────────────────────────────────────
        if let Some(pdf) = self.cache.as_ref().and_then(|c| c.get(markdown_text)) {
            debug!("Cache hit: {} bytes of Markdown → {} bytes of PDF", markdown_text.len(), pdf.len());
            if let Some(ref cb) = self.progress {
                cb.on_cache_hit(pdf.len());
            }
            let stats = ConversionStats {
                markdown_bytes: markdown_text.len(),
                pdf_bytes: pdf.len(),
                cache_hit: true,
                total_duration_ms: total_start.elapsed().as_millis() as u64,
                ..ConversionStats::default()
            };
            return Ok(ConversionOutput { pdf, stats });
        }

        // ── Step 2: Markdown → fragment → document ───────────────────────────
        let md_start = Instant::now();
        self.stage(Stage::Markdown);
        let fragment = markdown::render_fragment(markdown_text);
        self.stage(Stage::Template);
        let document = template::wrap_document(&fragment);
        let markdown_duration_ms = md_start.elapsed().as_millis() as u64;

        // ── Step 3: Document → PDF ───────────────────────────────────────────
        let pdf_start = Instant::now();
        self.stage(Stage::Pdf);
        let mut buf = Vec::new();
        let status = self.renderer.render(&document, &mut buf);
        let pdf_duration_ms = pdf_start.elapsed().as_millis() as u64;

        if status.is_err() {
            let reason = status
                .reason
                .unwrap_or_else(|| format!("renderer '{}' reported an error", self.renderer.name()));
            warn!(
                "PDF rendering failed after {}ms ({} partial bytes discarded): {}",
                pdf_duration_ms,
                buf.len(),
                reason
            );
            if let Some(ref cb) = self.progress {
                cb.on_conversion_error(&reason);
            }
            return Err(Md2PdfError::ConversionFailed { reason });
        }

        let pdf = PdfBytes::from(buf);
        if let Some(ref cache) = self.cache {
            cache.insert(markdown_text, pdf.clone());
        }

        let stats = ConversionStats {
            markdown_bytes: markdown_text.len(),
            html_bytes: document.len(),
            pdf_bytes: pdf.len(),
            cache_hit: false,
            warnings: status.warnings.len(),
            markdown_duration_ms,
            pdf_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Converted {} bytes of Markdown → {} bytes of PDF in {}ms ({})",
            stats.markdown_bytes,
            stats.pdf_bytes,
            stats.total_duration_ms,
            self.renderer.name()
        );

        if let Some(ref cb) = self.progress {
            cb.on_conversion_complete(pdf.len());
        }

        Ok(ConversionOutput { pdf, stats })
    }

    /// The live-preview HTML: the Markdown renderer alone, no PDF involved.
    pub fn preview_html(&self, markdown_text: &str) -> String {
        markdown::render_fragment(markdown_text)
    }

    /// Drop every memoized conversion.
    pub fn clear_cache(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    /// Number of memoized conversions (0 when caching is disabled).
    pub fn cached_entries(&self) -> usize {
        self.cache.as_ref().map(|c| c.len()).unwrap_or(0)
    }

    /// Run [`Converter::convert_detailed`] on tokio's blocking pool.
    pub async fn convert_async(&self, markdown_text: String) -> Result<ConversionOutput, Md2PdfError> {
        let converter = self.clone();
        tokio::task::spawn_blocking(move || converter.convert_detailed(&markdown_text))
            .await
            .map_err(|e| Md2PdfError::Internal(format!("Conversion task panicked: {}", e)))?
    }

    /// Convert and write the PDF to `output_path`.
    ///
    /// The file-name component is normalized (trimmed, `.pdf` appended); a
    /// directory gets the date-based default name. Uses atomic write (temp
    /// file + rename) so a failed conversion never leaves a partial file.
    ///
    /// Returns the path actually written and the conversion stats.
    pub async fn export_to_file(
        &self,
        markdown_text: String,
        output_path: impl AsRef<Path>,
    ) -> Result<(PathBuf, ConversionStats), Md2PdfError> {
        let output = self.convert_async(markdown_text).await?;
        let path = resolve_output_path(output_path.as_ref());
        write_atomic(&path, output.pdf.as_bytes()).await?;
        info!("Wrote {}", path.display());
        Ok((path, output.stats))
    }

    fn stage(&self, stage: Stage) {
        debug!("{}", stage);
        if let Some(ref cb) = self.progress {
            cb.on_stage_start(stage);
        }
    }
}

/// Convert Markdown to PDF bytes with a one-off [`Converter`].
///
/// Repeated calls do not share a cache; keep a [`Converter`] around for that.
pub fn convert(markdown_text: &str, config: &ConversionConfig) -> Result<PdfBytes, Md2PdfError> {
    Converter::new(config).convert(markdown_text)
}

/// Markdown → HTML fragment for a live preview.
pub fn preview_html(markdown_text: &str) -> String {
    markdown::render_fragment(markdown_text)
}

/// Convert Markdown and write the PDF to a file.
///
/// See [`Converter::export_to_file`] for path handling.
pub async fn convert_to_file(
    markdown_text: impl Into<String>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<(PathBuf, ConversionStats), Md2PdfError> {
    Converter::new(config)
        .export_to_file(markdown_text.into(), output_path)
        .await
}

/// Read a Markdown file, mapping I/O failures to library errors.
pub fn read_markdown(path: impl AsRef<Path>) -> Result<String, Md2PdfError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Md2PdfError::InputNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Md2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Md2PdfError::Internal(format!("reading {}: {e}", path.display())),
    })?;
    String::from_utf8(bytes).map_err(|_| Md2PdfError::InputNotUtf8 {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pdf::RenderStatus;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes a fake PDF embedding the document length; counts calls.
    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    impl PdfRenderer for CountingRenderer {
        fn render(&self, html: &str, sink: &mut dyn Write) -> RenderStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            write!(sink, "%PDF-1.7 {}", html.len()).ok();
            RenderStatus::ok()
        }
    }

    struct FailingRenderer;

    impl PdfRenderer for FailingRenderer {
        fn render(&self, _html: &str, sink: &mut dyn Write) -> RenderStatus {
            sink.write_all(b"%PDF-1.7 half a fi").ok();
            RenderStatus::failed("table too wide")
        }
    }

    fn converter_with(renderer: Arc<dyn PdfRenderer>) -> Converter {
        Converter::new(&ConversionConfig::builder().renderer(renderer).build().unwrap())
    }

    #[test]
    fn repeated_input_is_served_from_cache() {
        let renderer = Arc::new(CountingRenderer::default());
        let conv = converter_with(renderer.clone());

        let first = conv.convert("# Hello").unwrap();
        let second = conv.convert("# Hello").unwrap();
        assert_eq!(first, second);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(conv.cached_entries(), 1);
    }

    #[test]
    fn detailed_reports_cache_hit() {
        let conv = converter_with(Arc::new(CountingRenderer::default()));
        let miss = conv.convert_detailed("text").unwrap();
        let hit = conv.convert_detailed("text").unwrap();
        assert!(!miss.stats.cache_hit);
        assert!(miss.stats.html_bytes > 0);
        assert!(hit.stats.cache_hit);
        assert_eq!(hit.stats.pdf_bytes, miss.stats.pdf_bytes);
    }

    #[test]
    fn failure_status_becomes_conversion_failed() {
        let conv = converter_with(Arc::new(FailingRenderer));
        let err = conv.convert("# Hello").unwrap_err();
        match err {
            Md2PdfError::ConversionFailed { reason } => assert_eq!(reason, "table too wide"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(conv.cached_entries(), 0, "failures must not be cached");
    }

    #[test]
    fn failure_without_reason_names_renderer() {
        struct Silent;
        impl PdfRenderer for Silent {
            fn render(&self, _html: &str, _sink: &mut dyn Write) -> RenderStatus {
                RenderStatus {
                    err: true,
                    ..RenderStatus::default()
                }
            }
            fn name(&self) -> &str {
                "silent"
            }
        }
        let err = converter_with(Arc::new(Silent)).convert("x").unwrap_err();
        assert!(err.reason().contains("silent"), "got: {err}");
    }

    #[test]
    fn disabled_cache_renders_every_time() {
        let renderer = Arc::new(CountingRenderer::default());
        let config = ConversionConfig::builder()
            .renderer(renderer.clone())
            .cache_enabled(false)
            .build()
            .unwrap();
        let conv = Converter::new(&config);
        conv.convert("same").unwrap();
        conv.convert("same").unwrap();
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(conv.cached_entries(), 0);
    }

    #[test]
    fn clear_cache_forces_rerender() {
        let renderer = Arc::new(CountingRenderer::default());
        let conv = converter_with(renderer.clone());
        conv.convert("a").unwrap();
        conv.clear_cache();
        conv.convert("a").unwrap();
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn output_tracks_latest_input() {
        let conv = converter_with(Arc::new(CountingRenderer::default()));
        let short = conv.convert("a").unwrap();
        let long = conv.convert("a much longer paragraph of text").unwrap();
        assert_ne!(short, long);
        assert_eq!(conv.convert("a").unwrap(), short);
    }

    #[test]
    fn preview_is_fragment_only() {
        let html = Converter::default().preview_html("# Hello");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(!html.contains("<body>"));
    }

    #[test]
    fn pdf_bytes_debug_shows_length() {
        let pdf = PdfBytes::from(b"%PDF-1.7".to_vec());
        assert_eq!(format!("{pdf:?}"), "PdfBytes(8 bytes)");
        assert_eq!(pdf.len(), 8);
        assert!(!pdf.is_empty());
        assert_eq!(&pdf[..4], b"%PDF");
    }

    #[test]
    fn read_markdown_missing_file() {
        let err = read_markdown("/definitely/not/here.md").unwrap_err();
        assert!(matches!(err, Md2PdfError::InputNotFound { .. }));
    }

    #[test]
    fn read_markdown_rejects_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = read_markdown(&path).unwrap_err();
        assert!(matches!(err, Md2PdfError::InputNotUtf8 { .. }));
    }

    #[tokio::test]
    async fn export_writes_normalized_file() {
        let dir = tempfile::tempdir().unwrap();
        let conv = converter_with(Arc::new(CountingRenderer::default()));
        let (path, stats) = conv
            .export_to_file("# Hi".to_string(), dir.path().join("  my report  "))
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("my report.pdf"));
        assert_eq!(std::fs::read(&path).unwrap().len(), stats.pdf_bytes);
        assert!(!dir.path().join("my report.pdf.tmp").exists());
    }

    #[tokio::test]
    async fn failed_export_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let conv = converter_with(Arc::new(FailingRenderer));
        let target = dir.path().join("out.pdf");
        let err = conv.export_to_file("# Hi".to_string(), &target).await.unwrap_err();
        assert!(err.is_conversion_failure());
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
