//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The Markdown extension set and the
//! stylesheet are fixed; what *is* configurable are the collaborators the
//! pipeline talks to: the PDF renderer, the memoization cache, and an
//! optional progress callback.

use crate::cache::{ConversionCache, MemoryCache};
use crate::error::Md2PdfError;
use crate::pipeline::pdf::{PdfRenderer, PrintPdfRenderer};
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .cache_capacity(64)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Memoize results by exact Markdown text. Default: true.
    pub cache_enabled: bool,

    /// Maximum number of cached conversions. `None` keeps every entry for
    /// the converter's lifetime. Default: None.
    ///
    /// Ignored when [`ConversionConfig::cache`] is set.
    pub cache_capacity: Option<usize>,

    /// Pre-constructed cache. Takes precedence over `cache_capacity`.
    pub cache: Option<Arc<dyn ConversionCache>>,

    /// Pre-constructed PDF renderer. If None, uses [`PrintPdfRenderer`].
    pub renderer: Option<Arc<dyn PdfRenderer>>,

    /// Optional stage-event callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_capacity: None,
            cache: None,
            renderer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("cache_enabled", &self.cache_enabled)
            .field("cache_capacity", &self.cache_capacity)
            .field("cache", &self.cache.as_ref().map(|_| "<dyn ConversionCache>"))
            .field("renderer", &self.renderer.as_ref().map(|r| r.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The renderer to use: the injected one, else printpdf.
    pub(crate) fn resolve_renderer(&self) -> Arc<dyn PdfRenderer> {
        match self.renderer {
            Some(ref r) => Arc::clone(r),
            None => Arc::new(PrintPdfRenderer::new()),
        }
    }

    /// The cache to use, or `None` when caching is switched off.
    pub(crate) fn resolve_cache(&self) -> Option<Arc<dyn ConversionCache>> {
        if !self.cache_enabled {
            return None;
        }
        if let Some(ref cache) = self.cache {
            return Some(Arc::clone(cache));
        }
        let cache = match self.cache_capacity {
            Some(n) => MemoryCache::with_capacity(n),
            None => MemoryCache::unbounded(),
        };
        Some(Arc::new(cache))
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn cache_enabled(mut self, v: bool) -> Self {
        self.config.cache_enabled = v;
        self
    }

    pub fn cache_capacity(mut self, n: usize) -> Self {
        self.config.cache_capacity = Some(n);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn ConversionCache>) -> Self {
        self.config.cache = Some(cache);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if c.cache_capacity == Some(0) {
            return Err(Md2PdfError::InvalidConfig(
                "Cache capacity must be ≥ 1 (disable the cache instead)".into(),
            ));
        }
        if !c.cache_enabled && c.cache.is_some() {
            return Err(Md2PdfError::InvalidConfig(
                "A cache was supplied but caching is disabled".into(),
            ));
        }
        Ok(self.config)
    }
}
