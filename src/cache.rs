//! Memoization of finished conversions.
//!
//! Conversion is a pure function of the Markdown text, so a result can be
//! reused whenever the exact same text comes back, the common case when an
//! editor re-exports on every change and the user only touched the file name.
//!
//! The cache is a component owned by a [`crate::convert::Converter`], not a
//! process global: tests get a fresh one per converter, and callers pick the
//! policy (unbounded, bounded, or their own implementation).
//!
//! Keys are the exact input string. No trimming, no line-ending
//! normalisation: `"# a"` and `"# a\n"` are different entries.

use crate::convert::PdfBytes;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::debug;

/// Storage for finished conversions, keyed by exact Markdown text.
///
/// Methods take `&self`; implementations provide their own interior
/// mutability. The pipeline calls them from one logical caller at a time.
pub trait ConversionCache: Send + Sync {
    fn get(&self, markdown: &str) -> Option<PdfBytes>;

    fn insert(&self, markdown: &str, pdf: PdfBytes);

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<String, PdfBytes>,
    order: VecDeque<String>,
}

/// In-memory cache with an optional entry limit.
///
/// When the limit is reached the oldest inserted entry is evicted first.
#[derive(Debug, Default)]
pub struct MemoryCache {
    capacity: Option<usize>,
    entries: Mutex<Entries>,
}

impl MemoryCache {
    /// Entries live for as long as the cache does.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        // A poisoned lock only means a panic elsewhere mid-insert; the map is still usable.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl ConversionCache for MemoryCache {
    fn get(&self, markdown: &str) -> Option<PdfBytes> {
        self.lock().map.get(markdown).cloned()
    }

    fn insert(&self, markdown: &str, pdf: PdfBytes) {
        let mut entries = self.lock();
        if entries.map.insert(markdown.to_string(), pdf).is_some() {
            return;
        }
        entries.order.push_back(markdown.to_string());

        if let Some(cap) = self.capacity {
            while entries.map.len() > cap {
                let Some(oldest) = entries.order.pop_front() else {
                    break;
                };
                entries.map.remove(&oldest);
                debug!("Evicted cached conversion ({} bytes of Markdown)", oldest.len());
            }
        }
    }

    fn clear(&self) {
        let mut entries = self.lock();
        entries.map.clear();
        entries.order.clear();
    }

    fn len(&self) -> usize {
        self.lock().map.len()
    }
}
