//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline OCRs each page. OCR of a dense page can take
//! several seconds, so even a sequential pipeline benefits from feedback.
//!
//! # Example
//!
//! ```rust
//! use ocr2html::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct WordCounter {
//!     words: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for WordCounter {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, word_count: usize) {
//!         self.words.fetch_add(word_count, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} words", page_num, total_pages, word_count);
//!     }
//! }
//!
//! let counter = Arc::new(WordCounter { words: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are reported in ascending order.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after rasterisation, before the first page is read.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is handed to the OCR engine (or text layer).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been read and laid out.
    ///
    /// `word_count` is the number of words recognised on the page.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, word_count: usize) {
        let _ = (page_num, total_pages, word_count);
    }

    /// Called when a page fails. The conversion aborts right after.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page succeeded.
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
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

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        words: AtomicUsize,
        errors: AtomicUsize,
        completed_total: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, word_count: usize) {
            self.words.fetch_add(word_count, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _total_pages: usize, success_count: usize) {
            self.completed_total.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(2);
        cb.on_page_start(1, 2);
        cb.on_page_complete(1, 2, 120);
        cb.on_page_error(2, 2, "tesseract exited with status 1");
        cb.on_conversion_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(1, 2);
        tracker.on_page_complete(1, 2, 40);
        tracker.on_page_start(2, 2);
        tracker.on_page_complete(2, 2, 60);
        tracker.on_conversion_complete(2, 2);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.words.load(Ordering::SeqCst), 100);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.completed_total.load(Ordering::SeqCst), 2);
    }
}
