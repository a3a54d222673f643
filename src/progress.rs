//! Progress-callback trait for per-document batch events.
//!
//! Hand an [`Arc<dyn ConversionProgressCallback>`] to
//! [`crate::batch::BatchOrchestrator::with_progress`] to receive events as
//! the orchestrator works through its list of document IDs.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a log, or a terminal progress bar without the
//! library knowing how the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use gdocs2blog::ConversionProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, index: usize, total: usize, doc_id: &str, _path: &str) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {} done", index, total, doc_id);
//!     }
//! }
//! ```

use std::sync::Arc;

/// Called by the batch orchestrator as it processes each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first document.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a document is fetched.
    fn on_document_start(&self, index: usize, total: usize, doc_id: &str) {
        let _ = (index, total, doc_id);
    }

    /// Called when a post has been written.
    ///
    /// # Arguments
    /// * `output_path` — path of the written `.md` file
    fn on_document_complete(&self, index: usize, total: usize, doc_id: &str, output_path: &str) {
        let _ = (index, total, doc_id, output_path);
    }

    /// Called when a document fails; it stays pending in tracked mode.
    fn on_document_error(&self, index: usize, total: usize, doc_id: &str, error: &str) {
        let _ = (index, total, doc_id, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
