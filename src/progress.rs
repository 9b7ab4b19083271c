//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn PodcastProgressCallback>`] via
//! [`crate::config::PodcastConfigBuilder::progress_callback`] to receive
//! events as segments are scripted and turns are voiced. The CLI uses this
//! to drive its progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use pdf2pod::{PodcastConfig, PodcastProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     voiced: AtomicUsize,
//! }
//!
//! impl PodcastProgressCallback for CountingCallback {
//!     fn on_turn_complete(&self, turn: usize, total: usize, bytes: usize) {
//!         self.voiced.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("turn {}/{} voiced ({} bytes)", turn + 1, total, bytes);
//!     }
//! }
//!
//! let config = PodcastConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { voiced: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it moves through its stages.
///
/// Turn events may arrive concurrently and out of order (the synthesiser
/// runs a worker pool), so implementations must synchronise shared state.
/// Every method defaults to a no-op.
pub trait PodcastProgressCallback: Send + Sync {
    /// Text extracted and segmented; `segments` prompts will follow.
    fn on_script_start(&self, segments: usize) {
        let _ = segments;
    }

    /// A script block is about to be requested (0-based segment index).
    fn on_segment_start(&self, segment: usize, total: usize) {
        let _ = (segment, total);
    }

    /// A script block was generated and parsed into `turns` turns.
    fn on_segment_complete(&self, segment: usize, total: usize, turns: usize) {
        let _ = (segment, total, turns);
    }

    /// The script is complete; `turns` clips will be synthesised.
    fn on_synthesis_start(&self, turns: usize) {
        let _ = turns;
    }

    /// A clip was synthesised (0-based turn index).
    fn on_turn_complete(&self, turn: usize, total: usize, bytes: usize) {
        let _ = (turn, total, bytes);
    }

    /// A turn failed; the run is about to abort.
    fn on_turn_error(&self, turn: usize, total: usize, error: &str) {
        let _ = (turn, total, error);
    }

    /// The podcast was assembled.
    fn on_conversion_complete(&self, turns: usize, duration_ms: u64) {
        let _ = (turns, duration_ms);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PodcastProgressCallback for NoopProgressCallback {}

/// The type stored in [`crate::config::PodcastConfig`].
pub type ProgressCallback = Arc<dyn PodcastProgressCallback>;
