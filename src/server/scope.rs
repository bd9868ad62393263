//! Request correlation.
//!
//! # Design Decisions
//! - Correlation ids come from one process-wide atomic counter
//! - Ids wrap at `u64::MAX`; they group log lines, nothing more
//! - The id travels in an explicit `RequestScope` value and in a tracing
//!   span that is exited when the scope drops, on every exit path

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::span::EnteredSpan;

/// Process-wide source of correlation ids.
#[derive(Debug, Default)]
pub struct RequestCounter {
    count: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id, starting from 1.
    pub fn next(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Number of ids handed out so far (modulo wraparound).
    pub fn current(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Correlation context for one request.
///
/// Holds the `request` span entered for as long as the scope lives, so
/// every log line emitted while serving carries `request_id`.
#[derive(Debug)]
pub struct RequestScope {
    id: u64,
    _span: EnteredSpan,
}

impl RequestScope {
    pub fn enter(id: u64) -> Self {
        let span = tracing::info_span!("request", request_id = id);
        Self {
            id,
            _span: span.entered(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}
