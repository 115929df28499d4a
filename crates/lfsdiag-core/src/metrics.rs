//! Atomic counters for dispatch activity.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. after command dispatch).

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free atomic counters.
#[derive(Debug)]
pub struct Metrics {
    lines_printed: AtomicU64,
    error_lines: AtomicU64,
    logs_written: AtomicU64,
    log_fallbacks: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            lines_printed: AtomicU64::new(0),
            error_lines: AtomicU64::new(0),
            logs_written: AtomicU64::new(0),
            log_fallbacks: AtomicU64::new(0),
        }
    }

    pub fn inc_lines_printed(&self) {
        self.lines_printed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "lines_printed", "counter incremented");
    }

    pub fn inc_error_lines(&self) {
        self.error_lines.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "error_lines", "counter incremented");
    }

    /// A panic log reached a file.
    pub fn inc_logs_written(&self) {
        self.logs_written.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "logs_written", "counter incremented");
    }

    /// A panic log was diverted to the real error stream.
    pub fn inc_log_fallbacks(&self) {
        self.log_fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "log_fallbacks", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            lines_printed = self.lines_printed(),
            error_lines = self.error_lines(),
            logs_written = self.logs_written(),
            log_fallbacks = self.log_fallbacks(),
        );
    }

    pub fn lines_printed(&self) -> u64 {
        self.lines_printed.load(Ordering::Relaxed)
    }

    pub fn error_lines(&self) -> u64 {
        self.error_lines.load(Ordering::Relaxed)
    }

    pub fn logs_written(&self) -> u64 {
        self.logs_written.load(Ordering::Relaxed)
    }

    pub fn log_fallbacks(&self) -> u64 {
        self.log_fallbacks.load(Ordering::Relaxed)
    }
}
