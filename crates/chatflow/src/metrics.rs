//! Playback and resume metrics.
//!
//! A manager owns one [`DialogMetrics`] shared by every dialog it registers.

use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1.
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment by n.
    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Get current value.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Reset to zero.
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Counters for dialog activity.
#[derive(Debug, Default)]
pub struct DialogMetrics {
    /// Playbacks started.
    pub playbacks_started: Counter,
    /// Playbacks that ran to completion.
    pub playbacks_completed: Counter,
    /// Playbacks aborted by a hook or transport error.
    pub playbacks_failed: Counter,
    /// Message payloads delivered.
    pub messages_sent: Counter,
    /// Replies dispatched to an open dialog.
    pub resumes: Counter,
    /// Replies whose response handler failed.
    pub resume_failures: Counter,
}

impl DialogMetrics {
    /// Create new dialog metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            playbacks_started: self.playbacks_started.get(),
            playbacks_completed: self.playbacks_completed.get(),
            playbacks_failed: self.playbacks_failed.get(),
            messages_sent: self.messages_sent.get(),
            resumes: self.resumes.get(),
            resume_failures: self.resume_failures.get(),
        }
    }
}

/// Snapshot of metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Playbacks started.
    pub playbacks_started: u64,
    /// Playbacks that ran to completion.
    pub playbacks_completed: u64,
    /// Playbacks aborted by an error.
    pub playbacks_failed: u64,
    /// Message payloads delivered.
    pub messages_sent: u64,
    /// Replies dispatched to an open dialog.
    pub resumes: u64,
    /// Replies whose response handler failed.
    pub resume_failures: u64,
}
