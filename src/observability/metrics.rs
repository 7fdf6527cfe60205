//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters shared by every collection of a database.
///
/// Uses Relaxed ordering; counters are not used for synchronization.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    documents_inserted: AtomicU64,
    inserts_rejected: AtomicU64,
    collections_dropped: AtomicU64,
    cursors_opened: AtomicU64,
    cursors_exhausted: AtomicU64,
    cursors_abandoned: AtomicU64,
    cursors_killed: AtomicU64,
    validations_run: AtomicU64,
    validations_failed: AtomicU64,
    corruptions_detected: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_documents_inserted(&self, count: u64) {
        self.documents_inserted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_inserts_rejected(&self) {
        self.inserts_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_collections_dropped(&self) {
        self.collections_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cursors_opened(&self) {
        self.cursors_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cursors_exhausted(&self) {
        self.cursors_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cursors_abandoned(&self) {
        self.cursors_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_cursors_killed(&self, count: u64) {
        self.cursors_killed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_validations_run(&self) {
        self.validations_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_validations_failed(&self) {
        self.validations_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_corruptions_detected(&self) {
        self.corruptions_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_inserted: self.documents_inserted.load(Ordering::Relaxed),
            inserts_rejected: self.inserts_rejected.load(Ordering::Relaxed),
            collections_dropped: self.collections_dropped.load(Ordering::Relaxed),
            cursors_opened: self.cursors_opened.load(Ordering::Relaxed),
            cursors_exhausted: self.cursors_exhausted.load(Ordering::Relaxed),
            cursors_abandoned: self.cursors_abandoned.load(Ordering::Relaxed),
            cursors_killed: self.cursors_killed.load(Ordering::Relaxed),
            validations_run: self.validations_run.load(Ordering::Relaxed),
            validations_failed: self.validations_failed.load(Ordering::Relaxed),
            corruptions_detected: self.corruptions_detected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the metrics registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub documents_inserted: u64,
    pub inserts_rejected: u64,
    pub collections_dropped: u64,
    pub cursors_opened: u64,
    pub cursors_exhausted: u64,
    pub cursors_abandoned: u64,
    pub cursors_killed: u64,
    pub validations_run: u64,
    pub validations_failed: u64,
    pub corruptions_detected: u64,
}

impl MetricsSnapshot {
    /// Scans that were opened but not yet exhausted, abandoned, or killed
    pub fn cursors_outstanding(&self) -> u64 {
        self.cursors_opened.saturating_sub(
            self.cursors_exhausted + self.cursors_abandoned + self.cursors_killed,
        )
    }
}
