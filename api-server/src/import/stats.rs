//! Import statistics tracking.
//!
//! [`StatsAccumulator`] is shared by every reconciliation task of a run and only
//! exposes atomic increments. [`ImportStats`] is the immutable snapshot handed
//! back to callers.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Snapshot of the counters for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    /// Records found in the input dataset.
    pub total: usize,
    /// Records inserted or updated.
    pub imported: usize,
    /// Records left untouched (existing key, or duplicates in a dry run).
    pub skipped: usize,
    /// Records that failed (missing key or store failure).
    pub errors: usize,
    /// Duplicate signals found by dry-run analysis.
    pub duplicates: usize,
    /// Wall-clock milliseconds from start to completion.
    pub processing_time: u64,
}

impl ImportStats {
    /// Records that reached a terminal outcome.
    pub fn accounted(&self) -> usize {
        self.imported + self.skipped + self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Thread-safe counters mutated concurrently during a run.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    total: AtomicUsize,
    imported: AtomicUsize,
    skipped: AtomicUsize,
    errors: AtomicUsize,
    duplicates: AtomicUsize,
    processing_time_ms: AtomicU64,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn record_imported(&self) {
        self.imported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    /// Dry runs report every duplicate signal as a would-be skip.
    pub fn skip_duplicates(&self) {
        let duplicates = self.duplicates.load(Ordering::Relaxed);
        self.skipped.store(duplicates, Ordering::Relaxed);
    }

    pub fn set_processing_time(&self, elapsed: Duration) {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.processing_time_ms.store(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ImportStats {
        ImportStats {
            total: self.total.load(Ordering::Relaxed),
            imported: self.imported.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            processing_time: self.processing_time_ms.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.imported.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.duplicates.store(0, Ordering::Relaxed);
        self.processing_time_ms.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn snapshot_reflects_increments_and_reset_zeroes() {
        let stats = StatsAccumulator::new();
        stats.set_total(4);
        stats.record_imported();
        stats.record_imported();
        stats.record_skipped();
        stats.record_error();
        stats.set_processing_time(Duration::from_millis(42));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.imported, 2);
        assert_eq!(snapshot.accounted(), 4);
        assert_eq!(snapshot.processing_time, 42);
        assert!(snapshot.has_errors());

        stats.reset();
        assert_eq!(stats.snapshot(), ImportStats::default());
    }

    #[test]
    fn snapshot_is_a_copy() {
        let stats = StatsAccumulator::new();
        stats.record_duplicate();
        let before = stats.snapshot();
        stats.record_duplicate();
        assert_eq!(before.duplicates, 1);
        assert_eq!(stats.snapshot().duplicates, 2);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let stats = Arc::new(StatsAccumulator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        stats.record_imported();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker thread");
        }

        assert_eq!(stats.snapshot().imported, 8_000);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(ImportStats {
            processing_time: 5,
            ..Default::default()
        })
        .expect("stats serialize");
        assert_eq!(json["processingTime"], 5);
        assert_eq!(json["duplicates"], 0);
    }
}
