//! Import coordination for EasyPay client datasets.
//!
//! The [`ClientImporter`] drives a run through its phases:
//! 1. Load the JSON dataset from the configured source
//! 2. Either analyze it for duplicates (dry run) or split it into batches
//! 3. Reconcile every record of a batch concurrently, then move to the next batch
//! 4. Stamp the processing time and return a stats snapshot

use crate::import::analyzer;
use crate::import::batcher::into_batches;
use crate::import::error::{ImportError, ImportResult};
use crate::import::options::{ImportConfig, ImportOptions};
use crate::import::reconciler::reconcile;
use crate::import::record::ImportRecord;
use crate::import::source;
use crate::import::stats::{ImportStats, StatsAccumulator};
use crate::import::store::RecordStore;
use parking_lot::Mutex;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Lifecycle of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportPhase {
    Idle,
    Loading,
    Analyzing,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// Progress report for the current or last run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatus {
    pub phase: ImportPhase,
    pub batches_completed: usize,
    pub batches_total: usize,
    pub stats: ImportStats,
}

#[derive(Debug)]
struct RunState {
    phase: ImportPhase,
    batches_completed: usize,
    batches_total: usize,
    cancel: CancellationToken,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            phase: ImportPhase::Idle,
            batches_completed: 0,
            batches_total: 0,
            cancel: CancellationToken::new(),
        }
    }
}

/// Coordinates imports of EasyPay client records into a [`RecordStore`].
///
/// One accumulator lives for the importer's lifetime and is reset at the start of
/// every run; a second run is refused while one is in flight, so stats are never
/// shared between concurrent imports.
pub struct ClientImporter {
    store: Arc<dyn RecordStore>,
    config: ImportConfig,
    stats: Arc<StatsAccumulator>,
    state: Mutex<RunState>,
    run_lock: tokio::sync::Mutex<()>,
}

impl ClientImporter {
    pub fn new(store: Arc<dyn RecordStore>, config: ImportConfig) -> Self {
        Self {
            store,
            config,
            stats: Arc::new(StatsAccumulator::new()),
            state: Mutex::new(RunState::default()),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Load the configured source and import every record in it.
    ///
    /// Only a source that cannot be read or parsed fails the call; per-record
    /// failures are reported through `errors` in the returned stats.
    pub async fn import_all(&self, options: ImportOptions) -> ImportResult<ImportStats> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| ImportError::AlreadyRunning)?;
        let started = Instant::now();
        self.begin_run(ImportPhase::Loading);

        let records = match source::load_records(&self.config.source_path).await {
            Ok(records) => records,
            Err(err) => {
                log::error!("import source failed to load: {}", err);
                self.set_phase(ImportPhase::Failed);
                return Err(err);
            }
        };

        self.run(records, options, started).await
    }

    /// Import records the caller already holds, skipping the loading phase.
    pub async fn import_records(
        &self,
        records: Vec<ImportRecord>,
        options: ImportOptions,
    ) -> ImportResult<ImportStats> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| ImportError::AlreadyRunning)?;
        let started = Instant::now();
        self.begin_run(ImportPhase::Loading);

        self.run(records, options, started).await
    }

    /// Last known counters; live while a run is in progress.
    pub fn stats(&self) -> ImportStats {
        self.stats.snapshot()
    }

    /// Zero the counters of the last run.
    ///
    /// Refused with [`ImportError::AlreadyRunning`] while a run holds the lock.
    pub fn reset_stats(&self) -> ImportResult<()> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| ImportError::AlreadyRunning)?;
        self.stats.reset();
        Ok(())
    }

    /// Ask the running import to stop at the next batch boundary.
    ///
    /// Returns `false` when no run can still be stopped. A dry run analyzes in
    /// one pass, so only the loading and processing phases are cancellable.
    pub fn cancel(&self) -> bool {
        let state = self.state.lock();
        let running = matches!(state.phase, ImportPhase::Loading | ImportPhase::Processing);
        if running {
            state.cancel.cancel();
        }
        running
    }

    pub fn status(&self) -> ImportStatus {
        let state = self.state.lock();
        ImportStatus {
            phase: state.phase,
            batches_completed: state.batches_completed,
            batches_total: state.batches_total,
            stats: self.stats.snapshot(),
        }
    }

    async fn run(
        &self,
        records: Vec<ImportRecord>,
        options: ImportOptions,
        started: Instant,
    ) -> ImportResult<ImportStats> {
        self.stats.set_total(records.len());

        if options.dry_run {
            let cancel = self.state.lock().cancel.clone();
            if cancel.is_cancelled() {
                return Err(self.cancelled(started));
            }
            self.set_phase(ImportPhase::Analyzing);
            analyzer::analyze(&records, &self.stats);
            return Ok(self.finish(started));
        }

        let batch_size = options.batch_size_or(self.config.default_batch_size);
        let batches = into_batches(records, batch_size);
        let cancel = {
            let mut state = self.state.lock();
            state.phase = ImportPhase::Processing;
            state.batches_total = batches.len();
            state.cancel.clone()
        };

        log::info!(
            "importing {} easypay records in {} batches of up to {}",
            self.stats.snapshot().total,
            batches.len(),
            batch_size
        );

        for (index, batch) in batches.into_iter().enumerate() {
            if cancel.is_cancelled() {
                log::warn!("import cancelled before batch {}", index + 1);
                return Err(self.cancelled(started));
            }

            let failures = self.process_batch(batch, options).await;
            self.state.lock().batches_completed = index + 1;

            log::debug!("batch {} settled with {} failures", index + 1, failures);
        }

        let stats = self.finish(started);
        log::info!(
            "import complete: {} imported, {} skipped, {} errors of {} in {}ms",
            stats.imported,
            stats.skipped,
            stats.errors,
            stats.total,
            stats.processing_time
        );
        Ok(stats)
    }

    /// Reconcile every record of `batch` concurrently and wait for all of them.
    async fn process_batch(&self, batch: Vec<ImportRecord>, options: ImportOptions) -> usize {
        let mut tasks = JoinSet::new();

        for record in batch {
            let store = Arc::clone(&self.store);
            let stats = Arc::clone(&self.stats);
            tasks.spawn(async move { reconcile(store.as_ref(), &record, &options, &stats).await });
        }

        let mut failures = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) if outcome.is_failure() => failures += 1,
                Ok(_) => {}
                Err(err) => {
                    // The task died before counting its record.
                    self.stats.record_error();
                    failures += 1;
                    log::error!("reconcile task aborted: {}", err);
                }
            }
        }

        failures
    }

    fn begin_run(&self, phase: ImportPhase) {
        self.stats.reset();
        let mut state = self.state.lock();
        *state = RunState {
            phase,
            ..RunState::default()
        };
    }

    fn set_phase(&self, phase: ImportPhase) {
        self.state.lock().phase = phase;
    }

    fn cancelled(&self, started: Instant) -> ImportError {
        self.stats.set_processing_time(started.elapsed());
        self.set_phase(ImportPhase::Cancelled);
        ImportError::Cancelled {
            stats: self.stats.snapshot(),
        }
    }

    fn finish(&self, started: Instant) -> ImportStats {
        self.stats.set_processing_time(started.elapsed());
        self.set_phase(ImportPhase::Completed);
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryRecordStore;

    fn importer(store: Arc<MemoryRecordStore>) -> ClientImporter {
        ClientImporter::new(store, ImportConfig::with_source("/nonexistent/easypay.json"))
    }

    fn records(keys: &[&str]) -> Vec<ImportRecord> {
        keys.iter().map(|key| ImportRecord::with_key(*key)).collect()
    }

    #[tokio::test]
    async fn status_tracks_batches() {
        let store = Arc::new(MemoryRecordStore::new());
        let importer = importer(store);

        let stats = importer
            .import_records(
                records(&["a", "b", "c", "d", "e"]),
                ImportOptions::default().with_batch_size(2),
            )
            .await
            .expect("import succeeds");

        let status = importer.status();
        assert_eq!(stats.imported, 5);
        assert_eq!(status.phase, ImportPhase::Completed);
        assert_eq!(status.batches_total, 3);
        assert_eq!(status.batches_completed, 3);
        assert_eq!(status.stats, stats);
    }

    #[tokio::test]
    async fn unreadable_source_fails_the_run() {
        let store = Arc::new(MemoryRecordStore::new());
        let importer = importer(Arc::clone(&store));

        let err = importer
            .import_all(ImportOptions::default())
            .await
            .expect_err("source is missing");

        assert!(matches!(err, ImportError::SourceUnavailable { .. }));
        assert_eq!(importer.status().phase, ImportPhase::Failed);
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn cancel_without_a_run_is_a_no_op() {
        let importer = importer(Arc::new(MemoryRecordStore::new()));
        assert!(!importer.cancel());
        assert_eq!(importer.status().phase, ImportPhase::Idle);
    }

    #[tokio::test]
    async fn reset_zeroes_the_last_snapshot() {
        let importer = importer(Arc::new(MemoryRecordStore::new()));
        importer
            .import_records(records(&["a"]), ImportOptions::default())
            .await
            .expect("import succeeds");
        assert_eq!(importer.stats().imported, 1);

        importer.reset_stats().expect("no run in flight");

        assert_eq!(importer.stats(), ImportStats::default());
    }

    #[tokio::test]
    async fn analysis_phase_is_not_cancellable() {
        let importer = importer(Arc::new(MemoryRecordStore::new()));
        importer.begin_run(ImportPhase::Loading);
        importer.set_phase(ImportPhase::Analyzing);

        assert!(!importer.cancel());
        assert_eq!(importer.status().phase, ImportPhase::Analyzing);
    }

    #[tokio::test]
    async fn cancel_during_loading_stops_a_dry_run() {
        let importer = importer(Arc::new(MemoryRecordStore::new()));
        importer.begin_run(ImportPhase::Loading);
        assert!(importer.cancel());

        let err = importer
            .run(records(&["a", "a"]), ImportOptions::default().dry_run(), Instant::now())
            .await
            .expect_err("cancelled before analysis");

        assert!(matches!(err, ImportError::Cancelled { ref stats } if stats.duplicates == 0));
        assert_eq!(importer.status().phase, ImportPhase::Cancelled);
    }
}
