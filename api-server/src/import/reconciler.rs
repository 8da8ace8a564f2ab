//! Per-record insert / update / skip decision.

use crate::import::error::ImportError;
use crate::import::options::ImportOptions;
use crate::import::record::ImportRecord;
use crate::import::stats::StatsAccumulator;
use crate::import::store::RecordStore;

/// What happened to one record.
#[derive(Debug)]
pub enum ReconcileOutcome {
    Inserted(i32),
    Updated,
    Skipped,
    Failed(ImportError),
}

impl ReconcileOutcome {
    /// Whether the record landed in `errors`.
    pub fn is_failure(&self) -> bool {
        matches!(self, ReconcileOutcome::Failed(_))
    }
}

/// Reconcile `record` against the store and bump exactly one counter.
///
/// Store failures are absorbed into `errors`; nothing is propagated to the batch.
pub async fn reconcile<S>(
    store: &S,
    record: &ImportRecord,
    options: &ImportOptions,
    stats: &StatsAccumulator,
) -> ReconcileOutcome
where
    S: RecordStore + ?Sized,
{
    let outcome = decide(store, record, options).await;

    match &outcome {
        ReconcileOutcome::Inserted(_) | ReconcileOutcome::Updated => stats.record_imported(),
        ReconcileOutcome::Skipped => stats.record_skipped(),
        ReconcileOutcome::Failed(err) => {
            stats.record_error();
            log::warn!(
                "import of client '{}' failed: {}",
                record.client_id.as_deref().unwrap_or("<missing>"),
                err
            );
        }
    }

    outcome
}

async fn decide<S>(store: &S, record: &ImportRecord, options: &ImportOptions) -> ReconcileOutcome
where
    S: RecordStore + ?Sized,
{
    let Some(client_id) = record.key() else {
        return ReconcileOutcome::Failed(ImportError::MissingKey);
    };

    let existing = match store.find_by_key(client_id).await {
        Ok(existing) => existing,
        Err(err) => return ReconcileOutcome::Failed(err.into()),
    };

    match existing {
        None => match store.insert(record).await {
            Ok(id) => ReconcileOutcome::Inserted(id),
            Err(err) => ReconcileOutcome::Failed(err.into()),
        },
        Some(_) if options.update_existing => match store.update(client_id, record).await {
            Ok(()) => ReconcileOutcome::Updated,
            Err(err) => ReconcileOutcome::Failed(err.into()),
        },
        Some(_) => {
            log::trace!("client '{}' already exists, skipping", client_id);
            ReconcileOutcome::Skipped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::store::StoreError;
    use crate::test_support::MemoryRecordStore;

    fn record(client_id: &str, name: &str) -> ImportRecord {
        ImportRecord {
            name: Some(name.to_string()),
            email: Some(format!("{client_id}@example.com")),
            phone: Some("+10000000".to_string()),
            ..ImportRecord::with_key(client_id)
        }
    }

    #[tokio::test]
    async fn inserts_absent_records() {
        let store = MemoryRecordStore::new();
        let stats = StatsAccumulator::new();

        let outcome = reconcile(&store, &record("C1", "Ann"), &ImportOptions::default(), &stats).await;

        assert!(matches!(outcome, ReconcileOutcome::Inserted(_)));
        assert_eq!(stats.snapshot().imported, 1);
        assert!(store.get("C1").is_some());
    }

    #[tokio::test]
    async fn skips_existing_records_by_default() {
        let store = MemoryRecordStore::with_records([record("C1", "Original")]);
        let stats = StatsAccumulator::new();

        let outcome = reconcile(&store, &record("C1", "Changed"), &ImportOptions::default(), &stats).await;

        assert!(matches!(outcome, ReconcileOutcome::Skipped));
        assert_eq!(stats.snapshot().skipped, 1);
        assert_eq!(store.get("C1").and_then(|r| r.name).as_deref(), Some("Original"));
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn skip_duplicates_flag_does_not_change_skip_policy() {
        let store = MemoryRecordStore::with_records([record("C1", "Original")]);
        let stats = StatsAccumulator::new();
        let options = ImportOptions {
            skip_duplicates: false,
            ..ImportOptions::default()
        };

        let outcome = reconcile(&store, &record("C1", "Changed"), &options, &stats).await;

        assert!(matches!(outcome, ReconcileOutcome::Skipped));
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn updates_existing_records_when_requested() {
        let store = MemoryRecordStore::with_records([record("C1", "Original")]);
        let stats = StatsAccumulator::new();
        let options = ImportOptions::default().updating_existing();

        let outcome = reconcile(&store, &record("C1", "Changed"), &options, &stats).await;

        assert!(matches!(outcome, ReconcileOutcome::Updated));
        assert_eq!(stats.snapshot().imported, 1);
        assert_eq!(store.get("C1"), Some(record("C1", "Changed")));
    }

    #[tokio::test]
    async fn missing_key_counts_one_error_without_store_calls() {
        let store = MemoryRecordStore::new();
        let stats = StatsAccumulator::new();
        let keyless = ImportRecord {
            name: Some("Nobody".into()),
            ..Default::default()
        };

        let outcome = reconcile(&store, &keyless, &ImportOptions::default(), &stats).await;

        assert!(matches!(outcome, ReconcileOutcome::Failed(ImportError::MissingKey)));
        let snapshot = stats.snapshot();
        assert_eq!((snapshot.imported, snapshot.skipped, snapshot.errors), (0, 0, 1));
        assert_eq!(store.lookup_calls(), 0);
    }

    #[tokio::test]
    async fn lookup_failure_is_absorbed() {
        let store = MemoryRecordStore::new();
        store.fail_lookups_for("C1");
        let stats = StatsAccumulator::new();

        let outcome = reconcile(&store, &record("C1", "Ann"), &ImportOptions::default(), &stats).await;

        assert!(matches!(
            outcome,
            ReconcileOutcome::Failed(ImportError::Store(StoreError::Unavailable(_)))
        ));
        assert_eq!(stats.snapshot().errors, 1);
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn insert_failure_is_absorbed() {
        let store = MemoryRecordStore::new();
        store.fail_writes_for("C1");
        let stats = StatsAccumulator::new();

        let outcome = reconcile(&store, &record("C1", "Ann"), &ImportOptions::default(), &stats).await;

        assert!(outcome.is_failure());
        assert_eq!(stats.snapshot().errors, 1);
        assert_eq!(stats.snapshot().imported, 0);
    }
}
