//! Bulk EasyPay client import.
//!
//! This module loads client records from a JSON dataset into the
//! `easypay_clients` table:
//!
//! 1. **Source** (`source`) - Reads and parses the full dataset into memory
//! 2. **Batching** (`batcher`) - Splits records into fixed-size batches
//! 3. **Reconciliation** (`reconciler`) - Decides insert, update or skip per record
//! 4. **Statistics** (`stats`) - Atomic counters shared by every in-flight record
//! 5. **Dry run** (`analyzer`) - Reports duplicate keys and emails without writing
//! 6. **Coordination** (`importer`) - Sequences batches and owns the run state
//!
//! # Concurrency
//!
//! Batches run one after another. Inside a batch every record is reconciled on
//! its own task and the batch only settles once all of them finished, whatever
//! their outcome. Two records with the same key in one batch can both miss the
//! existence check; the store's unique constraint rejects the second insert and
//! it is counted as an error.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use crate::import::{ClientImporter, ImportConfig, ImportOptions, PgRecordStore};
//!
//! let store = Arc::new(PgRecordStore::new(pool));
//! let importer = ClientImporter::new(store, ImportConfig::from_env());
//!
//! let stats = importer.import_all(ImportOptions::default()).await?;
//! println!("imported {} of {} clients", stats.imported, stats.total);
//! ```

pub mod analyzer;
pub mod batcher;
pub mod error;
pub mod importer;
pub mod options;
pub mod pg_store;
pub mod reconciler;
pub mod record;
pub mod source;
pub mod stats;
pub mod store;

pub use error::{ImportError, ImportResult};
pub use importer::{ClientImporter, ImportPhase, ImportStatus};
pub use options::{ImportConfig, ImportOptions};
pub use pg_store::PgRecordStore;
pub use record::ImportRecord;
pub use stats::{ImportStats, StatsAccumulator};
pub use store::{RecordStore, StoreError};
