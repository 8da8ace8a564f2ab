//! Dry-run duplicate analysis.
//!
//! Only looks for duplication inside the dataset itself; rows already present in
//! the store are not consulted.

use crate::import::record::ImportRecord;
use crate::import::stats::StatsAccumulator;
use std::collections::HashSet;

/// Count duplicate keys and emails in `records` without touching the store.
///
/// The key check and the email check are independent, so one record can add two
/// duplicates. Existing callers rely on that number. Afterwards `skipped` mirrors
/// `duplicates`. Records without a key only take part in the email check.
pub fn analyze(records: &[ImportRecord], stats: &StatsAccumulator) {
    stats.set_total(records.len());

    let mut seen_keys: HashSet<&str> = HashSet::with_capacity(records.len());
    let mut seen_emails: HashSet<&str> = HashSet::new();

    for record in records {
        if let Some(key) = record.key() {
            if !seen_keys.insert(key) {
                stats.record_duplicate();
            }
        }

        if let Some(email) = record.email() {
            if !seen_emails.insert(email) {
                stats.record_duplicate();
            }
        }
    }

    stats.skip_duplicates();

    log::info!(
        "dry run analyzed {} records, {} unique keys, {} duplicate signals",
        records.len(),
        seen_keys.len(),
        stats.snapshot().duplicates
    );
}
