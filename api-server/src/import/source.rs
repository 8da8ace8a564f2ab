//! Loading of the JSON import dataset.
//!
//! The dataset is fully materialized: sources are in the thousands of rows. Both a
//! bare array of records and an object wrapping the array under `clients` or
//! `data` are accepted, the latter being what the spreadsheet export tool emits.

use crate::import::error::{ImportError, ImportResult};
use crate::import::record::ImportRecord;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum Dataset {
    Records(Vec<ImportRecord>),
    Clients { clients: Vec<ImportRecord> },
    Data { data: Vec<ImportRecord> },
}

impl Dataset {
    fn into_records(self) -> Vec<ImportRecord> {
        match self {
            Dataset::Records(records) => records,
            Dataset::Clients { clients } => clients,
            Dataset::Data { data } => data,
        }
    }
}

/// Read and parse every record from `path`.
///
/// Any I/O or parse failure is reported as [`ImportError::SourceUnavailable`].
pub async fn load_records(path: &Path) -> ImportResult<Vec<ImportRecord>> {
    log::debug!("reading import source {}", path.display());

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ImportError::source_unavailable(path, err))?;

    let records = parse_records(&bytes).map_err(|err| ImportError::source_unavailable(path, err))?;

    log::info!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse a dataset already held in memory.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<ImportRecord>, serde_json::Error> {
    serde_json::from_slice::<Dataset>(bytes).map(Dataset::into_records)
}
