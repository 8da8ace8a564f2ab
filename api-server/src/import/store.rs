//! Persistence boundary used by the importer.

use crate::import::record::ImportRecord;
use crate::models::EasyPayClient;
use rocket_db_pools::sqlx;
use thiserror::Error;

/// Failures reported by a [`RecordStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("client '{client_id}' already exists")]
    Duplicate { client_id: String },
    #[error("client '{client_id}' not found")]
    NotFound { client_id: String },
    #[error("record is missing its clientId")]
    MissingKey,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Existence check, insert and update keyed by `client_id`.
///
/// Implementations must tolerate concurrent calls from every record of a batch.
/// Inserting a key that already exists must fail with [`StoreError::Duplicate`]
/// rather than creating a second row.
#[rocket::async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_key(&self, client_id: &str) -> Result<Option<EasyPayClient>, StoreError>;

    /// Insert a new row and return its surrogate id.
    async fn insert(&self, record: &ImportRecord) -> Result<i32, StoreError>;

    /// Overwrite every non-key field of the row identified by `client_id`.
    async fn update(&self, client_id: &str, record: &ImportRecord) -> Result<(), StoreError>;
}
