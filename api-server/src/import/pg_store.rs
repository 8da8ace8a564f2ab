//! PostgreSQL-backed [`RecordStore`] over the `easypay_clients` table.

use crate::import::record::ImportRecord;
use crate::import::store::{RecordStore, StoreError};
use crate::models::EasyPayClient;
use rocket_db_pools::sqlx::{self, PgPool, Postgres, Row, postgres::PgArguments, query::Query};

/// Column list shared by every query returning [`EasyPayClient`] rows.
pub const CLIENT_COLUMNS: &str = r#"id, client_id, name, first_name, last_name, email, phone,
    is_resident, is_identified, is_verified, is_blocked, birth_date,
    document_type, document_number, document_issue_date, country, city, address,
    registration_date, registration_source, last_activity_date, partner,
    created_at, updated_at"#;

const UNIQUE_VIOLATION: &str = "23505";

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete a client by key, returning whether a row was removed.
    pub async fn delete(&self, client_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM easypay_clients WHERE client_id = $1")
            .bind(client_id)
            .execute(&self.pool)
            .await
            .map_err(map_query_error)?;

        Ok(result.rows_affected() > 0)
    }
}

/// Bind the 20 non-key attributes in column order.
fn bind_attributes<'q>(
    query: Query<'q, Postgres, PgArguments>,
    record: &'q ImportRecord,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(record.name.as_deref())
        .bind(record.first_name.as_deref())
        .bind(record.last_name.as_deref())
        .bind(record.email.as_deref())
        .bind(record.phone.as_deref())
        .bind(record.is_resident.as_deref())
        .bind(record.is_identified.as_deref())
        .bind(record.is_verified.as_deref())
        .bind(record.is_blocked.as_deref())
        .bind(record.birth_date.as_deref())
        .bind(record.document_type.as_deref())
        .bind(record.document_number.as_deref())
        .bind(record.document_issue_date.as_deref())
        .bind(record.country.as_deref())
        .bind(record.city.as_deref())
        .bind(record.address.as_deref())
        .bind(record.registration_date.as_deref())
        .bind(record.registration_source.as_deref())
        .bind(record.last_activity_date.as_deref())
        .bind(record.partner.as_deref())
}

/// Pool exhaustion and lost connections become [`StoreError::Unavailable`].
fn map_query_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Database(err),
    }
}

fn map_write_error(err: sqlx::Error, client_id: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Duplicate {
                client_id: client_id.to_string(),
            }
        }
        _ => map_query_error(err),
    }
}

#[rocket::async_trait]
impl RecordStore for PgRecordStore {
    async fn find_by_key(&self, client_id: &str) -> Result<Option<EasyPayClient>, StoreError> {
        let query = format!("SELECT {CLIENT_COLUMNS} FROM easypay_clients WHERE client_id = $1");

        let client = sqlx::query_as::<_, EasyPayClient>(&query)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_query_error)?;

        Ok(client)
    }

    async fn insert(&self, record: &ImportRecord) -> Result<i32, StoreError> {
        let client_id = record.key().ok_or(StoreError::MissingKey)?;

        let query = sqlx::query(
            r#"INSERT INTO easypay_clients (
                   client_id, name, first_name, last_name, email, phone,
                   is_resident, is_identified, is_verified, is_blocked, birth_date,
                   document_type, document_number, document_issue_date, country, city, address,
                   registration_date, registration_source, last_activity_date, partner
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                       $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
               RETURNING id"#,
        )
        .bind(client_id);

        let row = bind_attributes(query, record)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_write_error(err, client_id))?;

        Ok(row.try_get("id")?)
    }

    async fn update(&self, client_id: &str, record: &ImportRecord) -> Result<(), StoreError> {
        let query = sqlx::query(
            r#"UPDATE easypay_clients
               SET name = $2, first_name = $3, last_name = $4, email = $5, phone = $6,
                   is_resident = $7, is_identified = $8, is_verified = $9, is_blocked = $10,
                   birth_date = $11, document_type = $12, document_number = $13,
                   document_issue_date = $14, country = $15, city = $16, address = $17,
                   registration_date = $18, registration_source = $19,
                   last_activity_date = $20, partner = $21, updated_at = NOW()
               WHERE client_id = $1"#,
        )
        .bind(client_id);

        let result = bind_attributes(query, record)
            .execute(&self.pool)
            .await
            .map_err(|err| map_write_error(err, client_id))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                client_id: client_id.to_string(),
            });
        }

        Ok(())
    }
}
