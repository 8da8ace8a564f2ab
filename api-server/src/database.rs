//! Schema migrations for the `easypay_clients` store.
//!
//! Applied on ignite by the API and before every CLI import, so the table is
//! always on the latest schema before records are written.

use rocket_db_pools::sqlx::{self, PgPool, migrate::Migrator};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply pending migrations. Already-applied migrations are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    log::info!("checking database migration state");

    MIGRATOR.run(pool).await?;

    log::info!("database migrations up to date");
    Ok(())
}
