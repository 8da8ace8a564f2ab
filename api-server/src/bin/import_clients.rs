use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use easypay_api::database::run_migrations;
use easypay_api::import::{ClientImporter, ImportConfig, ImportOptions, PgRecordStore};

#[derive(Parser, Debug)]
#[command(
    name = "import_clients",
    about = "Import EasyPay clients from a JSON dataset"
)]
struct Args {
    /// JSON dataset to import (defaults to EASYPAY_IMPORT_SOURCE).
    #[arg(long)]
    source: Option<PathBuf>,

    /// Records reconciled concurrently per batch (defaults to EASYPAY_IMPORT_BATCH_SIZE).
    #[arg(long)]
    batch_size: Option<usize>,

    /// Overwrite clients that already exist instead of skipping them.
    #[arg(long)]
    update_existing: bool,

    #[arg(long)]
    no_skip_duplicates: bool,

    /// Report duplicates without writing anything.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    if args.batch_size == Some(0) {
        writeln!(io::stderr(), "error: --batch-size must be at least 1")?;
        std::process::exit(1);
    }

    let mut config = ImportConfig::from_env();
    if let Some(source) = args.source {
        config.source_path = source;
    }

    let options = ImportOptions {
        batch_size: args.batch_size,
        skip_duplicates: !args.no_skip_duplicates,
        update_existing: args.update_existing,
        dry_run: args.dry_run,
    };

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    run_migrations(&pool).await?;

    let importer = ClientImporter::new(Arc::new(PgRecordStore::new(pool.clone())), config);
    let stats = match importer.import_all(options).await {
        Ok(stats) => stats,
        Err(err) => {
            writeln!(io::stderr(), "error: {err}")?;
            pool.close().await;
            std::process::exit(1);
        }
    };

    println!("{}", serde_json::to_string_pretty(&stats)?);
    pool.close().await;
    Ok(())
}
