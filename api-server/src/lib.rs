#[macro_use]
extern crate rocket;

pub mod database;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod request_logger;
pub mod routes;

use crate::db::EasyPayDb;
use crate::import::{ClientImporter, ImportConfig, PgRecordStore};
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();
    log::info!("starting easypay api server");

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Put, Method::Delete]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::build()
        .attach(RequestLogger)
        .attach(EasyPayDb::init())
        .attach(cors)
        .attach(AdHoc::try_on_ignite("Run Migrations", |rocket| async move {
            match EasyPayDb::fetch(&rocket) {
                Some(db) => {
                    let pool = (**db).clone();
                    match database::run_migrations(&pool).await {
                        Ok(_) => Ok(rocket),
                        Err(e) => {
                            log::error!("database migrations failed: {}", e);
                            Err(rocket)
                        }
                    }
                }
                None => {
                    log::error!("database pool not available for migrations");
                    Err(rocket)
                }
            }
        }))
        // The importer and client routes share the pool through managed state.
        .attach(AdHoc::try_on_ignite(
            "Manage DB Pool and Importer",
            |rocket| async move {
                match EasyPayDb::fetch(&rocket) {
                    Some(db) => {
                        let pool = (**db).clone();
                        let config = ImportConfig::from_env();
                        log::info!(
                            "easypay import source {} (default batch size {})",
                            config.source_path.display(),
                            config.default_batch_size
                        );
                        let store = Arc::new(PgRecordStore::new(pool.clone()));
                        let importer = ClientImporter::new(store, config);

                        Ok(rocket.manage(pool).manage(importer))
                    }
                    None => Err(rocket),
                }
            },
        ))
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Health routes
                routes::health::health_check,
                // Import routes
                routes::import::import_easypay,
                routes::import::import_easypay_records,
                routes::import::get_import_stats,
                routes::import::reset_import_stats,
                routes::import::get_import_status,
                routes::import::cancel_import,
                // Client routes
                routes::clients::list_clients,
                routes::clients::get_client,
                routes::clients::create_client,
                routes::clients::update_client,
                routes::clients::delete_client,
            ],
        )
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../v1/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("EasyPay API", "../../v1/openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use crate::import::ClientImporter;
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::{self, PgPool};

    pub use database::{TestDatabase, TestDatabaseError};
    pub use memory::MemoryRecordStore;

    /// Convenience helpers for seeding client rows in tests.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        /// Insert a client row with the required contact fields, returning its id.
        pub async fn insert_client(
            &self,
            client_id: &str,
            name: Option<&str>,
            email: &str,
            phone: &str,
        ) -> Result<i32, sqlx::Error> {
            sqlx::query_scalar(
                "INSERT INTO easypay_clients (client_id, name, email, phone) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(client_id)
            .bind(name)
            .bind(email)
            .bind(phone)
            .fetch_one(self.pool)
            .await
        }

        pub async fn count_clients(&self) -> Result<i64, sqlx::Error> {
            sqlx::query_scalar("SELECT COUNT(*) FROM easypay_clients")
                .fetch_one(self.pool)
                .await
        }
    }

    pub mod memory {
        use crate::import::{ImportRecord, RecordStore, StoreError};
        use crate::models::EasyPayClient;
        use chrono::Utc;
        use parking_lot::Mutex;
        use std::collections::{HashMap, HashSet};
        use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
        use tokio::sync::Barrier;

        /// In-memory [`RecordStore`] with call counters and injectable failures.
        #[derive(Default)]
        pub struct MemoryRecordStore {
            rows: Mutex<HashMap<String, (i32, ImportRecord)>>,
            next_id: AtomicI32,
            lookups: AtomicUsize,
            inserts: AtomicUsize,
            updates: AtomicUsize,
            failing_lookups: Mutex<HashSet<String>>,
            failing_writes: Mutex<HashSet<String>>,
            panicking_lookups: Mutex<HashSet<String>>,
            lookup_barrier: Option<Barrier>,
        }

        impl MemoryRecordStore {
            pub fn new() -> Self {
                Self::default()
            }

            /// Store pre-seeded with `records`, keyed by their client id.
            pub fn with_records(records: impl IntoIterator<Item = ImportRecord>) -> Self {
                let store = Self::new();
                {
                    let mut rows = store.rows.lock();
                    for record in records {
                        if let Some(key) = record.key().map(str::to_string) {
                            let id = store.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                            rows.insert(key, (id, record));
                        }
                    }
                }
                store
            }

            /// Hold every lookup until `parties` lookups have read the map.
            ///
            /// Lookups are released in groups of `parties`, so the number of
            /// lookups a test triggers must be a multiple of it.
            pub fn with_lookup_barrier(mut self, parties: usize) -> Self {
                self.lookup_barrier = Some(Barrier::new(parties));
                self
            }

            pub fn fail_lookups_for(&self, client_id: &str) {
                self.failing_lookups.lock().insert(client_id.to_string());
            }

            pub fn fail_writes_for(&self, client_id: &str) {
                self.failing_writes.lock().insert(client_id.to_string());
            }

            /// Make the lookup of `client_id` panic inside its reconcile task.
            pub fn panic_on_lookup_for(&self, client_id: &str) {
                self.panicking_lookups.lock().insert(client_id.to_string());
            }

            pub fn get(&self, client_id: &str) -> Option<ImportRecord> {
                self.rows.lock().get(client_id).map(|(_, record)| record.clone())
            }

            pub fn len(&self) -> usize {
                self.rows.lock().len()
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            pub fn lookup_calls(&self) -> usize {
                self.lookups.load(Ordering::SeqCst)
            }

            pub fn insert_calls(&self) -> usize {
                self.inserts.load(Ordering::SeqCst)
            }

            pub fn update_calls(&self) -> usize {
                self.updates.load(Ordering::SeqCst)
            }

            fn check_write(&self, client_id: &str) -> Result<(), StoreError> {
                if self.failing_writes.lock().contains(client_id) {
                    return Err(StoreError::Unavailable(format!(
                        "write rejected for {client_id}"
                    )));
                }
                Ok(())
            }
        }

        fn to_client(id: i32, client_id: &str, record: &ImportRecord) -> EasyPayClient {
            let now = Utc::now();
            let record = record.clone();
            EasyPayClient {
                id,
                client_id: client_id.to_string(),
                name: record.name,
                first_name: record.first_name,
                last_name: record.last_name,
                email: record.email,
                phone: record.phone,
                is_resident: record.is_resident,
                is_identified: record.is_identified,
                is_verified: record.is_verified,
                is_blocked: record.is_blocked,
                birth_date: record.birth_date,
                document_type: record.document_type,
                document_number: record.document_number,
                document_issue_date: record.document_issue_date,
                country: record.country,
                city: record.city,
                address: record.address,
                registration_date: record.registration_date,
                registration_source: record.registration_source,
                last_activity_date: record.last_activity_date,
                partner: record.partner,
                created_at: now,
                updated_at: now,
            }
        }

        #[rocket::async_trait]
        impl RecordStore for MemoryRecordStore {
            async fn find_by_key(
                &self,
                client_id: &str,
            ) -> Result<Option<EasyPayClient>, StoreError> {
                self.lookups.fetch_add(1, Ordering::SeqCst);
                if self.failing_lookups.lock().contains(client_id) {
                    return Err(StoreError::Unavailable(format!(
                        "lookup rejected for {client_id}"
                    )));
                }
                if self.panicking_lookups.lock().contains(client_id) {
                    panic!("lookup panicked for {client_id}");
                }

                let found = self
                    .rows
                    .lock()
                    .get(client_id)
                    .map(|(id, record)| to_client(*id, client_id, record));

                if let Some(barrier) = &self.lookup_barrier {
                    barrier.wait().await;
                }

                Ok(found)
            }

            async fn insert(&self, record: &ImportRecord) -> Result<i32, StoreError> {
                self.inserts.fetch_add(1, Ordering::SeqCst);
                let client_id = record.key().ok_or(StoreError::MissingKey)?;
                self.check_write(client_id)?;

                let mut rows = self.rows.lock();
                if rows.contains_key(client_id) {
                    return Err(StoreError::Duplicate {
                        client_id: client_id.to_string(),
                    });
                }
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                rows.insert(client_id.to_string(), (id, record.clone()));
                Ok(id)
            }

            async fn update(&self, client_id: &str, record: &ImportRecord) -> Result<(), StoreError> {
                self.updates.fetch_add(1, Ordering::SeqCst);
                self.check_write(client_id)?;

                let mut rows = self.rows.lock();
                match rows.get_mut(client_id) {
                    Some((_, stored)) => {
                        let mut updated = record.clone();
                        updated.client_id = Some(client_id.to_string());
                        *stored = updated;
                        Ok(())
                    }
                    None => Err(StoreError::NotFound {
                        client_id: client_id.to_string(),
                    }),
                }
            }
        }
    }

    pub mod database {
        use crate::database::MIGRATOR;
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use testcontainers_modules::postgres::Postgres;
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("TEST_DATABASE_URL not set")]
            MissingUrl,
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Ephemeral database factory for integration tests.
        ///
        /// Each instance creates its own uniquely named database and applies the
        /// migrations, so tests never share rows.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Provision against `TEST_DATABASE_URL`, or a disposable container when
            /// `TEST_DATABASE_CONTAINER=1`. Returns [`TestDatabaseError::MissingUrl`]
            /// when neither is available so callers can skip.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
                    return Self::provision(&url, None).await;
                }

                if std::env::var("TEST_DATABASE_CONTAINER").as_deref() == Ok("1") {
                    return Self::new_container().await;
                }

                Err(TestDatabaseError::MissingUrl)
            }

            /// Launch a Postgres container and provision a database inside it.
            pub async fn new_container() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;
                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                Self::provision(&url, Some(container)).await
            }

            async fn provision(
                url: &str,
                container: Option<ContainerAsync<Postgres>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options: PgConnectOptions = url.parse()?;
                let base_options = base_options.log_statements(LevelFilter::Off);

                let base_name = base_options
                    .get_database()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "postgres".to_string());

                let admin_options = base_options.clone().database("postgres");
                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let database_name = format!("{}_{}", base_name, Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", database_name);
                sqlx::query(&create_sql).execute(&admin_pool).await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.database(&database_name))
                    .await?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name,
                    container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database(self.admin_options.clone(), &self.database_name).await?;
                self.container.take();

                Ok(())
            }
        }

        async fn drop_database(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;

            let drop_force = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", database_name);
            sqlx::query(&drop_force).execute(&admin_pool).await?;
            Ok(())
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                if let Some(pool) = self.pool.take() {
                    let admin_options = self.admin_options.clone();
                    let database_name = self.database_name.clone();
                    if let Ok(handle) = Handle::try_current() {
                        handle.spawn(async move {
                            pool.close().await;
                            let _ = drop_database(admin_options, &database_name).await;
                        });
                    }
                }
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        pg_pool: Option<PgPool>,
        importer: Option<ClientImporter>,
    }

    impl TestRocketBuilder {
        /// Start a builder with a random port and logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                ..Default::default()
            }
        }

        /// Mount routes under `/api/v1`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api/v1".to_string(), routes));
            self
        }

        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.pg_pool = Some(pool);
            self
        }

        pub fn manage_importer(mut self, importer: ClientImporter) -> Self {
            self.importer = Some(importer);
            self
        }

        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment);

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }

            if let Some(importer) = self.importer {
                rocket = rocket.manage(importer);
            }

            rocket
        }

        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
