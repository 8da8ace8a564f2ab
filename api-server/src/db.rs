use rocket_db_pools::{Database, sqlx};

#[derive(Database)]
#[database("easypay_db")]
pub struct EasyPayDb(sqlx::PgPool);
