use crate::error::ApiError;
use crate::import::pg_store::CLIENT_COLUMNS;
use crate::import::{ImportRecord, PgRecordStore, RecordStore};
use crate::models::{DataResponse, EasyPayClient, MessageResponse, PageMetadata, PaginatedResponse};
use crate::routes::params::ClientListParams;
use rocket::State;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::openapi;

async fn fetch_client(pool: &PgPool, client_id: &str) -> Result<EasyPayClient, ApiError> {
    PgRecordStore::new(pool.clone())
        .find_by_key(client_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Client '{client_id}' not found")))
}

/// List EasyPay clients with optional search, sorting and pagination
#[openapi(tag = "EasyPay Clients")]
#[get("/easypay/clients?<params..>")]
pub async fn list_clients(
    pool: &State<PgPool>,
    params: Option<ClientListParams>,
) -> Result<Json<PaginatedResponse<EasyPayClient>>, ApiError> {
    let params = params.unwrap_or_default();
    let page = params.page();
    let size = params.size();
    let pattern = params.search_pattern();

    let filter = if pattern.is_some() {
        "WHERE client_id ILIKE $1 OR name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1"
    } else {
        ""
    };

    let total: i64 = match &pattern {
        Some(pattern) => {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM easypay_clients {filter}"))
                .bind(pattern)
                .fetch_one(pool.inner())
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM easypay_clients")
                .fetch_one(pool.inner())
                .await?
        }
    };

    // Sort column and direction come from whitelisted enums.
    let (limit_arg, offset_arg) = if pattern.is_some() { (2, 3) } else { (1, 2) };
    let query = format!(
        "SELECT {CLIENT_COLUMNS} FROM easypay_clients {filter}
         ORDER BY {} {}, id ASC
         LIMIT ${limit_arg} OFFSET ${offset_arg}",
        params.sort_column(),
        params.sort_order(),
    );

    let meta = PageMetadata::new(page, size, total);
    let mut list_query = sqlx::query_as::<_, EasyPayClient>(&query);
    if let Some(pattern) = &pattern {
        list_query = list_query.bind(pattern);
    }
    let clients = list_query
        .bind(meta.size)
        .bind(meta.offset())
        .fetch_all(pool.inner())
        .await?;

    Ok(Json(PaginatedResponse {
        data: clients,
        page: meta,
    }))
}

/// Get a single client by its external identifier
#[openapi(tag = "EasyPay Clients")]
#[get("/easypay/clients/<client_id>")]
pub async fn get_client(
    pool: &State<PgPool>,
    client_id: String,
) -> Result<Json<DataResponse<EasyPayClient>>, ApiError> {
    let client = fetch_client(pool.inner(), &client_id).await?;
    Ok(Json(DataResponse { data: client }))
}

/// Create a client from a record payload
#[openapi(tag = "EasyPay Clients")]
#[post("/easypay/clients", data = "<record>")]
pub async fn create_client(
    pool: &State<PgPool>,
    record: Json<ImportRecord>,
) -> Result<Created<Json<DataResponse<EasyPayClient>>>, ApiError> {
    let record = record.into_inner();
    let client_id = record
        .key()
        .ok_or_else(|| ApiError::BadRequest("clientId is required".to_string()))?
        .to_string();

    PgRecordStore::new(pool.inner().clone()).insert(&record).await?;
    log::info!("created easypay client {}", client_id);

    let client = fetch_client(pool.inner(), &client_id).await?;
    Ok(Created::new(format!("/api/v1/easypay/clients/{client_id}"))
        .body(Json(DataResponse { data: client })))
}

/// Replace every attribute of an existing client
#[openapi(tag = "EasyPay Clients")]
#[put("/easypay/clients/<client_id>", data = "<record>")]
pub async fn update_client(
    pool: &State<PgPool>,
    client_id: String,
    record: Json<ImportRecord>,
) -> Result<Json<DataResponse<EasyPayClient>>, ApiError> {
    PgRecordStore::new(pool.inner().clone())
        .update(&client_id, &record)
        .await?;

    let client = fetch_client(pool.inner(), &client_id).await?;
    Ok(Json(DataResponse { data: client }))
}

/// Delete a client by its external identifier
#[openapi(tag = "EasyPay Clients")]
#[delete("/easypay/clients/<client_id>")]
pub async fn delete_client(
    pool: &State<PgPool>,
    client_id: String,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = PgRecordStore::new(pool.inner().clone())
        .delete(&client_id)
        .await?;

    if !removed {
        return Err(ApiError::NotFound(format!("Client '{client_id}' not found")));
    }

    log::info!("deleted easypay client {}", client_id);
    Ok(Json(MessageResponse::new(format!("Client '{client_id}' deleted"))))
}
