//! Admin endpoints driving the EasyPay client importer.

use crate::error::ApiError;
use crate::import::{ClientImporter, ImportOptions, ImportRecord, ImportStats, ImportStatus};
use crate::models::MessageResponse;
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

/// Inline dataset submitted with its own options.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImportRecordsRequest {
    #[serde(default)]
    pub options: ImportOptions,
    pub records: Vec<ImportRecord>,
}

/// Import every client from the configured source file
#[openapi(tag = "Import")]
#[post("/admin/import/easypay", data = "<options>")]
pub async fn import_easypay(
    importer: &State<ClientImporter>,
    options: Json<ImportOptions>,
) -> Result<Json<ImportStats>, ApiError> {
    let options = options.into_inner();
    log::info!(
        "easypay import requested from {}",
        importer.config().source_path.display()
    );

    let stats = importer.import_all(options).await?;
    Ok(Json(stats))
}

/// Import records supplied in the request body
#[openapi(tag = "Import")]
#[post("/admin/import/easypay/records", data = "<request>")]
pub async fn import_easypay_records(
    importer: &State<ClientImporter>,
    request: Json<ImportRecordsRequest>,
) -> Result<Json<ImportStats>, ApiError> {
    let ImportRecordsRequest { options, records } = request.into_inner();
    let stats = importer.import_records(records, options).await?;
    Ok(Json(stats))
}

/// Counters of the current or most recent import
#[openapi(tag = "Import")]
#[get("/admin/import/easypay/stats")]
pub fn get_import_stats(importer: &State<ClientImporter>) -> Json<ImportStats> {
    Json(importer.stats())
}

#[openapi(tag = "Import")]
#[post("/admin/import/easypay/stats/reset")]
pub fn reset_import_stats(
    importer: &State<ClientImporter>,
) -> Result<Json<MessageResponse>, ApiError> {
    importer.reset_stats()?;
    Ok(Json(MessageResponse::new("Import statistics reset")))
}

/// Phase and batch progress of the current or most recent import
#[openapi(tag = "Import")]
#[get("/admin/import/easypay/status")]
pub fn get_import_status(importer: &State<ClientImporter>) -> Json<ImportStatus> {
    Json(importer.status())
}

/// Stop the running import at the next batch boundary
#[openapi(tag = "Import")]
#[post("/admin/import/easypay/cancel")]
pub fn cancel_import(importer: &State<ClientImporter>) -> Json<MessageResponse> {
    let message = if importer.cancel() {
        "Import cancellation requested"
    } else {
        "No import is running"
    };
    Json(MessageResponse::new(message))
}
