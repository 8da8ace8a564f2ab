//! Service health endpoint used for readiness checks and tests.

use crate::import::{ClientImporter, ImportPhase};
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Static status string reporting application readiness.
    pub status: String,
    /// Phase of the most recent client import.
    pub import_phase: ImportPhase,
}

/// Health check reporting readiness and the importer's current phase.
#[openapi(tag = "Health")]
#[get("/health")]
pub fn health_check(importer: &State<ClientImporter>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        import_phase: importer.status().phase,
    })
}
