//! HTTP route handlers grouped by resource domain.
//!
//! Every handler is annotated with `#[openapi]` so `rocket_okapi` can derive
//! the OpenAPI document served alongside the API.

pub mod clients;
pub mod health;
pub mod import;
pub mod params;
