use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

// ===== EasyPay Client Models =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EasyPayClient {
    pub id: i32,
    pub client_id: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_resident: Option<String>,
    pub is_identified: Option<String>,
    pub is_verified: Option<String>,
    pub is_blocked: Option<String>,
    pub birth_date: Option<String>,
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub document_issue_date: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub registration_date: Option<String>,
    pub registration_source: Option<String>,
    pub last_activity_date: Option<String>,
    pub partner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ===== Response Envelopes =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub page: i64,
    pub size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl PageMetadata {
    /// `total_pages` is `ceil(total_items / size)`; an empty result has 0 pages.
    pub fn new(page: i64, size: i64, total_items: i64) -> Self {
        let size = size.max(1);
        let total_items = total_items.max(0);
        Self {
            page,
            size,
            total_items,
            total_pages: (total_items + size - 1) / size,
        }
    }

    /// Row offset of the first item on this page, saturating at `i64::MAX`.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: PageMetadata,
}

/// Simple message wrapper for acknowledgement responses.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
