//! Query parameter helpers for the client listing endpoint.
//!
//! The types follow Rocket's `FromForm` conventions and derive `JsonSchema` so
//! generated documentation reflects the available parameters and their defaults.

use rocket::form::{self, FromFormField, ValueField};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

const fn default_page() -> i64 {
    1
}

const fn default_page_size() -> i64 {
    50
}

pub const MAX_PAGE_SIZE: i64 = 100;

fn default_sort_order() -> SortOrder {
    SortOrder::Desc
}

fn default_client_sort_field() -> ClientSortField {
    ClientSortField::CreatedAt
}

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql_keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl<'r> FromFormField<'r> for SortOrder {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        match field.value.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(form::Error::validation(format!(
                "invalid sort order '{other}'; expected 'asc' or 'desc'"
            ))
            .into()),
        }
    }
}

/// Sort keys supported by the client listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ClientSortField {
    ClientId,
    Name,
    Email,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl ClientSortField {
    /// Name of the column used when ordering query results.
    pub fn sql_column(self) -> &'static str {
        match self {
            ClientSortField::ClientId => "client_id",
            ClientSortField::Name => "name",
            ClientSortField::Email => "email",
            ClientSortField::CreatedAt => "created_at",
            ClientSortField::UpdatedAt => "updated_at",
        }
    }
}

impl<'r> FromFormField<'r> for ClientSortField {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        match field.value {
            "clientId" => Ok(ClientSortField::ClientId),
            "name" => Ok(ClientSortField::Name),
            "email" => Ok(ClientSortField::Email),
            "createdAt" => Ok(ClientSortField::CreatedAt),
            "updatedAt" => Ok(ClientSortField::UpdatedAt),
            other => {
                Err(form::Error::validation(format!("invalid client sort key '{other}'")).into())
            }
        }
    }
}

/// Query parameters accepted by the client listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, rocket::form::FromForm, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientListParams {
    /// Optional search term matched against client id, name, email and phone.
    #[serde(default)]
    pub q: Option<String>,
    /// Page of results to fetch (defaults to 1).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Page size (defaults to 50, maximum 100).
    #[field(default = 50)]
    #[serde(default = "default_page_size")]
    pub size: i64,
    /// Sort column (defaults to `createdAt`).
    #[field(name = "sortBy", default = ClientSortField::CreatedAt)]
    #[serde(default = "default_client_sort_field")]
    pub sort_by: ClientSortField,
    /// Sort direction (defaults to `desc`).
    #[field(default = SortOrder::Desc)]
    #[serde(default = "default_sort_order")]
    pub order: SortOrder,
}

impl Default for ClientListParams {
    fn default() -> Self {
        Self {
            q: None,
            page: default_page(),
            size: default_page_size(),
            sort_by: default_client_sort_field(),
            order: default_sort_order(),
        }
    }
}

impl ClientListParams {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn size(&self) -> i64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn sort_column(&self) -> &'static str {
        self.sort_by.sql_column()
    }

    pub fn sort_order(&self) -> &'static str {
        self.order.sql_keyword()
    }

    /// Trimmed search term wrapped as an `ILIKE` pattern, or `None` when blank.
    pub fn search_pattern(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| format!("%{value}%"))
    }
}
