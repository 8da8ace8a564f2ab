//! Source row describing one EasyPay client.
//!
//! Every attribute is carried as text. Spreadsheet-derived JSON often stores
//! identifiers and flags as numbers or booleans, so those are converted to their
//! string form on the way in. Absent, `null` and whitespace-only values all
//! deserialize to `None`.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One client row from the import source.
///
/// `client_id` is the natural key: two records describe the same client iff their
/// keys are byte-for-byte equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    /// External client identifier (required for import).
    #[serde(default, deserialize_with = "text_field")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub last_name: Option<String>,
    /// Required by the target table, not checked by the importer.
    #[serde(default, deserialize_with = "text_field")]
    pub email: Option<String>,
    /// Required by the target table, not checked by the importer.
    #[serde(default, deserialize_with = "text_field")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub is_resident: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub is_identified: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub is_verified: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub is_blocked: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub document_type: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub document_number: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub document_issue_date: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub registration_date: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub registration_source: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub last_activity_date: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub partner: Option<String>,
}

impl ImportRecord {
    /// Build a record with only the key set.
    pub fn with_key(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Default::default()
        }
    }

    /// The natural key, or `None` when it is absent or blank.
    pub fn key(&self) -> Option<&str> {
        self.client_id
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }

    /// Email address when present and non-blank.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|value| !value.trim().is_empty())
    }
}

fn text_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_text))
}

fn value_to_text(value: Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(text) => text,
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_scalar_values_to_text() {
        let record: ImportRecord = serde_json::from_value(json!({
            "clientId": 100234,
            "email": "client@example.com",
            "isResident": true,
            "phone": "  ",
            "city": null
        }))
        .expect("record deserializes");

        assert_eq!(record.key(), Some("100234"));
        assert_eq!(record.is_resident.as_deref(), Some("true"));
        assert_eq!(record.phone, None);
        assert_eq!(record.city, None);
        assert_eq!(record.email(), Some("client@example.com"));
    }

    #[test]
    fn keeps_non_blank_values_verbatim() {
        let record: ImportRecord =
            serde_json::from_value(json!({ "clientId": " Ab-1 ", "name": "Ann" }))
                .expect("record deserializes");

        assert_eq!(record.key(), Some(" Ab-1 "));
        assert_eq!(record.name.as_deref(), Some("Ann"));
    }

    #[test]
    fn missing_key_is_none() {
        let record: ImportRecord =
            serde_json::from_value(json!({ "name": "No Key" })).expect("record deserializes");
        assert_eq!(record.key(), None);

        let blank = ImportRecord::with_key("   ");
        assert_eq!(blank.key(), None);
    }
}
