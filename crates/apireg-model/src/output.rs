//! Response payloads.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{ApiDetails, SettingRecord};

/// Message returned on a successful create.
pub const SETTING_CREATED: &str = "Setting created successfully";

/// The `{ "message": ... }` envelope used by every non-read response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageOutput {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageOutput {
    /// Wrap a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Output of `CreateSetting`.
pub type CreateSettingOutput = MessageOutput;

/// One stored record as returned by `GetSetting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingItem {
    /// Base URL recovered from the sort key.
    pub base_url: String,
    /// Connection details with the API key redacted.
    pub api_details: ApiDetails,
    /// Free-form string parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, String>>,
    /// Human-readable description.
    pub description: String,
    /// RFC 3339 creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&SettingRecord> for SettingItem {
    fn from(record: &SettingRecord) -> Self {
        Self {
            base_url: record.key.base_url().to_owned(),
            api_details: record.api_details.redacted(),
            parameters: record.parameters.clone(),
            description: record.description.clone(),
            created_at: record.created_at,
        }
    }
}

/// Output of `GetSetting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSettingOutput {
    /// The requested setting id.
    pub setting_id: String,
    /// Records ordered by base URL.
    pub items: Vec<SettingItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettingKey;

    #[test]
    fn test_should_serialize_message_envelope() {
        let json = serde_json::to_string(&MessageOutput::new(SETTING_CREATED)).unwrap();
        assert_eq!(json, r#"{"message":"Setting created successfully"}"#);
    }

    #[test]
    fn test_should_redact_key_in_setting_item() {
        let record = SettingRecord {
            key: SettingKey::from_parts("s1", "https://api.example.com"),
            api_details: ApiDetails {
                base_url: "https://api.example.com".to_owned(),
                api_key: Some("secret".to_owned()),
                ..Default::default()
            },
            parameters: None,
            description: "demo".to_owned(),
            created_at: chrono::Utc::now(),
        };

        let item = SettingItem::from(&record);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["baseUrl"], "https://api.example.com");
        assert_eq!(json["apiDetails"]["apiKey"], "****");
        assert!(json.get("parameters").is_none());
        assert!(json["createdAt"].is_string());
    }
}
