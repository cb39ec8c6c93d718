//! Setting entity and its persisted projection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Connection details for the external API a setting points at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDetails {
    /// Root URL of the external API.
    pub base_url: String,
    /// Authentication scheme, e.g. `"apiKey"` or `"bearer"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    /// Credential used with `auth_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Extra headers sent with every call to the external API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_headers: Option<BTreeMap<String, String>>,
}

impl ApiDetails {
    /// Placeholder written in place of a stored API key on read paths.
    pub const REDACTED: &str = "****";

    /// Returns a copy with the API key replaced by [`Self::REDACTED`].
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| Self::REDACTED.to_owned()),
            ..self.clone()
        }
    }
}

/// A validated registration request.
///
/// Values of this type only come out of request validation, so the required
/// string fields are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    /// Caller-supplied identifier of the integration target.
    pub setting_id: String,
    /// External API connection details.
    pub api_details: ApiDetails,
    /// Free-form string parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, String>>,
    /// Human-readable description.
    pub description: String,
}

/// Persisted projection of a [`Setting`].
///
/// `settingId` and `baseUrl` live in the composite key; everything else is
/// carried as record attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingRecord {
    /// Composite primary key.
    pub key: crate::SettingKey,
    /// External API connection details.
    pub api_details: ApiDetails,
    /// Free-form string parameters.
    pub parameters: Option<BTreeMap<String, String>>,
    /// Human-readable description.
    pub description: String,
    /// Creation timestamp, set once on insert.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl SettingRecord {
    /// Build the record to insert for a validated setting.
    #[must_use]
    pub fn new(setting: Setting, created_at: chrono::DateTime<chrono::Utc>) -> Self {
        let key = crate::SettingKey::derive(&setting);
        Self {
            key,
            api_details: setting.api_details,
            parameters: setting.parameters,
            description: setting.description,
            created_at,
        }
    }
}
