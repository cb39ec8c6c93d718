//! Request validation.
//!
//! Validation runs in two stages. [`decode_body`] turns the raw bytes into a
//! loosely-typed JSON object without trusting its shape, then
//! [`validate_setting`] checks required fields and optional field shapes and
//! produces a typed [`Setting`]. Any failure rejects the whole request.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use apireg_model::error::ApiRegError;
use apireg_model::key::{MAX_BASE_URL_BYTES, MAX_SETTING_ID_BYTES};
use apireg_model::types::{ApiDetails, Setting};

/// Decode a request body into a JSON object.
///
/// An empty body decodes to an empty object, so it fails later with every
/// required field reported missing.
pub fn decode_body(body: &[u8]) -> Result<Map<String, Value>, ApiRegError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiRegError::validation("Request body must be a JSON object")),
        Err(e) => Err(ApiRegError::validation(format!("Malformed request body: {e}"))),
    }
}

/// Validate a decoded payload into a [`Setting`].
pub fn validate_setting(payload: &Map<String, Value>) -> Result<Setting, ApiRegError> {
    let mut missing = Vec::new();

    let setting_id = required_string(payload, "settingId", "settingId", &mut missing)?;

    let api_details = match payload.get("apiDetails") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => return Err(wrong_type("apiDetails", "an object")),
    };
    let base_url = match api_details {
        Some(map) => required_string(map, "baseUrl", "apiDetails.baseUrl", &mut missing)?,
        None => {
            missing.push("apiDetails.baseUrl");
            None
        }
    };

    let description = required_string(payload, "description", "description", &mut missing)?;

    let (Some(setting_id), Some(base_url), Some(description)) = (setting_id, base_url, description)
    else {
        return Err(ApiRegError::missing_fields(&missing));
    };
    check_key_length(&setting_id, "settingId", MAX_SETTING_ID_BYTES)?;
    check_key_length(&base_url, "apiDetails.baseUrl", MAX_BASE_URL_BYTES)?;

    let (auth_type, api_key, additional_headers) = match api_details {
        Some(map) => (
            optional_string(map, "authType", "apiDetails.authType")?,
            optional_string(map, "apiKey", "apiDetails.apiKey")?,
            optional_string_map(map, "additionalHeaders", "apiDetails.additionalHeaders")?,
        ),
        None => (None, None, None),
    };

    Ok(Setting {
        setting_id,
        api_details: ApiDetails {
            base_url,
            auth_type,
            api_key,
            additional_headers,
        },
        parameters: optional_string_map(payload, "parameters", "parameters")?,
        description,
    })
}

/// Decode and validate a raw request body.
pub fn validate_request(body: &[u8]) -> Result<Setting, ApiRegError> {
    let payload = decode_body(body)?;
    validate_setting(&payload)
}

/// A required string counts as missing when absent, null, or empty.
fn required_string(
    map: &Map<String, Value>,
    field: &str,
    path: &'static str,
    missing: &mut Vec<&'static str>,
) -> Result<Option<String>, ApiRegError> {
    match map.get(field) {
        None | Some(Value::Null) => {
            missing.push(path);
            Ok(None)
        }
        Some(Value::String(s)) if s.is_empty() => {
            missing.push(path);
            Ok(None)
        }
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(wrong_type(path, "a string")),
    }
}

fn optional_string(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Option<String>, ApiRegError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(wrong_type(path, "a string")),
    }
}

fn optional_string_map(
    map: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<Option<BTreeMap<String, String>>, ApiRegError> {
    let entries = match map.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(entries)) => entries,
        Some(_) => return Err(wrong_type(path, "an object of strings")),
    };

    entries
        .iter()
        .map(|(k, v)| match v {
            Value::String(s) => Ok((k.clone(), s.clone())),
            _ => Err(wrong_type(&format!("{path}.{k}"), "a string")),
        })
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map(Some)
}

/// Key fields must fit the table's key attribute limits once prefixed.
fn check_key_length(value: &str, path: &str, max: usize) -> Result<(), ApiRegError> {
    if value.len() > max {
        return Err(ApiRegError::validation(format!(
            "Field {path} must be at most {max} bytes"
        )));
    }
    Ok(())
}

fn wrong_type(path: &str, expected: &str) -> ApiRegError {
    ApiRegError::validation(format!("Field {path} must be {expected}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apireg_model::error::ApiRegErrorCode;

    fn validate(json: &str) -> Result<Setting, ApiRegError> {
        validate_request(json.as_bytes())
    }

    #[test]
    fn test_should_accept_minimal_setting() {
        let setting = validate(
            r#"{"settingId":"s1","apiDetails":{"baseUrl":"https://api.example.com"},"description":"demo"}"#,
        )
        .unwrap();
        assert_eq!(setting.setting_id, "s1");
        assert_eq!(setting.api_details.base_url, "https://api.example.com");
        assert_eq!(setting.description, "demo");
        assert_eq!(setting.parameters, None);
    }

    #[test]
    fn test_should_accept_full_setting() {
        let setting = validate(
            r#"{
                "settingId": "weather",
                "apiDetails": {
                    "baseUrl": "https://weather.example.com",
                    "authType": "apiKey",
                    "apiKey": "k-123",
                    "additionalHeaders": {"X-Client": "apireg"}
                },
                "parameters": {"units": "metric"},
                "description": "Weather provider"
            }"#,
        )
        .unwrap();
        assert_eq!(setting.api_details.auth_type.as_deref(), Some("apiKey"));
        assert_eq!(setting.api_details.api_key.as_deref(), Some("k-123"));
        assert_eq!(
            setting
                .api_details
                .additional_headers
                .as_ref()
                .and_then(|h| h.get("X-Client"))
                .map(String::as_str),
            Some("apireg")
        );
        assert_eq!(
            setting
                .parameters
                .as_ref()
                .and_then(|p| p.get("units"))
                .map(String::as_str),
            Some("metric")
        );
    }

    #[test]
    fn test_should_report_missing_base_url() {
        let err = validate(r#"{"settingId":"s1","description":"demo"}"#).unwrap_err();
        assert_eq!(err.code, ApiRegErrorCode::ValidationError);
        assert_eq!(err.message, "Missing required fields: apiDetails.baseUrl");
    }

    #[test]
    fn test_should_report_every_missing_field() {
        let err = validate("{}").unwrap_err();
        assert_eq!(
            err.message,
            "Missing required fields: settingId, apiDetails.baseUrl, description"
        );
    }

    #[test]
    fn test_should_treat_empty_body_as_empty_object() {
        let err = validate_request(b"").unwrap_err();
        assert_eq!(err.code, ApiRegErrorCode::ValidationError);
        assert!(err.message.starts_with("Missing required fields"));
    }

    #[test]
    fn test_should_treat_empty_and_null_strings_as_missing() {
        let err = validate(
            r#"{"settingId":"","apiDetails":{"baseUrl":null},"description":"demo"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err.message,
            "Missing required fields: settingId, apiDetails.baseUrl"
        );
    }

    #[test]
    fn test_should_reject_malformed_json() {
        let err = validate(r#"{"settingId":"#).unwrap_err();
        assert_eq!(err.code, ApiRegErrorCode::ValidationError);
        assert!(err.message.starts_with("Malformed request body"));
    }

    #[test]
    fn test_should_reject_non_object_payload() {
        for body in ["[]", "\"text\"", "42", "null"] {
            let err = validate(body).unwrap_err();
            assert_eq!(err.message, "Request body must be a JSON object", "body: {body}");
        }
    }

    #[test]
    fn test_should_reject_wrong_field_types() {
        let cases = [
            (
                r#"{"settingId":7,"apiDetails":{"baseUrl":"u"},"description":"d"}"#,
                "Field settingId must be a string",
            ),
            (
                r#"{"settingId":"s","apiDetails":"u","description":"d"}"#,
                "Field apiDetails must be an object",
            ),
            (
                r#"{"settingId":"s","apiDetails":{"baseUrl":"u","apiKey":1},"description":"d"}"#,
                "Field apiDetails.apiKey must be a string",
            ),
            (
                r#"{"settingId":"s","apiDetails":{"baseUrl":"u"},"parameters":{"a":1},"description":"d"}"#,
                "Field parameters.a must be a string",
            ),
            (
                r#"{"settingId":"s","apiDetails":{"baseUrl":"u","additionalHeaders":[]},"description":"d"}"#,
                "Field apiDetails.additionalHeaders must be an object of strings",
            ),
        ];
        for (body, message) in cases {
            let err = validate(body).unwrap_err();
            assert_eq!(err.message, message, "body: {body}");
        }
    }

    fn body_with(setting_id: &str, base_url: &str) -> String {
        serde_json::json!({
            "settingId": setting_id,
            "apiDetails": {"baseUrl": base_url},
            "description": "d",
        })
        .to_string()
    }

    #[test]
    fn test_should_reject_key_fields_over_table_limits() {
        let long_id = "s".repeat(MAX_SETTING_ID_BYTES + 1);
        let err = validate(&body_with(&long_id, "https://a")).unwrap_err();
        assert_eq!(err.code, ApiRegErrorCode::ValidationError);
        assert_eq!(err.message, "Field settingId must be at most 2038 bytes");

        let long_url = format!("https://{}", "a".repeat(MAX_BASE_URL_BYTES));
        let err = validate(&body_with("s1", &long_url)).unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(
            err.message,
            "Field apiDetails.baseUrl must be at most 1016 bytes"
        );
    }

    #[test]
    fn test_should_accept_key_fields_at_table_limits() {
        let id = "s".repeat(MAX_SETTING_ID_BYTES);
        let url = "u".repeat(MAX_BASE_URL_BYTES);
        let setting = validate(&body_with(&id, &url)).unwrap();
        let key = apireg_model::SettingKey::derive(&setting);
        assert_eq!(key.partition_key().len(), 2048);
        assert_eq!(key.sort_key().len(), 1024);
    }

    #[test]
    fn test_should_count_key_limits_in_bytes() {
        // 3 bytes per char in UTF-8
        let id = "\u{20ac}".repeat(MAX_SETTING_ID_BYTES / 3 + 1);
        assert!(id.chars().count() < MAX_SETTING_ID_BYTES);
        let err = validate(&body_with(&id, "https://a")).unwrap_err();
        assert_eq!(err.code, ApiRegErrorCode::ValidationError);
    }

    #[test]
    fn test_should_ignore_unknown_fields() {
        let setting = validate(
            r#"{"settingId":"s1","apiDetails":{"baseUrl":"u"},"description":"d","extra":true}"#,
        )
        .unwrap();
        assert_eq!(setting.setting_id, "s1");
    }
}
