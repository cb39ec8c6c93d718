//! Integration tests for the Apireg server.
//!
//! The `test_settings` tests require a running Apireg server at
//! `localhost:8080`. The `test_dynamodb_store` tests require a
//! DynamoDB-compatible endpoint at `localhost:4566`. All tests are marked
//! `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p apireg-integration -- --ignored
//! ```

use std::sync::Once;

use aws_credential_types::Credentials;
use aws_sdk_dynamodb::config::{BehaviorVersion, Region};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Base URL of the Apireg server.
#[must_use]
pub fn server_url() -> String {
    std::env::var("APIREG_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Endpoint URL of the DynamoDB-compatible store.
#[must_use]
pub fn dynamodb_endpoint_url() -> String {
    std::env::var("DYNAMODB_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Create an HTTP client for the Apireg server.
#[must_use]
pub fn http_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Create a configured DynamoDB client pointing at the local endpoint.
#[must_use]
pub fn dynamodb_client() -> aws_sdk_dynamodb::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_dynamodb::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(dynamodb_endpoint_url())
        .build();

    aws_sdk_dynamodb::Client::from_conf(config)
}

/// Generate a unique setting id for a test.
#[must_use]
pub fn test_setting_id(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Generate a unique table name for a DynamoDB test.
#[must_use]
pub fn test_table_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// A complete registration body.
#[must_use]
pub fn setting_body(setting_id: &str, base_url: &str) -> serde_json::Value {
    serde_json::json!({
        "settingId": setting_id,
        "apiDetails": {
            "baseUrl": base_url,
            "authType": "apiKey",
            "apiKey": "integration-secret"
        },
        "parameters": {"region": "eu"},
        "description": "integration test setting"
    })
}

mod test_dynamodb_store;
mod test_settings;
