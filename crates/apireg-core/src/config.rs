//! Registry configuration.
//!
//! All configuration is driven by environment variables. Unset variables fall
//! back to the defaults below; set but unparsable values are rejected.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
//! | `LOG_LEVEL` | `info` |
//! | `LOG_FORMAT` | `text` |
//! | `SETTINGS_STORE` | `memory` |
//! | `SETTINGS_TABLE` (or `DYNAMODB`) | `settings` |
//! | `SETTINGS_CREATE_TABLE` | `false` |
//! | `DEFAULT_REGION` | `us-east-1` |
//! | `DYNAMODB_ENDPOINT_URL` | *(unset)* |
//! | `STORE_MAX_ATTEMPTS` | `10` |
//! | `STORE_TIMEOUT_MS` | `5000` |
//! | `MAX_BODY_BYTES` | `1048576` |

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use typed_builder::TypedBuilder;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set to a value that cannot be used.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Which [`SettingStore`](crate::store::SettingStore) backs the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local [`MemorySettingStore`](crate::store::MemorySettingStore).
    #[default]
    Memory,
    /// Amazon DynamoDB (or a compatible endpoint).
    DynamoDb,
}

impl StoreBackend {
    /// Backend name as used in configuration and health output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::DynamoDb => "dynamodb",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "dynamodb" => Ok(Self::DynamoDb),
            _ => Err("expected \"memory\" or \"dynamodb\"".to_owned()),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err("expected \"text\" or \"json\"".to_owned()),
        }
    }
}

/// Registry service configuration.
///
/// # Examples
///
/// ```
/// use apireg_core::config::{ApiRegConfig, StoreBackend};
///
/// let config = ApiRegConfig::builder()
///     .store(StoreBackend::DynamoDb)
///     .table_name("settings-dev".to_owned())
///     .build();
/// assert_eq!(config.gateway_listen, "0.0.0.0:8080");
/// assert_eq!(config.store_max_attempts, 10);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct ApiRegConfig {
    /// Bind address for the HTTP server.
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Log output format.
    #[builder(default)]
    pub log_format: LogFormat,

    /// Store implementation to construct at startup.
    #[builder(default)]
    pub store: StoreBackend,

    /// DynamoDB table holding setting records.
    #[builder(default = String::from("settings"))]
    pub table_name: String,

    /// Create the DynamoDB table on startup when it does not exist.
    #[builder(default = false)]
    pub create_table: bool,

    /// AWS region for the DynamoDB client.
    #[builder(default = String::from("us-east-1"))]
    pub default_region: String,

    /// Custom DynamoDB endpoint, e.g. a local emulator.
    #[builder(default, setter(strip_option))]
    pub dynamodb_endpoint_url: Option<String>,

    /// Total attempts per store call, including the first.
    #[builder(default = 10)]
    pub store_max_attempts: u32,

    /// Upper bound on a single store operation including retries.
    #[builder(default = Duration::from_millis(5_000))]
    pub store_timeout: Duration,

    /// Largest accepted request body in bytes.
    #[builder(default = 1024 * 1024)]
    pub max_body_bytes: usize,
}

impl Default for ApiRegConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ApiRegConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            config.log_format = parse("LOG_FORMAT", v)?;
        }
        if let Some(v) = lookup("SETTINGS_STORE") {
            config.store = parse("SETTINGS_STORE", v)?;
        }
        let table = lookup("SETTINGS_TABLE")
            .map(|v| ("SETTINGS_TABLE", v))
            .or_else(|| lookup("DYNAMODB").map(|v| ("DYNAMODB", v)));
        if let Some((key, v)) = table {
            if v.is_empty() {
                return Err(invalid(key, v, "table name must not be empty"));
            }
            config.table_name = v;
        }
        if let Some(v) = lookup("SETTINGS_CREATE_TABLE") {
            config.create_table = parse_bool("SETTINGS_CREATE_TABLE", v)?;
        }
        if let Some(v) = lookup("DEFAULT_REGION") {
            config.default_region = v;
        }
        if let Some(v) = lookup("DYNAMODB_ENDPOINT_URL") {
            if !v.is_empty() {
                config.dynamodb_endpoint_url = Some(v);
            }
        }
        if let Some(v) = lookup("STORE_MAX_ATTEMPTS") {
            let attempts: u32 = parse("STORE_MAX_ATTEMPTS", v.clone())?;
            if attempts == 0 {
                return Err(invalid("STORE_MAX_ATTEMPTS", v, "must be at least 1"));
            }
            config.store_max_attempts = attempts;
        }
        if let Some(v) = lookup("STORE_TIMEOUT_MS") {
            let millis: u64 = parse("STORE_TIMEOUT_MS", v.clone())?;
            if millis == 0 {
                return Err(invalid("STORE_TIMEOUT_MS", v, "must be at least 1"));
            }
            config.store_timeout = Duration::from_millis(millis);
        }
        if let Some(v) = lookup("MAX_BODY_BYTES") {
            config.max_body_bytes = parse("MAX_BODY_BYTES", v)?;
        }

        Ok(config)
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| {
        let reason = e.to_string();
        invalid(key, value, reason)
    })
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

fn invalid(key: &'static str, value: String, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value,
        reason: reason.into(),
    }
}
