//! Setting storage.
//!
//! [`SettingStore`] is the seam between registration logic and the durable
//! key-value store. Implementations must make [`SettingStore::put_if_absent`]
//! a single atomic check-and-insert: of any number of concurrent calls for
//! one key, at most one succeeds and every other call observes
//! [`StoreError::ConditionalCheckFailed`].

mod dynamodb;
mod memory;

use std::error::Error as StdError;

use async_trait::async_trait;
use thiserror::Error;

use apireg_model::{SettingKey, SettingRecord};

pub use dynamodb::DynamoDbSettingStore;
pub use memory::MemorySettingStore;

/// Boxed error carried as the cause of a store failure.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same key already exists. Nothing was written.
    #[error("conditional check failed: record {0} already exists")]
    ConditionalCheckFailed(SettingKey),

    /// Transient failure (timeout, throttling, connectivity). Nothing was
    /// written, or the write is indistinguishable from one that was not.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
        /// The underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// Any other failure, including records that cannot be decoded.
    #[error("store error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
        /// The underlying cause.
        #[source]
        source: Option<BoxError>,
    },
}

impl StoreError {
    /// Transient failure with a cause.
    pub fn unavailable(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Non-transient failure with a cause.
    pub fn internal(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Non-transient failure without a separate cause.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// Durable store of setting records keyed by [`SettingKey`].
#[async_trait]
pub trait SettingStore: Send + Sync + std::fmt::Debug {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Insert `record` only if no record with the same key exists.
    async fn put_if_absent(&self, record: SettingRecord) -> Result<(), StoreError>;

    /// All records whose partition key belongs to `setting_id`, ordered by
    /// sort key.
    async fn query_setting(&self, setting_id: &str) -> Result<Vec<SettingRecord>, StoreError>;
}
