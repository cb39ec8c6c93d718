//! In-memory setting store.
//!
//! Records are partitioned by `PK` in a [`DashMap`], with each partition a
//! [`BTreeMap`] keyed by `SK`:
//!
//! ```text
//! DashMap<PK, BTreeMap<SK, SettingRecord>>
//! ```
//!
//! The existence check and insert for a key both run under the partition's
//! shard write lock, which makes [`SettingStore::put_if_absent`] atomic.
//! Writes to different partitions only contend when they hash to the same
//! shard.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use apireg_model::key::partition_key_for;
use apireg_model::{SettingKey, SettingRecord};

use super::{SettingStore, StoreError};

/// Process-local [`SettingStore`].
#[derive(Debug, Default)]
pub struct MemorySettingStore {
    /// PK -> records ordered by SK.
    data: DashMap<String, BTreeMap<String, SettingRecord>>,
    /// Total number of records.
    item_count: AtomicU64,
}

impl MemorySettingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.item_count.load(Ordering::Relaxed)
    }

    /// Fetch a single record by key.
    #[must_use]
    pub fn get(&self, key: &SettingKey) -> Option<SettingRecord> {
        self.data
            .get(key.partition_key())
            .and_then(|partition| partition.get(key.sort_key()).cloned())
    }

    /// Check-and-insert under the partition lock.
    fn insert_if_absent(&self, record: SettingRecord) -> Result<(), StoreError> {
        let mut partition = self
            .data
            .entry(record.key.partition_key().to_owned())
            .or_default();

        match partition.entry(record.key.sort_key().to_owned()) {
            Entry::Occupied(_) => Err(StoreError::ConditionalCheckFailed(record.key)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                self.item_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl SettingStore for MemorySettingStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn put_if_absent(&self, record: SettingRecord) -> Result<(), StoreError> {
        let key = record.key.clone();
        let result = self.insert_if_absent(record);
        debug!(%key, inserted = result.is_ok(), "conditional put");
        result
    }

    async fn query_setting(&self, setting_id: &str) -> Result<Vec<SettingRecord>, StoreError> {
        Ok(self
            .data
            .get(&partition_key_for(setting_id))
            .map(|partition| partition.values().cloned().collect())
            .unwrap_or_default())
    }
}
