//! Composite store key derivation.
//!
//! Every stored setting is addressed by a partition key built from its
//! `settingId` and a sort key built from its `baseUrl`:
//!
//! ```text
//! PK = "SettingId#" + settingId
//! SK = "BaseUrl#"   + baseUrl
//! ```
//!
//! Each attribute carries exactly one field behind a fixed prefix, so a `#`
//! inside either field cannot make two distinct pairs collide and no
//! escaping is applied.

use std::fmt;

use crate::types::Setting;

/// Prefix of the partition key attribute.
pub const PARTITION_KEY_PREFIX: &str = "SettingId#";

/// Prefix of the sort key attribute.
pub const SORT_KEY_PREFIX: &str = "BaseUrl#";

/// Name of the partition key attribute in the table.
pub const PARTITION_KEY_ATTR: &str = "PK";

/// Name of the sort key attribute in the table.
pub const SORT_KEY_ATTR: &str = "SK";

/// Largest partition key the table accepts, in UTF-8 bytes.
pub const MAX_PARTITION_KEY_BYTES: usize = 2048;

/// Largest sort key the table accepts, in UTF-8 bytes.
pub const MAX_SORT_KEY_BYTES: usize = 1024;

/// Longest `settingId` whose partition key still fits.
pub const MAX_SETTING_ID_BYTES: usize = MAX_PARTITION_KEY_BYTES - PARTITION_KEY_PREFIX.len();

/// Longest `baseUrl` whose sort key still fits.
pub const MAX_BASE_URL_BYTES: usize = MAX_SORT_KEY_BYTES - SORT_KEY_PREFIX.len();

/// The `(PK, SK)` pair uniquely identifying a stored setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SettingKey {
    pk: String,
    sk: String,
}

impl SettingKey {
    /// Derive the key for a validated setting.
    ///
    /// # Examples
    ///
    /// ```
    /// use apireg_model::{ApiDetails, Setting, SettingKey};
    ///
    /// let setting = Setting {
    ///     setting_id: "abc".to_owned(),
    ///     api_details: ApiDetails {
    ///         base_url: "http://x".to_owned(),
    ///         ..Default::default()
    ///     },
    ///     parameters: None,
    ///     description: "demo".to_owned(),
    /// };
    /// let key = SettingKey::derive(&setting);
    /// assert_eq!(key.partition_key(), "SettingId#abc");
    /// assert_eq!(key.sort_key(), "BaseUrl#http://x");
    /// ```
    #[must_use]
    pub fn derive(setting: &Setting) -> Self {
        Self::from_parts(&setting.setting_id, &setting.api_details.base_url)
    }

    /// Build a key from a raw setting id and base URL.
    #[must_use]
    pub fn from_parts(setting_id: &str, base_url: &str) -> Self {
        Self {
            pk: partition_key_for(setting_id),
            sk: format!("{SORT_KEY_PREFIX}{base_url}"),
        }
    }

    /// Rebuild a key from stored attribute values.
    ///
    /// Returns `None` if either value lacks its prefix.
    #[must_use]
    pub fn from_stored(pk: impl Into<String>, sk: impl Into<String>) -> Option<Self> {
        let (pk, sk) = (pk.into(), sk.into());
        if pk.starts_with(PARTITION_KEY_PREFIX) && sk.starts_with(SORT_KEY_PREFIX) {
            Some(Self { pk, sk })
        } else {
            None
        }
    }

    /// The `PK` attribute value.
    #[must_use]
    pub fn partition_key(&self) -> &str {
        &self.pk
    }

    /// The `SK` attribute value.
    #[must_use]
    pub fn sort_key(&self) -> &str {
        &self.sk
    }

    /// The setting id folded into the partition key.
    #[must_use]
    pub fn setting_id(&self) -> &str {
        &self.pk[PARTITION_KEY_PREFIX.len()..]
    }

    /// The base URL folded into the sort key.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.sk[SORT_KEY_PREFIX.len()..]
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.pk, self.sk)
    }
}

/// Partition key value for a setting id.
#[must_use]
pub fn partition_key_for(setting_id: &str) -> String {
    format!("{PARTITION_KEY_PREFIX}{setting_id}")
}
