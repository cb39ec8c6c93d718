//! Registry provider implementing the setting operations.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use apireg_model::error::ApiRegError;
use apireg_model::output::{CreateSettingOutput, GetSettingOutput, MessageOutput, SETTING_CREATED};
use apireg_model::types::{Setting, SettingRecord};

use crate::error::store_error_to_apireg;
use crate::store::SettingStore;
use crate::validation::validate_request;

/// Registration logic over an injected [`SettingStore`].
///
/// The provider holds no state of its own. Every create performs exactly one
/// conditional insert; nothing is written when validation fails.
#[derive(Debug, Clone)]
pub struct ApiRegProvider {
    store: Arc<dyn SettingStore>,
}

impl ApiRegProvider {
    /// Create a provider over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn SettingStore>) -> Self {
        Self { store }
    }

    /// Handle `CreateSetting` from a raw request body.
    pub async fn handle_create_setting(
        &self,
        body: &[u8],
    ) -> Result<CreateSettingOutput, ApiRegError> {
        let setting = validate_request(body)?;
        debug!(
            setting_id = %setting.setting_id,
            base_url = %setting.api_details.base_url,
            has_api_key = setting.api_details.api_key.is_some(),
            "received create request",
        );
        self.create_setting(setting).await
    }

    /// Insert a validated setting unless its key already exists.
    pub async fn create_setting(&self, setting: Setting) -> Result<CreateSettingOutput, ApiRegError> {
        let record = SettingRecord::new(setting, Utc::now());
        let setting_id = record.key.setting_id().to_owned();
        let base_url = record.key.base_url().to_owned();

        self.store
            .put_if_absent(record)
            .await
            .map_err(store_error_to_apireg)?;

        info!(
            setting_id = %setting_id,
            base_url = %base_url,
            store = self.store.backend(),
            "setting created",
        );
        Ok(MessageOutput::new(SETTING_CREATED))
    }

    /// Handle `GetSetting`: every record registered under `setting_id`.
    pub async fn handle_get_setting(&self, setting_id: &str) -> Result<GetSettingOutput, ApiRegError> {
        let records = self
            .store
            .query_setting(setting_id)
            .await
            .map_err(store_error_to_apireg)?;

        if records.is_empty() {
            return Err(ApiRegError::setting_not_found());
        }

        debug!(setting_id, count = records.len(), "setting fetched");
        Ok(GetSettingOutput {
            setting_id: setting_id.to_owned(),
            items: records.iter().map(Into::into).collect(),
        })
    }
}
