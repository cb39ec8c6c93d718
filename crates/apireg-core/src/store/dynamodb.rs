//! Amazon DynamoDB setting store.
//!
//! Records live in a table keyed by string attributes `PK` (hash) and `SK`
//! (range). Inserts use a `ConditionExpression` so the existence check and
//! write happen atomically on the service side:
//!
//! ```text
//! attribute_not_exists(#pk) AND attribute_not_exists(#sk)
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::client::Waiters;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType,
};
use tracing::{debug, info};

use apireg_model::key::{PARTITION_KEY_ATTR, SORT_KEY_ATTR, partition_key_for};
use apireg_model::types::ApiDetails;
use apireg_model::{SettingKey, SettingRecord};

use super::{SettingStore, StoreError};
use crate::config::ApiRegConfig;

/// Condition that makes `PutItem` an insert-only operation.
const INSERT_ONLY_CONDITION: &str = "attribute_not_exists(#pk) AND attribute_not_exists(#sk)";

/// Service error codes that mean "try again later".
const RETRYABLE_CODES: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "ThrottlingException",
    "InternalServerError",
    "ServiceUnavailable",
    "TransactionConflictException",
];

/// How long startup waits for a new table to become `ACTIVE`.
const TABLE_ACTIVE_TIMEOUT: Duration = Duration::from_secs(120);

/// [`SettingStore`] backed by a DynamoDB table.
#[derive(Debug, Clone)]
pub struct DynamoDbSettingStore {
    client: Client,
    table_name: String,
}

impl DynamoDbSettingStore {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Build a client from the registry configuration.
    ///
    /// Credentials come from the default AWS provider chain.
    pub async fn connect(config: &ApiRegConfig) -> Self {
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(config.store_timeout)
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.default_region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(config.store_max_attempts))
            .timeout_config(timeouts);
        if let Some(ref url) = config.dynamodb_endpoint_url {
            loader = loader.endpoint_url(url);
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config), config.table_name.clone())
    }

    /// The table this store writes to.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Create the table with the `PK`/`SK` string key schema if it is missing,
    /// then wait until it accepts writes.
    pub async fn ensure_table(&self) -> Result<(), StoreError> {
        match self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
        {
            Ok(_) => return self.wait_for_table().await,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) => {}
            Err(err) => return Err(classify_sdk_error(err)),
        }

        let result = self
            .client
            .create_table()
            .table_name(&self.table_name)
            .key_schema(key_element(PARTITION_KEY_ATTR, KeyType::Hash)?)
            .key_schema(key_element(SORT_KEY_ATTR, KeyType::Range)?)
            .attribute_definitions(string_attribute(PARTITION_KEY_ATTR)?)
            .attribute_definitions(string_attribute(SORT_KEY_ATTR)?)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        match result {
            Ok(_) => info!(table = %self.table_name, "created settings table"),
            // Another instance won the race.
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_in_use_exception()) => {}
            Err(err) => return Err(classify_sdk_error(err)),
        }
        self.wait_for_table().await
    }

    async fn wait_for_table(&self) -> Result<(), StoreError> {
        self.client
            .wait_until_table_exists()
            .table_name(&self.table_name)
            .wait(TABLE_ACTIVE_TIMEOUT)
            .await
            .map_err(|e| {
                StoreError::unavailable(
                    format!("table {} did not become active", self.table_name),
                    e,
                )
            })?;
        debug!(table = %self.table_name, "settings table is active");
        Ok(())
    }
}

#[async_trait]
impl SettingStore for DynamoDbSettingStore {
    fn backend(&self) -> &'static str {
        "dynamodb"
    }

    async fn put_if_absent(&self, record: SettingRecord) -> Result<(), StoreError> {
        let key = record.key.clone();
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(&record)))
            .condition_expression(INSERT_ONLY_CONDITION)
            .expression_attribute_names("#pk", PARTITION_KEY_ATTR)
            .expression_attribute_names("#sk", SORT_KEY_ATTR)
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(%key, table = %self.table_name, "conditional put succeeded");
                Ok(())
            }
            Err(err) => Err(classify_put_error(err, key)),
        }
    }

    async fn query_setting(&self, setting_id: &str) -> Result<Vec<SettingRecord>, StoreError> {
        let mut records = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let resp = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("#pk = :pk")
                .expression_attribute_names("#pk", PARTITION_KEY_ATTR)
                .expression_attribute_values(":pk", AttributeValue::S(partition_key_for(setting_id)))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(classify_sdk_error)?;

            for item in resp.items() {
                records.push(item_to_record(item)?);
            }

            match resp.last_evaluated_key() {
                Some(last) if !last.is_empty() => start_key = Some(last.clone()),
                _ => break,
            }
        }

        Ok(records)
    }
}

/// A failed condition means the key exists; anything else is classified.
fn classify_put_error<R>(err: SdkError<PutItemError, R>, key: SettingKey) -> StoreError
where
    R: Debug + Send + Sync + 'static,
{
    if err
        .as_service_error()
        .is_some_and(PutItemError::is_conditional_check_failed_exception)
    {
        return StoreError::ConditionalCheckFailed(key);
    }
    classify_sdk_error(err)
}

/// Sort an SDK failure into transient or non-transient.
fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    let retryable = match &err {
        SdkError::ServiceError(ctx) => ctx
            .err()
            .code()
            .is_some_and(|code| RETRYABLE_CODES.contains(&code)),
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        _ => false,
    };

    let message = DisplayErrorContext(&err).to_string();
    if retryable {
        StoreError::unavailable(message, err)
    } else {
        StoreError::internal(message, err)
    }
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement, StoreError> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| StoreError::internal("invalid key schema", e))
}

fn string_attribute(name: &str) -> Result<AttributeDefinition, StoreError> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| StoreError::internal("invalid attribute definition", e))
}

// ---------------------------------------------------------------------------
// Item encoding
// ---------------------------------------------------------------------------

fn record_to_item(record: &SettingRecord) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::from([
        (
            PARTITION_KEY_ATTR.to_owned(),
            AttributeValue::S(record.key.partition_key().to_owned()),
        ),
        (
            SORT_KEY_ATTR.to_owned(),
            AttributeValue::S(record.key.sort_key().to_owned()),
        ),
        (
            "apiDetails".to_owned(),
            AttributeValue::M(api_details_to_map(&record.api_details)),
        ),
        (
            "description".to_owned(),
            AttributeValue::S(record.description.clone()),
        ),
        (
            "createdAt".to_owned(),
            AttributeValue::S(record.created_at.to_rfc3339()),
        ),
    ]);
    if let Some(ref parameters) = record.parameters {
        item.insert("parameters".to_owned(), string_map_to_attr(parameters));
    }
    item
}

fn api_details_to_map(details: &ApiDetails) -> HashMap<String, AttributeValue> {
    let mut map = HashMap::from([(
        "baseUrl".to_owned(),
        AttributeValue::S(details.base_url.clone()),
    )]);
    if let Some(ref auth_type) = details.auth_type {
        map.insert("authType".to_owned(), AttributeValue::S(auth_type.clone()));
    }
    if let Some(ref api_key) = details.api_key {
        map.insert("apiKey".to_owned(), AttributeValue::S(api_key.clone()));
    }
    if let Some(ref headers) = details.additional_headers {
        map.insert("additionalHeaders".to_owned(), string_map_to_attr(headers));
    }
    map
}

fn string_map_to_attr<'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> AttributeValue {
    AttributeValue::M(
        entries
            .into_iter()
            .map(|(k, v)| (k.clone(), AttributeValue::S(v.clone())))
            .collect(),
    )
}

fn item_to_record(item: &HashMap<String, AttributeValue>) -> Result<SettingRecord, StoreError> {
    let pk = required_s(item, PARTITION_KEY_ATTR)?;
    let sk = required_s(item, SORT_KEY_ATTR)?;
    let key = SettingKey::from_stored(pk, sk)
        .ok_or_else(|| StoreError::malformed(format!("unrecognized key ({pk}, {sk})")))?;

    let details = item
        .get("apiDetails")
        .and_then(|v| v.as_m().ok())
        .ok_or_else(|| StoreError::malformed(format!("record {key} has no apiDetails map")))?;

    let created_at = chrono::DateTime::parse_from_rfc3339(required_s(item, "createdAt")?)
        .map_err(|e| StoreError::internal(format!("record {key} has invalid createdAt"), e))?
        .with_timezone(&chrono::Utc);

    Ok(SettingRecord {
        api_details: ApiDetails {
            base_url: required_s(details, "baseUrl")?.to_owned(),
            auth_type: optional_s(details, "authType"),
            api_key: optional_s(details, "apiKey"),
            additional_headers: optional_string_map(details, "additionalHeaders")?,
        },
        parameters: optional_string_map(item, "parameters")?,
        description: required_s(item, "description")?.to_owned(),
        created_at,
        key,
    })
}

fn required_s<'a>(
    item: &'a HashMap<String, AttributeValue>,
    name: &str,
) -> Result<&'a str, StoreError> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| StoreError::malformed(format!("missing string attribute {name}")))
}

fn optional_s(item: &HashMap<String, AttributeValue>, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).cloned()
}

fn optional_string_map(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<Option<std::collections::BTreeMap<String, String>>, StoreError> {
    let Some(value) = item.get(name) else {
        return Ok(None);
    };
    let map = value
        .as_m()
        .map_err(|_| StoreError::malformed(format!("attribute {name} is not a map")))?;
    map.iter()
        .map(|(k, v)| {
            v.as_s()
                .map(|s| (k.clone(), s.clone()))
                .map_err(|_| StoreError::malformed(format!("attribute {name}.{k} is not a string")))
        })
        .collect::<Result<_, _>>()
        .map(Some)
}
