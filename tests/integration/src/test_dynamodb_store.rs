//! DynamoDB store tests against a DynamoDB-compatible endpoint.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use apireg_core::store::{DynamoDbSettingStore, SettingStore, StoreError};
    use apireg_model::{ApiDetails, SettingKey, SettingRecord};

    use crate::{dynamodb_client, test_setting_id, test_table_name};

    fn record(setting_id: &str, base_url: &str, description: &str) -> SettingRecord {
        SettingRecord {
            key: SettingKey::from_parts(setting_id, base_url),
            api_details: ApiDetails {
                base_url: base_url.to_owned(),
                api_key: Some("secret".to_owned()),
                ..Default::default()
            },
            parameters: None,
            description: description.to_owned(),
            created_at: chrono::Utc::now(),
        }
    }

    async fn fresh_store(prefix: &str) -> (DynamoDbSettingStore, aws_sdk_dynamodb::Client) {
        let client = dynamodb_client();
        let store = DynamoDbSettingStore::new(client.clone(), test_table_name(prefix));
        store.ensure_table().await.expect("table should be created");
        (store, client)
    }

    async fn drop_table(client: &aws_sdk_dynamodb::Client, table: &str) {
        let _ = client.delete_table().table_name(table).send().await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_table_idempotently() {
        let (store, client) = fresh_store("ensure").await;
        store.ensure_table().await.unwrap();

        let desc = client
            .describe_table()
            .table_name(store.table_name())
            .send()
            .await
            .unwrap();
        let keys: Vec<_> = desc
            .table()
            .unwrap()
            .key_schema()
            .iter()
            .map(|k| k.attribute_name().to_owned())
            .collect();
        assert_eq!(keys, vec!["PK", "SK"]);

        drop_table(&client, store.table_name()).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_insert_once_and_reject_repeat() {
        let (store, client) = fresh_store("put").await;
        let id = test_setting_id("put");

        store
            .put_if_absent(record(&id, "https://a", "first"))
            .await
            .unwrap();
        let err = store
            .put_if_absent(record(&id, "https://a", "second"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionalCheckFailed(_)));

        let records = store.query_setting(&id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "first");
        assert_eq!(records[0].api_details.api_key.as_deref(), Some("secret"));

        drop_table(&client, store.table_name()).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_admit_one_concurrent_insert() {
        let (store, client) = fresh_store("race").await;
        let store = Arc::new(store);
        let id = test_setting_id("race");

        let attempts = (0..8).map(|i| {
            let store = Arc::clone(&store);
            let record = record(&id, "https://a", &format!("attempt-{i}"));
            async move { store.put_if_absent(record).await }
        });
        let results = futures::future::join_all(attempts).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(store.query_setting(&id).await.unwrap().len(), 1);

        drop_table(&client, store.table_name()).await;
    }
}
