//! Registration tests against a running Apireg server.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::{http_client, server_url, setting_body, test_setting_id};

    async fn post_setting(client: &reqwest::Client, body: &Value) -> (StatusCode, Value) {
        let resp = client
            .post(format!("{}/settings", server_url()))
            .json(body)
            .send()
            .await
            .expect("request should reach the server");
        let status = resp.status();
        (status, resp.json().await.expect("response should be JSON"))
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_healthy() {
        let resp = http_client()
            .get(format!("{}/health", server_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_setting_then_reject_repeat() {
        let client = http_client();
        let id = test_setting_id("create");
        let body = setting_body(&id, "https://api.example.com");

        let (status, resp) = post_setting(&client, &body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, json!({"message": "Setting created successfully"}));

        let (status, resp) = post_setting(&client, &body).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(resp, json!({"message": "Setting already exists"}));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_missing_fields() {
        let client = http_client();
        let id = test_setting_id("missing");

        let (status, resp) =
            post_setting(&client, &json!({"settingId": id, "apiDetails": {}})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            resp["message"],
            "Missing required fields: apiDetails.baseUrl, description"
        );

        let lookup = client
            .get(format!("{}/settings/{id}", server_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(lookup.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_base_urls_with_redacted_keys() {
        let client = http_client();
        let id = test_setting_id("list");
        post_setting(&client, &setting_body(&id, "https://b.example.com")).await;
        post_setting(&client, &setting_body(&id, "https://a.example.com")).await;

        let body: Value = client
            .get(format!("{}/settings/{id}", server_url()))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["settingId"], Value::String(id));
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["baseUrl"], "https://a.example.com");
        assert_eq!(items[1]["baseUrl"], "https://b.example.com");
        assert!(items.iter().all(|i| i["apiDetails"]["apiKey"] == "****"));
        assert_eq!(items[0]["parameters"]["region"], "eu");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_admit_one_of_concurrent_registrations() {
        let client = http_client();
        let id = test_setting_id("race");
        let body = setting_body(&id, "https://race.example.com");

        let attempts = (0..10).map(|_| post_setting(&client, &body));
        let results = futures::future::join_all(attempts).await;

        let created = results.iter().filter(|(s, _)| *s == StatusCode::OK).count();
        let conflicts = results
            .iter()
            .filter(|(s, _)| *s == StatusCode::CONFLICT)
            .count();
        assert_eq!(created, 1);
        assert_eq!(conflicts, 9);
    }
}
