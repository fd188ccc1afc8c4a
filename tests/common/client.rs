//! HTTP client for end-to-end tests.
//!
//! Wraps reqwest with methods for the gateway endpoints. When routes or
//! request formats change, update only this file.

use reqwest::Response;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP test client for the gateway API.
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// GET the liveness probe.
    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("health request failed")
    }

    /// POST a prompt to /chat.
    pub async fn chat(&self, prompt: &str) -> Response {
        self.chat_raw(json!({ "prompt": prompt })).await
    }

    /// POST an arbitrary JSON body to /chat.
    pub async fn chat_raw(&self, body: serde_json::Value) -> Response {
        self.client
            .post(format!("{}/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("chat request failed")
    }

    /// POST a prompt and return just the answer text (expects HTTP 200).
    pub async fn answer(&self, prompt: &str) -> String {
        let response = self.chat(prompt).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("answer is not JSON");
        body["answer"]
            .as_str()
            .expect("answer field is not a string")
            .to_string()
    }
}
