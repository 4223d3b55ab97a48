//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint. When routes or
//! request formats change, update only this file.

#![allow(dead_code)] // Not every test binary uses every endpoint

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client with a freshly registered annotator account and
    /// returns it together with the new user id.
    ///
    /// # Panics
    ///
    /// Panics if registration fails (indicates test infrastructure problem).
    pub async fn registered(base_url: String, handle: &str, password: &str) -> (Self, usize) {
        let client = Self::new(base_url);

        let response = client.register(handle, password).await;
        let status = response.status();
        let body: serde_json::Value = response.json().await.expect("registration response body");
        assert_eq!(
            status,
            reqwest::StatusCode::CREATED,
            "Test user registration failed: {:?}",
            body
        );
        let user_id = body["user_id"].as_u64().expect("user_id in body") as usize;
        (client, user_id)
    }

    /// Registers and logs the default test user in.
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);
        let response = client.register(TEST_USER, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test user registration failed: {:?}",
            response.text().await
        );
        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/register
    pub async fn register(&self, handle: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/register", self.base_url))
            .json(&json!({ "handle": handle, "password": password }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// POST /v1/auth/login
    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({ "handle": handle, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(format!("{}/v1/auth/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    // ========================================================================
    // Clip Assignment Endpoints
    // ========================================================================

    /// GET /v1/clip/next
    pub async fn next_clip(&self) -> Response {
        self.client
            .get(format!("{}/v1/clip/next", self.base_url))
            .send()
            .await
            .expect("Next clip request failed")
    }

    /// GET /v1/clip/next?mode={mode}
    pub async fn next_clip_with_mode(&self, mode: &str) -> Response {
        self.client
            .get(format!("{}/v1/clip/next?mode={}", self.base_url, mode))
            .send()
            .await
            .expect("Next clip request failed")
    }

    /// GET /v1/clip/{id}/file
    pub async fn clip_file(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/clip/{}/file", self.base_url, id))
            .send()
            .await
            .expect("Clip file request failed")
    }

    // ========================================================================
    // Audio Metadata Endpoints
    // ========================================================================

    /// GET /v1/audio/
    pub async fn audio_clips(&self) -> Response {
        self.client
            .get(format!("{}/v1/audio/", self.base_url))
            .send()
            .await
            .expect("Audio clips request failed")
    }

    /// GET /v1/audio/filter?annotated={value}
    pub async fn audio_clips_filtered(&self, annotated: &str) -> Response {
        self.client
            .get(format!(
                "{}/v1/audio/filter?annotated={}",
                self.base_url, annotated
            ))
            .send()
            .await
            .expect("Filtered audio clips request failed")
    }

    /// GET /v1/audio/{id}
    pub async fn audio_clip(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/audio/{}", self.base_url, id))
            .send()
            .await
            .expect("Audio clip request failed")
    }

    /// GET /v1/audio/{id}/annotations
    pub async fn audio_clip_annotations(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/audio/{}/annotations", self.base_url, id))
            .send()
            .await
            .expect("Audio clip annotations request failed")
    }

    // ========================================================================
    // Annotation Endpoints
    // ========================================================================

    /// POST /v1/annotation with a simple payload
    pub async fn post_annotation(&self, clip_id: &str) -> Response {
        self.post_annotation_payload(
            clip_id,
            json!([{ "class": "Seagull Cry", "start": 0.5, "end": 2.0 }]),
        )
        .await
    }

    /// POST /v1/annotation
    pub async fn post_annotation_payload(
        &self,
        clip_id: &str,
        payload: serde_json::Value,
    ) -> Response {
        self.client
            .post(format!("{}/v1/annotation", self.base_url))
            .json(&json!({ "clip_id": clip_id, "payload": payload }))
            .send()
            .await
            .expect("Post annotation request failed")
    }

    /// GET /v1/annotation/{id}
    pub async fn get_annotation(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/annotation/{}", self.base_url, id))
            .send()
            .await
            .expect("Get annotation request failed")
    }

    /// PUT /v1/annotation/{id}
    pub async fn put_annotation(&self, id: &str, body: serde_json::Value) -> Response {
        self.client
            .put(format!("{}/v1/annotation/{}", self.base_url, id))
            .json(&body)
            .send()
            .await
            .expect("Put annotation request failed")
    }

    /// GET /v1/annotation/all
    pub async fn all_annotations(&self) -> Response {
        self.client
            .get(format!("{}/v1/annotation/all", self.base_url))
            .send()
            .await
            .expect("All annotations request failed")
    }

    // ========================================================================
    // Annotation Class Endpoints
    // ========================================================================

    /// GET /v1/classes/
    pub async fn classes(&self) -> Response {
        self.client
            .get(format!("{}/v1/classes/", self.base_url))
            .send()
            .await
            .expect("Classes request failed")
    }

    /// GET /v1/classes/names
    pub async fn class_names(&self) -> Response {
        self.client
            .get(format!("{}/v1/classes/names", self.base_url))
            .send()
            .await
            .expect("Class names request failed")
    }

    /// POST /v1/classes/
    pub async fn post_class(&self, name: &str) -> Response {
        self.client
            .post(format!("{}/v1/classes/", self.base_url))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Post class request failed")
    }

    // ========================================================================
    // Health Check / System Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_stats(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Get stats request failed")
    }
}
