//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use boxoffice_server::MovieDescriptor;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    pub async fn predict(&self, movie1: &MovieDescriptor, movie2: &MovieDescriptor) -> Response {
        self.predict_raw(json!({ "movie1": movie1, "movie2": movie2 }))
            .await
    }

    /// Posts an arbitrary body, for requests a [`MovieDescriptor`] can't express.
    pub async fn predict_raw(&self, body: serde_json::Value) -> Response {
        self.client
            .post(format!("{}/predict", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Predict request failed")
    }

    pub async fn get_metrics(&self) -> Response {
        self.client
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await
            .expect("Metrics request failed")
    }

    pub async fn get_media(&self, title: &str) -> Response {
        self.client
            .get(format!("{}/media", self.base_url))
            .query(&[("title", title)])
            .send()
            .await
            .expect("Media request failed")
    }

    pub async fn retrain(&self) -> Response {
        self.client
            .post(format!("{}/retrain", self.base_url))
            .send()
            .await
            .expect("Retrain request failed")
    }
}
