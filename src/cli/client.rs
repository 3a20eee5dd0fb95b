use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::config::CliConfig;

/// Thin client for the FlowForge HTTP API. Unwraps the success envelope
/// and turns error envelopes into `anyhow` errors.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    pub fn from_config(config: &CliConfig) -> anyhow::Result<Self> {
        Self::new(config.server_url(), config.token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> anyhow::Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> anyhow::Result<Value> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        self.send(Method::DELETE, path, None).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);
        unwrap_envelope(status, payload)
    }
}

fn unwrap_envelope(status: StatusCode, payload: Value) -> anyhow::Result<Value> {
    if status.is_success() {
        return Ok(payload.get("data").cloned().unwrap_or(payload));
    }

    let message = payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"));
    match payload.get("field_errors") {
        Some(fields) => anyhow::bail!("{} ({}): {}", message, status.as_u16(), fields),
        None => anyhow::bail!("{} ({})", message, status.as_u16()),
    }
}
