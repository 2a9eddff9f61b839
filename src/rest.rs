//! Authenticated requests against the data API.

use reqwest::{Client, Method};
use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::models::Session;
use crate::util::is_success;

/// Status and parsed body of a data API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body, or an empty object when the body is not JSON
    pub json: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        is_success(self.status)
    }
}

/// Method, body and extra headers for a request. Defaults to a bodiless GET.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    /// POST that asks for the inserted rows back.
    pub fn insert(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            headers: vec![("Prefer".to_string(), "return=representation".to_string())],
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    config: Config,
}

impl RestClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Send `options` to `/rest/v1/{path}` as the session's user.
    pub async fn request(
        &self,
        session: &Session,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let url = self.config.rest_url(path);
        tracing::debug!(method = %options.method, %url, "Data API request");

        let mut builder = self
            .client
            .request(options.method, url.as_str())
            .header("apikey", self.config.anon_key.as_str())
            .header("Authorization", format!("Bearer {}", session.access_token))
            .header("Content-Type", "application/json");

        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &options.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let json = serde_json::from_str(&text).unwrap_or_else(|_| Value::Object(Default::default()));

        tracing::debug!(status, %url, "Data API response");

        Ok(ApiResponse { status, json })
    }

    pub async fn get(&self, session: &Session, path: &str) -> Result<ApiResponse> {
        self.request(session, path, RequestOptions::default()).await
    }
}
