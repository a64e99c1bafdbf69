// src/api/notion/client.rs
//! Thin HTTP client for the Notion API.
//!
//! Handles authentication headers and the request verbs. Parsing and
//! business logic live in `responses` and `store`.

use super::responses::parse_notion_body;
use crate::algebras::StoreError;
use crate::constants::{NOTION_API_BASE_URL, NOTION_VERSION};
use crate::error::AppError;
use crate::types::ApiKey;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    ///
    /// `timeout` bounds each request and the connection attempt, so a host
    /// that accepts but never answers surfaces as [`StoreError::Timeout`].
    pub fn new(api_key: &ApiKey, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: NOTION_API_BASE_URL.to_string(),
        })
    }

    /// Points the client at another host, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// GET `endpoint` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, StoreError> {
        let url = self.url(endpoint);
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(e, endpoint))?;
        read_json(response, endpoint).await
    }

    /// POST a JSON body to `endpoint` and decode the reply.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let url = self.url(endpoint);
        log::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| request_error(e, endpoint))?;
        read_json(response, endpoint).await
    }

    /// PATCH a JSON body to `endpoint` and decode the reply.
    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let url = self.url(endpoint);
        log::debug!("PATCH {}", url);
        let response = self
            .client
            .patch(url)
            .json(body)
            .send()
            .await
            .map_err(|e| request_error(e, endpoint))?;
        read_json(response, endpoint).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T, StoreError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| request_error(e, endpoint))?;
    log::debug!("{} -> {}", endpoint, status);
    parse_notion_body(status.as_u16(), &text)
}

fn request_error(err: reqwest::Error, endpoint: &str) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout {
            operation: endpoint.to_string(),
        }
    } else {
        StoreError::Transport {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_endpoints_with_one_slash() {
        let key = ApiKey::notion("secret_abc123").unwrap();
        let client = NotionHttpClient::new(&key, Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.url("/databases/abc"), "http://localhost:8080/v1/databases/abc");
        assert_eq!(client.url("pages/def"), "http://localhost:8080/v1/pages/def");
    }
}
