//! Yandex Cloud Client
//!
//! Main client for interacting with Yandex Cloud REST APIs, combining
//! token resolution, request options and the retrying executor.

use super::auth::{Caches, TokenProvider};
use super::http::{handle_http_error, HttpExecutor, RequestOptions};
use crate::config::{ConnectionConfig, RequestSettings};
use crate::error::{ConfigError, Error, Result};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request, Url};
use serde_json::Value;
use std::sync::Arc;

/// REST API families served by Yandex Cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    Compute,
    Vpc,
    Operation,
    Billing,
}

impl Api {
    pub fn base_url(&self) -> &'static str {
        match self {
            Api::Compute => "https://compute.api.cloud.yandex.net/compute/v1",
            Api::Vpc => "https://vpc.api.cloud.yandex.net/vpc/v1",
            Api::Operation => "https://operation.api.cloud.yandex.net",
            Api::Billing => "https://billing.api.cloud.yandex.net/billing/v1",
        }
    }

    /// Absolute URL for a collection (or an item within it)
    pub fn url(&self, collection: &str, id: Option<&str>) -> Result<Url> {
        let raw = match id {
            Some(id) => format!(
                "{}/{}/{}",
                self.base_url(),
                collection,
                urlencoding::encode(id)
            ),
            None => format!("{}/{}", self.base_url(), collection),
        };
        Url::parse(&raw).map_err(|source| Error::Url { url: raw, source })
    }
}

/// Main Yandex Cloud client, one per connection
#[derive(Clone)]
pub struct YcClient {
    config: Arc<ConnectionConfig>,
    tokens: TokenProvider,
    http: HttpExecutor,
    options: RequestOptions,
}

impl YcClient {
    /// Create a client for a connection; rejects invalid configs up front
    pub fn new(config: ConnectionConfig, caches: &Caches) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let options = RequestOptions::from_config(&config);
        Ok(Self {
            config: Arc::new(config),
            tokens: TokenProvider::new(caches),
            http: HttpExecutor::new(caches.clients.clone()),
            options,
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Timeout and retry policy for this connection
    pub fn settings(&self) -> RequestSettings {
        self.config.settings()
    }

    /// Folder to scope a listing to: the qualifier wins over the config
    pub fn folder_id(&self, qualifier: Option<&str>) -> std::result::Result<String, ConfigError> {
        qualifier
            .filter(|f| !f.is_empty())
            .or(self.config.folder_id())
            .map(str::to_string)
            .ok_or(ConfigError::MissingFolderId)
    }

    /// Get the current bearer token
    pub async fn token(&self) -> Result<String> {
        Ok(self.tokens.resolve_token(&self.config).await?)
    }

    /// GET a URL and decode the JSON body
    ///
    /// Any non-2xx status after retries is an error.
    pub async fn get_json(&self, url: Url) -> Result<Value> {
        self.get_json_ignoring(url, &[]).await.map(|v| v.unwrap_or(Value::Null))
    }

    /// GET a URL; statuses in `ignore_codes` yield `None` instead of an error
    pub async fn get_json_ignoring(&self, url: Url, ignore_codes: &[u16]) -> Result<Option<Value>> {
        let token = self.token().await?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| Error::InvalidToken)?;
        let settings = self.settings();

        let make_request = || {
            let mut request = Request::new(Method::GET, url.clone());
            request.headers_mut().insert(AUTHORIZATION, bearer.clone());
            self.options.apply(&mut request);
            request
        };

        let response = self
            .http
            .do_with_retry(make_request, settings.retry, settings.timeout_secs)
            .await?;
        let response = handle_http_error(response, ignore_codes).await?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|source| Error::Transport {
            url: final_url.clone(),
            source,
        })?;

        if body.trim().is_empty() {
            return Ok(Some(Value::Null));
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| Error::Decode {
                url: final_url,
                source,
            })
    }
}
