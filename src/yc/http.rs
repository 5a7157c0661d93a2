//! HTTP utilities for Yandex Cloud REST API calls
//!
//! Bounded retries with a per-attempt timeout, request options (user agent,
//! endpoint override) and status classification.

use crate::config::{ConnectionConfig, DEFAULT_TIMEOUT_SECS};
use crate::error::{truncate_body, truncate_with_note, Error, Result};
use dashmap::DashMap;
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::{Client, Request, Response, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Linear backoff step: attempt N is followed by an N x step pause
const RETRY_BACKOFF_STEP: Duration = Duration::from_millis(200);

/// User agent sent when the connection does not configure one
pub const DEFAULT_USER_AGENT: &str = concat!("ycsource/", env!("CARGO_PKG_VERSION"));

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    truncate_with_note(body, MAX_LOG_BODY_LENGTH).replace(|c: char| c.is_control(), "")
}

/// Whether a status is worth another attempt
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// HTTP clients keyed by timeout in seconds
///
/// Clients are interchangeable for a given timeout, so a racing duplicate
/// construction just replaces an equivalent entry.
#[derive(Clone, Default)]
pub struct HttpClientCache {
    clients: Arc<DashMap<u64, Client>>,
}

impl HttpClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or build) the client for a timeout; zero means the default
    pub fn client(&self, timeout_secs: u64) -> reqwest::Result<Client> {
        let timeout_secs = if timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_secs
        };

        if let Some(client) = self.clients.get(&timeout_secs) {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        self.clients.insert(timeout_secs, client.clone());
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Per-request options taken from the connection config
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    user_agent: Option<HeaderValue>,
    endpoint_override: Option<Url>,
}

impl RequestOptions {
    pub fn new(user_agent: Option<&str>, endpoint_override: Option<&str>) -> Self {
        let user_agent = user_agent
            .filter(|ua| !ua.is_empty())
            .and_then(|ua| match HeaderValue::from_str(ua) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring user_agent with invalid header characters");
                    None
                },
            });

        let endpoint_override = endpoint_override
            .filter(|eo| !eo.is_empty())
            .and_then(|eo| match Url::parse(eo) {
                Ok(url) if url.has_host() => Some(url),
                _ => {
                    tracing::warn!("Ignoring unparsable endpoint_override: {}", eo);
                    None
                },
            });

        Self {
            user_agent,
            endpoint_override,
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(config.user_agent(), config.endpoint_override())
    }

    /// Set the user agent and swap scheme + host (path and query are kept)
    pub fn apply(&self, request: &mut Request) {
        if let Some(ref user_agent) = self.user_agent {
            request.headers_mut().insert(USER_AGENT, user_agent.clone());
        }
        if let Some(ref endpoint) = self.endpoint_override {
            apply_endpoint_override(request.url_mut(), endpoint);
        }
    }
}

fn apply_endpoint_override(url: &mut Url, endpoint: &Url) {
    if url.set_scheme(endpoint.scheme()).is_err() {
        tracing::debug!("Cannot switch {} to scheme {}", url, endpoint.scheme());
        return;
    }
    if url.set_host(endpoint.host_str()).is_err() {
        tracing::debug!("Cannot switch {} to host {:?}", url, endpoint.host_str());
        return;
    }
    let _ = url.set_port(endpoint.port());
}

/// Executes requests with bounded retries
#[derive(Clone, Default)]
pub struct HttpExecutor {
    clients: HttpClientCache,
}

impl HttpExecutor {
    pub fn new(clients: HttpClientCache) -> Self {
        Self { clients }
    }

    pub fn clients(&self) -> &HttpClientCache {
        &self.clients
    }

    /// Execute a request, retrying transport failures, 5xx and 429.
    ///
    /// `make_request` is called once per attempt. Any other status is final
    /// and handed back as-is, including 4xx. When every attempt fails the
    /// last failure is returned wrapped in [`Error::Exhausted`].
    pub async fn do_with_retry<F>(
        &self,
        mut make_request: F,
        retry_count: u32,
        timeout_secs: u64,
    ) -> Result<Response>
    where
        F: FnMut() -> Request,
    {
        let retry_count = retry_count.max(1);
        let timeout_secs = if timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            timeout_secs
        };
        let client = self.clients.client(timeout_secs).map_err(Error::Client)?;
        let timeout = Duration::from_secs(timeout_secs);

        let mut attempt = 1;
        loop {
            let mut request = make_request();
            *request.timeout_mut() = Some(timeout);

            match execute_once(&client, request, attempt, retry_count).await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < retry_count => {
                    tokio::time::sleep(RETRY_BACKOFF_STEP * attempt).await;
                    tracing::debug!("Retrying after: {}", err);
                    attempt += 1;
                },
                Err(err) => {
                    return Err(Error::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    })
                },
            }
        }
    }
}

/// One attempt; `Err` means the attempt is retryable
async fn execute_once(
    client: &Client,
    request: Request,
    attempt: u32,
    retry_count: u32,
) -> Result<Response> {
    let url = request.url().to_string();
    tracing::debug!("{} {}", request.method(), url);

    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(source) => {
            tracing::error!(
                "HTTP request failed (attempt {}/{}) for {}: {}",
                attempt,
                retry_count,
                url,
                source
            );
            return Err(Error::Transport { url, source });
        },
    };

    let status = response.status();
    if !is_retryable_status(status) {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        "HTTP {} (attempt {}/{}) for {}: {}",
        status.as_u16(),
        attempt,
        retry_count,
        url,
        sanitize_for_log(&body)
    );
    Err(Error::Status {
        url,
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

/// Classify a completed response.
///
/// Statuses listed in `ignore_codes` and any 2xx pass through; everything
/// else consumes the body into an [`Error::Status`].
pub async fn handle_http_error(response: Response, ignore_codes: &[u16]) -> Result<Response> {
    let status = response.status();
    let url = response.url().to_string();

    if ignore_codes.contains(&status.as_u16()) {
        tracing::debug!("HTTP {} ignored for {}", status.as_u16(), url);
        return Ok(response);
    }
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
    tracing::error!("API error {} for {}: {}", status.as_u16(), url, sanitize_for_log(&body));
    Err(Error::Status {
        url,
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}
