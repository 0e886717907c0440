//! HTTP client with tracing, timeout and domain allowlist.
//!
//! One client is shared by every provider so connection pools and the
//! timeout are configured in a single place.

use reqwest::{Client, RequestBuilder, Response, StatusCode, header, header::HeaderMap};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{FetchError, HttpError};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for `HaulGuard`.
const USER_AGENT: &str = concat!("HaulGuard/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing, timeout and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built. This only happens when
    /// the TLS backend cannot initialise, in which case no provider can be
    /// reached at all.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to create HTTP client: {e}. \
                    This usually indicates a broken TLS/SSL configuration."
                )
            });

        Self {
            inner: client,
            allowed_domains: None,
        }
    }

    /// Restricts requests to the given domains (and their subdomains).
    #[must_use]
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(()); // No restrictions
        };

        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        let response = request.send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        debug!("GET request");
        self.send(url, self.inner.get(url)).await
    }

    /// Performs a GET request with query parameters.
    ///
    /// Query values are not logged; some providers take the API key as a
    /// query parameter.
    #[instrument(skip(self, query), fields(url = %url))]
    pub async fn get_with_query(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Response, HttpError> {
        debug!(params = query.len(), "GET request with query");
        self.send(url, self.inner.get(url).query(query)).await
    }

    /// Performs a GET request with query parameters and custom headers.
    #[instrument(skip(self, query, headers), fields(url = %url))]
    pub async fn get_with_headers(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        debug!("GET request with headers");
        self.send(url, self.inner.get(url).query(query).headers(headers))
            .await
    }

    /// Performs a POST request with a JSON body and custom headers.
    #[instrument(skip(self, body, headers), fields(url = %url))]
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        debug!("POST request with JSON");
        self.send(url, self.inner.post(url).headers(headers).json(body))
            .await
    }

    /// Returns the inner reqwest client for advanced operations.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Check if the response indicates rate limiting.
    fn is_rate_limited(&self) -> bool;

    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;

    /// Maps error statuses to [`FetchError`] and decodes a JSON body.
    fn json_or_error<T: DeserializeOwned>(self) -> impl Future<Output = Result<T, FetchError>> + Send;
}

impl ResponseExt for Response {
    fn is_rate_limited(&self) -> bool {
        self.status() == StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }

    async fn json_or_error<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        let status = self.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::AuthenticationFailed(format!(
                "provider returned {status}"
            )));
        }
        if self.is_rate_limited() {
            return Err(FetchError::RateLimited {
                retry_after: self.retry_after_secs(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::InvalidResponse(format!("API returned {status}")));
        }

        let body = self.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
