//! HTTP Client abstraction layer for platform integrations
//!
//! Every platform API GET (Twitch Helix, YouTube Data API) goes through
//! [`HttpClient`], so probers can be exercised without real network
//! requests. The default implementation wraps reqwest with a request timeout, which
//! also bounds how long a stopped poller can keep an in-flight call alive.
//!
//! # Example Usage:
//! ```ignore
//! use crate::http::{HttpClient, DefaultHttpClient};
//!
//! let http: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new(Duration::from_secs(15)));
//! let resp = http.get(url, vec![("Client-Id".into(), client_id)]).await?;
//! if resp.is_rate_limited() { /* back off */ }
//! ```

use std::time::Duration;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use crate::Error;

/// Status plus raw body. Non-2xx responses are returned, not turned into errors,
/// so callers can react to 401/403/429 themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 403, 429, or a Google-style quota error body.
    pub fn is_rate_limited(&self) -> bool {
        if self.status == 403 || self.status == 429 {
            return true;
        }
        !self.is_success()
            && (self.body.contains("quotaExceeded") || self.body.contains("rateLimitExceeded"))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// A generic trait for making HTTP requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: String, headers: Vec<(String, String)>) -> Result<HttpResponse, Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default reqwest client: {e}");
                reqwest::Client::new()
            });
        Self { client }
    }

    /// The underlying client, for crates that take a `reqwest::Client` directly.
    pub fn reqwest_client(&self) -> reqwest::Client {
        self.client.clone()
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn get(&self, url: String, headers: Vec<(String, String)>) -> Result<HttpResponse, Error> {
        let mut request = self.client.get(&url);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
