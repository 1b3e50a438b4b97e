//! HTTP client abstraction.
//!
//! Async HTTP operations behind a trait so the resolver and the decrypt pipe
//! can be driven by mocks in tests.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{HttpError, Result};

/// Boxed async byte reader handed out by [`HttpClient::open_stream`].
pub type ByteStream = Box<dyn tokio::io::AsyncRead + Send + Unpin>;

/// HTTP method types used by this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
}

/// HTTP request builder.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Head, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Serialize `body` as the JSON request body.
    ///
    /// Sets `Content-Type: application/json; charset=utf-8`; the single body
    /// encoding used by every POST endpoint in this core.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let json =
            serde_json::to_vec(body).map_err(|e| HttpError::Serialize(e.to_string()))?;
        self.body = Some(Bytes::from(json));
        self.headers.insert(
            "Content-Type".to_string(),
            "application/json; charset=utf-8".to_string(),
        );
        Ok(self)
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::Body(e.to_string()))
    }

    /// Get the response body as a UTF-8 string.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| HttpError::Body(format!("Invalid UTF-8: {}", e)))
    }

    /// Check if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the `Content-Length` header, if present.
    ///
    /// Header names are matched case-insensitively since proxies disagree on
    /// casing.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse().ok())
    }
}

/// Retry policy for idempotent metadata requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Whether to use exponential backoff.
    pub use_exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            use_exponential_backoff: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.use_exponential_backoff {
            let exponential = self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1));
            exponential.min(self.max_delay)
        } else {
            self.base_delay
        }
    }
}

/// Async HTTP client trait.
///
/// Implementations should handle connection pooling, TLS and transparent
/// response decompression. Retry is layered on top via
/// [`execute_with_retry`](HttpClient::execute_with_retry) so callers decide
/// which requests are safe to repeat.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and buffer the full response.
    ///
    /// Non-2xx statuses are returned as responses, not errors; callers that
    /// need a success status check [`HttpResponse::is_success`].
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails, the request times out, or
    /// the body cannot be read.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Open a lazy byte stream over `url` starting at `offset`.
    ///
    /// When `offset > 0` the request carries `Range: bytes={offset}-`. The
    /// returned reader yields the (possibly enciphered) body bytes as they
    /// arrive; it is the caller's job to detect premature end-of-body.
    async fn open_stream(&self, url: String, offset: u64) -> Result<ByteStream>;

    /// Execute with retry on transport errors and retryable statuses
    /// (429 and 5xx). Only safe for idempotent requests.
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let mut attempt = 0u32;
        let mut last = String::new();

        while attempt < policy.max_attempts {
            attempt += 1;
            match self.execute(request.clone()).await {
                Ok(response) => {
                    if response.status == 429 || response.status >= 500 {
                        last = format!("HTTP {}", response.status);
                    } else {
                        return Ok(response);
                    }
                }
                Err(e) => last = e.to_string(),
            }

            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
        }

        Err(HttpError::RetriesExhausted {
            attempts: policy.max_attempts,
            last,
        })
    }

    /// Fetch the total byte length of `url` via a HEAD request.
    ///
    /// Returns the response status alongside the parsed `Content-Length` so a
    /// single round trip can double as a reachability probe.
    async fn content_length(&self, url: &str) -> Result<(u16, Option<u64>)> {
        let response = self.execute(HttpRequest::head(url)).await?;
        let length = response.content_length();
        Ok((response.status, length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::get("https://example.com")
            .header("User-Agent", "test")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = HttpRequest::post("https://example.com")
            .json(&serde_json::json!({"ids": [100]}))
            .unwrap();

        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/json; charset=utf-8".to_string())
        );
        assert_eq!(request.body.unwrap().as_ref(), br#"{"ids":[100]}"#);
    }

    #[test]
    fn test_response_content_length_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("content-length".to_string(), "2048".to_string());
        let response = HttpResponse {
            status: 200,
            headers,
            body: Bytes::new(),
        };

        assert_eq!(response.content_length(), Some(2048));
        assert!(response.is_success());
    }

    #[test]
    fn test_retry_policy_delays() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(250),
            use_exponential_backoff: true,
        };

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        // Capped by max_delay.
        assert_eq!(policy.delay_for(3), Duration::from_millis(250));
    }
}
