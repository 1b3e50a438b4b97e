//! HTTP client implementation using reqwest.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::client::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::error::{HttpError, Result};

/// Connect and read timeout applied to every request.
const IO_TIMEOUT: Duration = Duration::from_secs(60);

/// Idle connections kept per host.
const POOL_MAX_IDLE_PER_HOST: usize = 5;

/// How long an idle pooled connection is kept alive.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Reqwest-based HTTP client.
///
/// Provides HTTP operations with:
/// - a small reusable connection pool shared across resumed fetches
/// - bounded connect/read timeouts (no overall deadline, so long-lived body
///   streams are not cut off mid-download)
/// - transparent gzip decompression
/// - HTTP/1.1, which the CDN requires for range requests
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with the default pool and timeouts.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(IO_TIMEOUT)
            .read_timeout(IO_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .http1_only()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an externally configured `reqwest::Client`.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    fn convert_error(e: reqwest::Error) -> HttpError {
        if e.is_timeout() {
            HttpError::Timeout(e.to_string())
        } else if e.is_connect() {
            HttpError::Connect(e.to_string())
        } else {
            HttpError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::Body(e.to_string()))?;

        debug!(status, url = %url, bytes = body.len(), "request completed");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn open_stream(&self, url: String, offset: u64) -> Result<ByteStream> {
        let mut req = self.client.get(&url);
        if offset > 0 {
            req = req.header("Range", format!("bytes={}-", offset));
        }

        let response = req.send().await.map_err(Self::convert_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url,
            });
        }

        debug!(status = status.as_u16(), offset, "byte stream opened");

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let reader = tokio_util::io::StreamReader::new(stream);

        Ok(Box::new(reader))
    }
}
