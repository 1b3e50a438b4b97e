//! Shared test doubles for this crate's unit tests.

use async_trait::async_trait;
use bridge_http::{ByteStream, HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use mockall::mock;
use std::collections::HashMap;

mock! {
    pub HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> bridge_http::Result<HttpResponse>;
        async fn open_stream(&self, url: String, offset: u64) -> bridge_http::Result<ByteStream>;
    }
}

/// 2xx response with a JSON body.
pub fn json_response(body: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: HashMap::new(),
        body: Bytes::from(body.as_bytes().to_vec()),
    }
}

/// Bodyless response with the given status and optional `Content-Length`.
pub fn head_response(status: u16, content_length: Option<u64>) -> HttpResponse {
    let mut headers = HashMap::new();
    if let Some(length) = content_length {
        headers.insert("Content-Length".to_string(), length.to_string());
    }
    HttpResponse {
        status,
        headers,
        body: Bytes::new(),
    }
}
