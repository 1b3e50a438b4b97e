//! Error types for the HTTP bridge.

use thiserror::Error;

/// Errors surfaced by [`HttpClient`](crate::HttpClient) implementations.
#[derive(Error, Debug)]
pub enum HttpError {
    /// Connection could not be established.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Request or body read timed out.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The server answered with a non-success status where one was required.
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Request body could not be serialized.
    #[error("Request serialization failed: {0}")]
    Serialize(String),

    /// Response body could not be read or decoded.
    #[error("Response body error: {0}")]
    Body(String),

    /// All retry attempts exhausted.
    #[error("All {attempts} attempts failed, last error: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Anything else the underlying client reports.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for HTTP bridge operations.
pub type Result<T> = std::result::Result<T, HttpError>;
