//! # HTTP Bridge
//!
//! HTTP abstraction for the streaming core.
//!
//! ## Overview
//!
//! The resolver and the decrypt pipe never talk to the network directly; they
//! go through the [`HttpClient`] trait defined here. This keeps every network
//! interaction mockable in tests and concentrates connection pooling, timeout
//! and retry concerns in one place.
//!
//! The production implementation is [`ReqwestHttpClient`], backed by a pooled
//! `reqwest::Client`.

pub mod client;
pub mod error;
pub mod reqwest_client;

pub use client::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use error::{HttpError, Result};
pub use reqwest_client::ReqwestHttpClient;
