//! # Streaming Decrypt Pipe
//!
//! Resumable, backpressured plaintext delivery for a resolved stream.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │        Fetch task (Producer)             │
//! │                                          │
//! │  1. Range-fetch from the CDN             │
//! │  2. Cut 2048-byte blocks                 │
//! │  3. Decrypt every third full block       │
//! └────────────┬─────────────────────────────┘
//!              │ bounded mpsc channel
//!              ▼
//! ┌──────────────────────────────────────────┐
//! │     PlaintextStream (Consumer)           │
//! └──────────────────────────────────────────┘
//! ```
//!
//! The producer suspends when the channel is full; the consumer suspends when
//! it is empty. Connection loss is recovered transparently by reopening a
//! range request at the last delivered offset, preserving block-counter
//! parity across reconnects. Closing the consumer stops the producer at its
//! next suspension point.

pub mod config;
pub mod error;
pub mod pipe;
pub mod playable;

pub use config::PipeConfig;
pub use error::{PipeError, Result};
pub use pipe::{PlaintextStream, StreamingDecryptPipe};
pub use playable::PlayableMedia;
