//! Error types for the decrypt pipe.

use thiserror::Error;

/// Errors delivered through the plaintext channel.
///
/// Transport stalls never appear here; they are absorbed by the resumption
/// loop and are visible to the consumer only as latency. A cipher failure is
/// fatal for the stream and aborts the pipe, since emitting the affected
/// block would corrupt the audio.
#[derive(Error, Debug)]
pub enum PipeError {
    /// Block decryption failed.
    #[error(transparent)]
    Cipher(#[from] core_cipher::CipherError),

    /// The pipe configuration is unusable.
    #[error("Invalid pipe config: {0}")]
    Config(String),
}

/// Result type for pipe operations.
pub type Result<T> = std::result::Result<T, PipeError>;
