//! Error types for cipher operations.

use thiserror::Error;

/// Errors from key handling and block decryption.
///
/// These are fatal for the stream they occur on: a wrong key or block length
/// would silently corrupt audio if ignored.
#[derive(Error, Debug)]
pub enum CipherError {
    /// Key material has the wrong length.
    #[error("Invalid key length: {0} (expected 16 bytes)")]
    KeyLength(usize),

    /// Ciphertext length is not a positive multiple of the cipher block size.
    #[error("Invalid block length: {len} (expected positive multiple of {multiple})")]
    BlockLength { len: usize, multiple: usize },

    /// Origin hash is empty, so no CDN host character can be selected.
    #[error("Empty origin hash")]
    EmptyOriginHash,
}

/// Result type for cipher operations.
pub type Result<T> = std::result::Result<T, CipherError>;
