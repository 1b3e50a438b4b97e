//! Error types for media resolution.

use thiserror::Error;

/// Errors surfaced to the playback collaborator when no viable URL can be
/// produced.
///
/// Rights refusals and empty media lists are recovered internally by the
/// resolver's fallback tiers and never appear here; what does appear is
/// terminal for the resolution attempt.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Track metadata (origin hash, media version, fallback id) could not be
    /// fetched or parsed.
    #[error("Metadata fetch failed for track {id}: {reason}")]
    MetadataFetch { id: String, reason: String },

    /// A fallback tier was required but no fallback track id exists.
    #[error("No fallback track available for {id}")]
    MissingFallback { id: String },

    /// The CDN rejected the generated legacy URL, including the one signed
    /// with fallback-track metadata. There is no further fallback tier.
    #[error("CDN rejected generated URL for track {id} (status {status})")]
    ProbeRejected { id: String, status: u16 },

    /// The media endpoint answered with an unusable response.
    #[error("Media endpoint error for track {id}: {message}")]
    MediaEndpoint { id: String, message: String },

    /// Legacy quality negotiation requires a numeric id.
    #[error("Track id is not numeric: {0}")]
    InvalidTrackId(String),

    /// Neither the CDN nor the descriptor provided a total byte length; the
    /// stream could not be terminated reliably.
    #[error("Total stream length unknown for track {id}")]
    UnknownTotalLength { id: String },

    /// URL signing failed.
    #[error(transparent)]
    Cipher(#[from] core_cipher::CipherError),

    /// Transport-level failure talking to an endpoint.
    #[error(transparent)]
    Http(#[from] bridge_http::HttpError),
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
