//! Core data model for media resolution.

use core_cipher::TrackKey;

/// What kind of media a descriptor points at.
///
/// Episodes (spoken-word content) are served as plain streams: resolution is
/// a single metadata lookup and the result bypasses decryption entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Song,
    Episode,
}

/// Immutable track reference handed in by the catalog collaborator.
#[derive(Debug, Clone)]
pub struct TrackDescriptor {
    /// Catalog id of the track.
    pub id: String,
    /// Origin hash from catalog metadata, when already known.
    pub origin_hash: Option<String>,
    /// Media version from catalog metadata, when already known.
    pub media_version: Option<String>,
    /// Alternate catalog id carrying the same audio content.
    pub fallback_id: Option<String>,
    /// Expected size in bytes; used when the CDN omits `Content-Length`.
    pub size_hint: u64,
    /// Short-lived per-track authorization token for the token-based path.
    pub track_token: Option<String>,
    /// Media class; decides the direct-playback short circuit.
    pub kind: MediaKind,
}

impl TrackDescriptor {
    /// Minimal descriptor for a song known only by id.
    pub fn song(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            origin_hash: None,
            media_version: None,
            fallback_id: None,
            size_hint: 0,
            track_token: None,
            kind: MediaKind::Song,
        }
    }

    /// Whether the token-based resolution path is available.
    pub fn has_token(&self) -> bool {
        self.track_token.is_some()
    }
}

/// Audio quality preference, highest tier the caller will accept.
///
/// Each tier expands into an ordered format ladder (highest preference
/// first); the endpoints pick the best format they are willing to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AudioQuality {
    Basic,
    Standard,
    High,
    Lossless,
}

impl AudioQuality {
    /// Ordered format names for this tier, highest preference first.
    pub fn format_ladder(&self) -> &'static [&'static str] {
        match self {
            AudioQuality::Basic => &["MP3_64", "MP3_MISC"],
            AudioQuality::Standard => &["MP3_128", "MP3_64", "MP3_MISC"],
            AudioQuality::High => &["MP3_320", "MP3_128", "MP3_64", "MP3_MISC"],
            AudioQuality::Lossless => &["FLAC", "MP3_320", "MP3_128", "MP3_64", "MP3_MISC"],
        }
    }
}

/// Session credentials supplied by the external session collaborator.
#[derive(Debug, Clone)]
pub struct Session {
    /// Long-lived authentication cookie.
    pub arl: String,
    /// Server session id cookie.
    pub sid: String,
    /// Gateway API token.
    pub api_token: String,
    /// Session-scoped token exchanged for playable media descriptors.
    pub license_token: String,
    /// Preferred content language, e.g. `en`.
    pub language: String,
    /// Preferred content country, e.g. `US`.
    pub country: String,
}

impl Session {
    /// Cookie header value carrying the session credentials.
    pub fn cookie(&self) -> String {
        format!("arl={}; sid={}", self.arl, self.sid)
    }
}

/// Outcome of a successful resolution.
///
/// Consumed exactly once: either opened as a decrypting stream, or handed to
/// the player directly when `directly_playable` is set.
#[derive(Debug, Clone)]
pub struct ResolvedStream {
    /// Final media URL.
    pub url: String,
    /// Stream key derived from the original track id.
    pub key: TrackKey,
    /// Authoritative total byte length of the stream.
    pub total_bytes: u64,
    /// When set, the URL is a plain stream and decryption is bypassed.
    pub directly_playable: bool,
}
