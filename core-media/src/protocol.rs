//! Wire types for the media and gateway endpoints.

use serde::{Deserialize, Serialize};

/// Cipher name used for striped tracks.
pub const CIPHER_BF_CBC_STRIPE: &str = "BF_CBC_STRIPE";

/// Media type requested from the token endpoint.
pub const MEDIA_TYPE_FULL: &str = "FULL";

/// Request body for the token-based media endpoint.
#[derive(Debug, Serialize)]
pub struct MediaRequest {
    pub license_token: String,
    pub media: Vec<MediaFormats>,
    pub track_tokens: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MediaFormats {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub formats: Vec<CipherFormat>,
}

#[derive(Debug, Serialize)]
pub struct CipherFormat {
    pub cipher: &'static str,
    pub format: &'static str,
}

/// Request body for the legacy quality-negotiation endpoint.
#[derive(Debug, Serialize)]
pub struct LegacyMediaRequest {
    pub formats: Vec<&'static str>,
    pub ids: Vec<i64>,
}

/// Response shared by both media endpoints.
#[derive(Debug, Deserialize)]
pub struct MediaResponse {
    #[serde(default)]
    pub data: Vec<MediaEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MediaEntry {
    #[serde(default)]
    pub media: Vec<Medium>,
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Medium {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub sources: Vec<MediaSource>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaSource {
    pub url: String,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl MediaResponse {
    /// Whether the endpoint refused the track token for the requested media.
    pub fn rights_refused(&self) -> bool {
        self.data
            .iter()
            .flat_map(|entry| entry.errors.iter())
            .any(|e| e.message.contains("no sufficient rights"))
    }

    /// Whether no candidate media was offered at all.
    pub fn media_is_empty(&self) -> bool {
        self.data.first().map_or(true, |entry| entry.media.is_empty())
    }

    /// First source URL of the first media entry, the one the official
    /// clients always use.
    pub fn first_source_url(&self) -> Option<&str> {
        self.data
            .first()?
            .media
            .first()?
            .sources
            .first()
            .map(|source| source.url.as_str())
    }
}

/// Gateway response envelope.
///
/// `error` is `[]` on success and an object or non-empty array on failure,
/// so it is kept as a raw value and only inspected for emptiness.
#[derive(Debug, Deserialize)]
pub struct GatewayResponse<T> {
    #[serde(default)]
    pub error: serde_json::Value,
    pub results: Option<T>,
}

impl<T> GatewayResponse<T> {
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            serde_json::Value::Null => None,
            serde_json::Value::Array(a) if a.is_empty() => None,
            serde_json::Value::Object(o) if o.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

/// `song.getListData` results.
#[derive(Debug, Deserialize)]
pub struct TrackListResults {
    #[serde(default)]
    pub data: Vec<TrackData>,
}

/// Per-track metadata used by the legacy URL-signing scheme.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackData {
    #[serde(rename = "SNG_ID", default)]
    pub id: String,
    #[serde(rename = "MD5_ORIGIN", default)]
    pub origin_hash: String,
    #[serde(rename = "MEDIA_VERSION", default)]
    pub media_version: String,
    #[serde(rename = "TRACK_TOKEN", default)]
    pub track_token: Option<String>,
    #[serde(rename = "FALLBACK", default)]
    pub fallback: Option<FallbackData>,
}

/// Alternate id (and its signing metadata) for the same audio content.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackData {
    #[serde(rename = "SNG_ID", default)]
    pub id: String,
    #[serde(rename = "MD5_ORIGIN", default)]
    pub origin_hash: String,
    #[serde(rename = "MEDIA_VERSION", default)]
    pub media_version: String,
}

/// `episode.getData` results.
#[derive(Debug, Deserialize)]
pub struct EpisodeData {
    #[serde(rename = "EPISODE_DIRECT_STREAM_URL", default)]
    pub direct_stream_url: String,
}
