//! Media endpoint clients.
//!
//! Two ways to ask for candidate media: the token-based endpoint (license
//! token + track token) and the legacy quality-negotiation endpoint (ordered
//! format names + numeric id). Both answer the same response shape.

use std::sync::Arc;

use bridge_http::{HttpClient, HttpRequest};
use tracing::instrument;

use crate::error::{ResolveError, Result};
use crate::protocol::{
    CipherFormat, LegacyMediaRequest, MediaFormats, MediaRequest, MediaResponse,
    CIPHER_BF_CBC_STRIPE, MEDIA_TYPE_FULL,
};
use crate::types::{AudioQuality, Session};

const MEDIA_URL: &str = "https://media.deezer.com/v1/get_url";
const MEDIA_HOST: &str = "media.deezer.com";
const LEGACY_MEDIA_URL: &str = "https://dzmedia.fly.dev/get_url";

/// Exchange a license token and track token for candidate media.
#[instrument(skip(http, session, track_token))]
pub async fn fetch_token_media(
    http: &Arc<dyn HttpClient>,
    session: &Session,
    track_id: &str,
    track_token: &str,
    quality: AudioQuality,
) -> Result<MediaResponse> {
    let formats = quality
        .format_ladder()
        .iter()
        .map(|format| CipherFormat {
            cipher: CIPHER_BF_CBC_STRIPE,
            format,
        })
        .collect();

    let body = MediaRequest {
        license_token: session.license_token.clone(),
        media: vec![MediaFormats {
            kind: MEDIA_TYPE_FULL,
            formats,
        }],
        track_tokens: vec![track_token.to_string()],
    };

    let request = HttpRequest::post(MEDIA_URL)
        .header("Accept-Language", session.language.clone())
        .header("Cookie", session.cookie())
        .header("Host", MEDIA_HOST)
        .json(&body)?;

    decode_media_response(http, request, track_id).await
}

/// Negotiate media through the legacy endpoint with an ordered format list.
#[instrument(skip(http))]
pub async fn fetch_legacy_media(
    http: &Arc<dyn HttpClient>,
    track_id: &str,
    quality: AudioQuality,
) -> Result<MediaResponse> {
    let numeric_id: i64 = track_id
        .parse()
        .map_err(|_| ResolveError::InvalidTrackId(track_id.to_string()))?;

    let body = LegacyMediaRequest {
        formats: quality.format_ladder().to_vec(),
        ids: vec![numeric_id],
    };

    let request = HttpRequest::post(LEGACY_MEDIA_URL).json(&body)?;

    decode_media_response(http, request, track_id).await
}

async fn decode_media_response(
    http: &Arc<dyn HttpClient>,
    request: HttpRequest,
    track_id: &str,
) -> Result<MediaResponse> {
    let response = http.execute(request).await?;

    if !response.is_success() {
        return Err(ResolveError::MediaEndpoint {
            id: track_id.to_string(),
            message: format!("HTTP {}", response.status),
        });
    }

    response.json().map_err(|e| ResolveError::MediaEndpoint {
        id: track_id.to_string(),
        message: e.to_string(),
    })
}
