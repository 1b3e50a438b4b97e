//! Gateway API client.
//!
//! Thin client for the catalog gateway: per-track metadata lookups used by
//! the legacy URL-signing path, episode metadata, and the best-effort
//! playback log call.

use std::sync::Arc;

use bridge_http::{HttpClient, HttpRequest, RetryPolicy};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::error::{ResolveError, Result};
use crate::protocol::{EpisodeData, GatewayResponse, TrackData, TrackListResults};
use crate::types::Session;

const GATEWAY_URL: &str = "https://www.deezer.com/ajax/gw-light.php";
const GATEWAY_HOST: &str = "www.deezer.com";

/// Client for gateway method calls.
///
/// Cheap to clone; clones share the HTTP client and session.
#[derive(Clone)]
pub struct GatewayClient {
    http: Arc<dyn HttpClient>,
    session: Arc<Session>,
}

impl GatewayClient {
    pub fn new(http: Arc<dyn HttpClient>, session: Session) -> Self {
        Self {
            http,
            session: Arc::new(session),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}?method={}&input=3&api_version=1.0&api_token={}",
            GATEWAY_URL,
            urlencoding::encode(method),
            urlencoding::encode(&self.session.api_token)
        )
    }

    fn base_request(&self, method: &str) -> HttpRequest {
        HttpRequest::post(self.method_url(method))
            .header("Accept", "*/*")
            .header("Accept-Language", self.session.language.clone())
            .header("Cache-Control", "max-age=0")
            .header(
                "Content-Language",
                format!("{}-{}", self.session.language, self.session.country),
            )
            .header("Cookie", self.session.cookie())
            .header("Host", GATEWAY_HOST)
    }

    /// Call a gateway method and decode its `results` payload.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
        track_id: &str,
    ) -> Result<T> {
        let request = self
            .base_request(method)
            .json(&params)
            .map_err(ResolveError::Http)?;

        let response = self
            .http
            .execute_with_retry(request, RetryPolicy::default())
            .await?;

        if !response.is_success() {
            return Err(ResolveError::MetadataFetch {
                id: track_id.to_string(),
                reason: format!("{} answered HTTP {}", method, response.status),
            });
        }

        let envelope: GatewayResponse<T> =
            response.json().map_err(|e| ResolveError::MetadataFetch {
                id: track_id.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(message) = envelope.error_message() {
            return Err(ResolveError::MetadataFetch {
                id: track_id.to_string(),
                reason: format!("{} error: {}", method, message),
            });
        }

        envelope.results.ok_or_else(|| ResolveError::MetadataFetch {
            id: track_id.to_string(),
            reason: format!("{} returned no results", method),
        })
    }

    /// Fetch signing metadata (origin hash, media version, fallback id) for
    /// one track.
    #[instrument(skip(self))]
    pub async fn track_data(&self, track_id: &str) -> Result<TrackData> {
        let results: TrackListResults = self
            .call(
                "song.getListData",
                json!({ "sng_ids": [track_id] }),
                track_id,
            )
            .await?;

        results
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::MetadataFetch {
                id: track_id.to_string(),
                reason: "song.getListData returned no entries".to_string(),
            })
    }

    /// Fetch episode metadata, including the direct stream URL.
    #[instrument(skip(self))]
    pub async fn episode_data(&self, episode_id: &str) -> Result<EpisodeData> {
        self.call(
            "episode.getData",
            json!({ "episode_id": episode_id }),
            episode_id,
        )
        .await
    }

    /// Best-effort playback log. Failures are logged and swallowed; this
    /// call must never affect resolution.
    pub async fn log_listen(&self, track_id: &str) {
        let params = json!({
            "next_media": { "media": { "id": track_id, "type": "song" } }
        });

        let request = match self.base_request("log.listen").json(&params) {
            Ok(request) => request,
            Err(e) => {
                warn!(track_id, error = %e, "playback log request build failed");
                return;
            }
        };

        match self.http.execute(request).await {
            Ok(response) if response.is_success() => {
                debug!(track_id, "playback logged");
            }
            Ok(response) => {
                warn!(track_id, status = response.status, "playback log refused");
            }
            Err(e) => {
                warn!(track_id, error = %e, "playback log failed");
            }
        }
    }
}
