//! Media resolution state machine.
//!
//! Resolution is a bounded, non-cyclic walk: one media-endpoint call, an
//! evaluation step, and at most one legacy-fallback tier with a single
//! fallback-track substitution. Every branch is enumerable through
//! [`Evaluation`] so the fallback logic is testable without a network.

use std::sync::Arc;

use bridge_http::HttpClient;
use core_cipher::{sign_track_url, KeyDeriver};
use tracing::{debug, info, instrument, warn};

use crate::error::{ResolveError, Result};
use crate::gateway::GatewayClient;
use crate::media::{fetch_legacy_media, fetch_token_media};
use crate::protocol::{MediaResponse, TrackData};
use crate::types::{AudioQuality, MediaKind, ResolvedStream, Session, TrackDescriptor};

/// Numeric tier the CDN expects inside the signed legacy payload.
const LEGACY_QUALITY_TIER: u32 = 1;

/// How a media-endpoint response is acted upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Evaluation {
    /// A source URL was offered; terminal.
    Source(String),
    /// Rights refused or token path exhausted: sign a legacy URL for the
    /// original track id.
    LegacyOriginal,
    /// No media and no token: resolve through the fallback track id.
    LegacyViaFallback,
}

/// Decide the next transition from a media-endpoint response.
pub(crate) fn evaluate(response: &MediaResponse, has_token: bool) -> Evaluation {
    if response.rights_refused() {
        return Evaluation::LegacyOriginal;
    }

    if let Some(url) = response.first_source_url() {
        return Evaluation::Source(url.to_string());
    }

    // Candidate list is empty.
    if has_token {
        Evaluation::LegacyOriginal
    } else {
        Evaluation::LegacyViaFallback
    }
}

/// Resolves track descriptors into playable stream handles.
pub struct MediaResolver {
    http: Arc<dyn HttpClient>,
    gateway: GatewayClient,
    keys: KeyDeriver,
    log_playback: bool,
}

impl MediaResolver {
    pub fn new(http: Arc<dyn HttpClient>, session: Session) -> Self {
        let gateway = GatewayClient::new(Arc::clone(&http), session);
        Self {
            http,
            gateway,
            keys: KeyDeriver::new(),
            log_playback: false,
        }
    }

    /// Enable the fire-and-forget playback log call after each successful
    /// resolution.
    pub fn with_playback_logging(mut self, enabled: bool) -> Self {
        self.log_playback = enabled;
        self
    }

    /// Resolve `descriptor` to a final URL, stream key and total length.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when metadata cannot be fetched or every
    /// candidate URL is rejected; recoverable conditions (rights refusal,
    /// empty media lists, a first probe rejection) are handled internally.
    #[instrument(skip(self, descriptor), fields(track_id = %descriptor.id))]
    pub async fn resolve(
        &self,
        descriptor: &TrackDescriptor,
        quality: AudioQuality,
    ) -> Result<ResolvedStream> {
        if descriptor.kind == MediaKind::Episode {
            return self.resolve_episode(descriptor).await;
        }

        let response = match &descriptor.track_token {
            Some(token) => {
                fetch_token_media(
                    &self.http,
                    self.gateway.session(),
                    &descriptor.id,
                    token,
                    quality,
                )
                .await?
            }
            None => fetch_legacy_media(&self.http, &descriptor.id, quality).await?,
        };

        let (url, probed_length) = match evaluate(&response, descriptor.has_token()) {
            Evaluation::Source(url) => {
                debug!(track_id = %descriptor.id, "media endpoint offered a source");
                let length = self.fetch_length(&url).await;
                (url, length)
            }
            Evaluation::LegacyOriginal => {
                info!(track_id = %descriptor.id, "falling back to signed legacy URL");
                self.legacy_with_original_id(descriptor).await?
            }
            Evaluation::LegacyViaFallback => {
                info!(track_id = %descriptor.id, "no media offered, trying fallback track");
                self.legacy_with_fallback_id(descriptor).await?
            }
        };

        let total_bytes = self.total_bytes(descriptor, probed_length)?;
        let resolved = ResolvedStream {
            url,
            key: self.keys.derive(&descriptor.id),
            total_bytes,
            directly_playable: false,
        };

        if self.log_playback {
            let gateway = self.gateway.clone();
            let track_id = descriptor.id.clone();
            tokio::spawn(async move {
                gateway.log_listen(&track_id).await;
            });
        }

        Ok(resolved)
    }

    /// Episodes are plain streams: one metadata lookup, no cipher, no
    /// fallback tiers.
    async fn resolve_episode(&self, descriptor: &TrackDescriptor) -> Result<ResolvedStream> {
        let episode = self.gateway.episode_data(&descriptor.id).await?;
        if episode.direct_stream_url.is_empty() {
            return Err(ResolveError::MetadataFetch {
                id: descriptor.id.clone(),
                reason: "episode has no direct stream URL".to_string(),
            });
        }

        Ok(ResolvedStream {
            url: episode.direct_stream_url,
            key: self.keys.derive(&descriptor.id),
            total_bytes: descriptor.size_hint,
            directly_playable: true,
        })
    }

    /// LegacyFallback tier keyed by the original track id: fetch fresh
    /// signing metadata, probe the signed URL, and substitute the fallback
    /// track's metadata on a 403 (the payload keeps the original id).
    async fn legacy_with_original_id(
        &self,
        descriptor: &TrackDescriptor,
    ) -> Result<(String, Option<u64>)> {
        let data = self.gateway.track_data(&descriptor.id).await?;
        let url = sign_track_url(
            &descriptor.id,
            &data.origin_hash,
            &data.media_version,
            LEGACY_QUALITY_TIER,
        )?;

        let (status, length) = self.http.content_length(&url).await?;
        if status != 403 {
            return Ok((url, length));
        }

        warn!(track_id = %descriptor.id, "legacy URL rejected, substituting fallback metadata");
        let fallback_id = self.fallback_id(descriptor, Some(&data))?;
        let fallback = self.gateway.track_data(&fallback_id).await?;
        let url = sign_track_url(
            &descriptor.id,
            &fallback.origin_hash,
            &fallback.media_version,
            LEGACY_QUALITY_TIER,
        )?;

        let (status, length) = self.http.content_length(&url).await?;
        if status == 403 {
            return Err(ResolveError::ProbeRejected {
                id: descriptor.id.clone(),
                status,
            });
        }

        Ok((url, length))
    }

    /// Fallback-track tier: fetch the fallback track's own metadata and sign
    /// with the fallback id. The stream key still derives from the original
    /// id.
    async fn legacy_with_fallback_id(
        &self,
        descriptor: &TrackDescriptor,
    ) -> Result<(String, Option<u64>)> {
        let fallback_id = match self.fallback_id(descriptor, None) {
            Ok(id) => id,
            Err(_) => {
                // Descriptor carries no fallback; the track's own metadata
                // may still name one.
                let data = self.gateway.track_data(&descriptor.id).await?;
                self.fallback_id(descriptor, Some(&data))?
            }
        };

        let fallback = self.gateway.track_data(&fallback_id).await?;
        let url = sign_track_url(
            &fallback_id,
            &fallback.origin_hash,
            &fallback.media_version,
            LEGACY_QUALITY_TIER,
        )?;

        let (status, length) = self.http.content_length(&url).await?;
        if status == 403 {
            return Err(ResolveError::ProbeRejected {
                id: descriptor.id.clone(),
                status,
            });
        }

        Ok((url, length))
    }

    fn fallback_id(
        &self,
        descriptor: &TrackDescriptor,
        data: Option<&TrackData>,
    ) -> Result<String> {
        descriptor
            .fallback_id
            .clone()
            .or_else(|| {
                data.and_then(|d| d.fallback.as_ref())
                    .map(|f| f.id.clone())
                    .filter(|id| !id.is_empty())
            })
            .ok_or_else(|| ResolveError::MissingFallback {
                id: descriptor.id.clone(),
            })
    }

    /// Probe the final URL for its length; failures here are tolerated when
    /// the descriptor can fill in.
    async fn fetch_length(&self, url: &str) -> Option<u64> {
        match self.http.content_length(url).await {
            Ok((status, length)) if (200..300).contains(&status) => length,
            Ok((status, _)) => {
                warn!(status, "length probe answered non-success status");
                None
            }
            Err(e) => {
                warn!(error = %e, "length probe failed");
                None
            }
        }
    }

    fn total_bytes(&self, descriptor: &TrackDescriptor, probed: Option<u64>) -> Result<u64> {
        probed
            .filter(|len| *len > 0)
            .or(Some(descriptor.size_hint).filter(|hint| *hint > 0))
            .ok_or_else(|| ResolveError::UnknownTotalLength {
                id: descriptor.id.clone(),
            })
    }
}
