//! Output surface handed to the playback collaborator.

use std::sync::Arc;

use bridge_http::HttpClient;
use core_cipher::CipherCache;
use core_media::ResolvedStream;

use crate::config::PipeConfig;
use crate::error::Result;
use crate::pipe::{PlaintextStream, StreamingDecryptPipe};

/// Playable form of a resolved stream.
///
/// Plain streams (episodes and other directly playable media) are handed to
/// the player as a bare URL; everything else goes through the decrypt pipe.
pub enum PlayableMedia {
    /// URL the player can fetch as-is.
    Direct { url: String, total_bytes: u64 },
    /// Decrypted plaintext byte stream.
    Decrypted(PlaintextStream),
}

impl PlayableMedia {
    /// Open `resolved` for playback, honoring its `directly_playable` flag.
    ///
    /// # Errors
    ///
    /// Returns an error only when `config` is invalid.
    pub fn open(
        http: Arc<dyn HttpClient>,
        ciphers: Arc<CipherCache>,
        resolved: ResolvedStream,
        config: PipeConfig,
    ) -> Result<Self> {
        if resolved.directly_playable {
            return Ok(PlayableMedia::Direct {
                url: resolved.url,
                total_bytes: resolved.total_bytes,
            });
        }

        let stream = StreamingDecryptPipe::open(http, ciphers, resolved, config)?;
        Ok(PlayableMedia::Decrypted(stream))
    }

    /// Total byte length, for progress reporting.
    pub fn total_bytes(&self) -> u64 {
        match self {
            PlayableMedia::Direct { total_bytes, .. } => *total_bytes,
            PlayableMedia::Decrypted(stream) => stream.total_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_http::{ByteStream, HttpError, HttpRequest, HttpResponse};
    use core_cipher::key::derive_key;

    struct NoNetwork;

    #[async_trait]
    impl HttpClient for NoNetwork {
        async fn execute(&self, _request: HttpRequest) -> bridge_http::Result<HttpResponse> {
            Err(HttpError::Transport("offline".to_string()))
        }

        async fn open_stream(&self, _url: String, _offset: u64) -> bridge_http::Result<ByteStream> {
            Err(HttpError::Transport("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_directly_playable_bypasses_pipe() {
        let resolved = ResolvedStream {
            url: "https://cdn.test/episode.mp3".to_string(),
            key: derive_key("500"),
            total_bytes: 777,
            directly_playable: true,
        };

        let media = PlayableMedia::open(
            Arc::new(NoNetwork),
            Arc::new(CipherCache::new()),
            resolved,
            PipeConfig::default(),
        )
        .unwrap();

        match media {
            PlayableMedia::Direct { url, total_bytes } => {
                assert_eq!(url, "https://cdn.test/episode.mp3");
                assert_eq!(total_bytes, 777);
            }
            PlayableMedia::Decrypted(_) => panic!("expected direct playback"),
        }
    }

    #[tokio::test]
    async fn test_enciphered_media_opens_pipe() {
        let resolved = ResolvedStream {
            url: "https://cdn.test/track".to_string(),
            key: derive_key("100"),
            total_bytes: 4096,
            directly_playable: false,
        };

        let media = PlayableMedia::open(
            Arc::new(NoNetwork),
            Arc::new(CipherCache::new()),
            resolved,
            PipeConfig::default(),
        )
        .unwrap();

        assert!(matches!(media, PlayableMedia::Decrypted(_)));
        assert_eq!(media.total_bytes(), 4096);
    }
}
