//! The decrypt pipe: background fetch task and consumer handle.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bridge_http::HttpClient;
use bytes::Bytes;
use core_cipher::{is_striped, CipherCache, STRIPE_BLOCK_LEN};
use core_media::ResolvedStream;
use futures::Stream;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::config::PipeConfig;
use crate::error::{PipeError, Result};

/// Fetch progress, owned exclusively by the background task.
///
/// `block_counter` indexes full blocks by their position in the logical
/// stream; it survives reconnects and is never reset.
#[derive(Debug, Default)]
struct FetchCursor {
    bytes_delivered: u64,
    block_counter: u64,
}

/// Opens resumable decrypting streams over resolved media.
pub struct StreamingDecryptPipe;

impl StreamingDecryptPipe {
    /// Open a plaintext stream over `resolved`.
    ///
    /// Spawns the producer task immediately; the returned handle is a lazy,
    /// single-pass, non-restartable sequence of plaintext chunks terminating
    /// after `resolved.total_bytes` bytes or on a fatal cipher error.
    ///
    /// # Errors
    ///
    /// Returns an error only when `config` is invalid.
    pub fn open(
        http: Arc<dyn HttpClient>,
        ciphers: Arc<CipherCache>,
        resolved: ResolvedStream,
        config: PipeConfig,
    ) -> Result<PlaintextStream> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.channel_capacity);
        let total_bytes = resolved.total_bytes;

        tokio::spawn(run_fetch_loop(http, ciphers, resolved, config, tx));

        Ok(PlaintextStream { rx, total_bytes })
    }
}

/// Producer loop. Owns the [`FetchCursor`]; terminates when all bytes have
/// been delivered, the consumer closes, or a cipher error aborts the stream.
async fn run_fetch_loop(
    http: Arc<dyn HttpClient>,
    ciphers: Arc<CipherCache>,
    resolved: ResolvedStream,
    config: PipeConfig,
    tx: mpsc::Sender<std::result::Result<Bytes, PipeError>>,
) {
    let mut cursor = FetchCursor::default();
    let total = resolved.total_bytes;

    while cursor.bytes_delivered < total && !tx.is_closed() {
        let mut reader = match http
            .open_stream(resolved.url.clone(), cursor.bytes_delivered)
            .await
        {
            Ok(reader) => reader,
            Err(e) => {
                warn!(offset = cursor.bytes_delivered, error = %e, "connection failed, retrying");
                tokio::time::sleep(config.reconnect_delay).await;
                continue;
            }
        };

        // Drain this connection block by block until it stalls or the
        // stream completes.
        'connection: while cursor.bytes_delivered < total {
            let remaining = total - cursor.bytes_delivered;
            let target = STRIPE_BLOCK_LEN.min(remaining as usize);
            let mut block = vec![0u8; target];
            let mut filled = 0usize;

            while filled < target {
                match reader.read(&mut block[filled..]).await {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) => {
                        warn!(offset = cursor.bytes_delivered, error = %e, "read failed");
                        break;
                    }
                }
            }

            if filled < target {
                // Stall or premature end-of-body. The partial block is
                // discarded so `bytes_delivered` stays block-aligned and the
                // resumed fetch re-reads it from the CDN.
                debug!(
                    offset = cursor.bytes_delivered,
                    filled, "connection stalled, resuming at last delivered offset"
                );
                break 'connection;
            }

            let is_full_block = target == STRIPE_BLOCK_LEN;
            if is_full_block && is_striped(cursor.block_counter) {
                if let Err(e) = ciphers.decrypt_block(&resolved.key, &mut block) {
                    error!(block = cursor.block_counter, error = %e, "block decryption failed");
                    let _ = tx.send(Err(PipeError::Cipher(e))).await;
                    return;
                }
            }

            if is_full_block {
                cursor.block_counter += 1;
            }
            cursor.bytes_delivered += target as u64;

            // Suspends when the channel is full; errors when the consumer
            // has closed its end.
            if tx.send(Ok(Bytes::from(block))).await.is_err() {
                debug!(offset = cursor.bytes_delivered, "consumer closed, stopping");
                return;
            }
        }

        if cursor.bytes_delivered < total && !tx.is_closed() {
            tokio::time::sleep(config.reconnect_delay).await;
        }
    }

    debug!(
        delivered = cursor.bytes_delivered,
        blocks = cursor.block_counter,
        "fetch loop finished"
    );
}

/// Consumer handle: a finite sequence of plaintext chunks.
///
/// Chunks arrive in strictly increasing offset order. Dropping (or
/// [`close`](Self::close)-ing) the handle cancels the producer at its next
/// suspension point; bytes already received are unaffected.
pub struct PlaintextStream {
    rx: mpsc::Receiver<std::result::Result<Bytes, PipeError>>,
    total_bytes: u64,
}

impl PlaintextStream {
    /// Receive the next plaintext chunk, suspending while the channel is
    /// empty. Returns `None` once the stream has completed.
    pub async fn next_chunk(&mut self) -> Option<std::result::Result<Bytes, PipeError>> {
        self.rx.recv().await
    }

    /// Total stream length, for progress reporting.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Stop the producer without dropping the handle. Chunks already queued
    /// remain readable.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl Stream for PlaintextStream {
    type Item = std::result::Result<Bytes, PipeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
