//! Track key derivation.
//!
//! Every track's stream key is derived from its catalog id alone, so the same
//! track always decrypts with the same key and keys can be memoized freely.

use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;
use md5::{Digest, Md5};
use parking_lot::Mutex;

/// Length of a derived stream key in bytes.
pub const KEY_LEN: usize = 16;

/// Fixed XOR secret folded into every derived key.
const KEY_SECRET: &[u8; KEY_LEN] = b"g4el58wc0zvf9na1";

/// Default capacity of the id → key memo table.
const KEY_CACHE_CAPACITY: usize = 256;

/// A 16-byte symmetric stream key derived from a track id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackKey([u8; KEY_LEN]);

impl TrackKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl From<[u8; KEY_LEN]> for TrackKey {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for TrackKey {
    // Key material stays out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TrackKey(..)")
    }
}

/// Derive the stream key for `track_id`.
///
/// The id is hashed with MD5 using a one-byte-per-character encoding
/// (Latin-1; catalog ids are numeric so this never truncates in practice),
/// rendered as 32 lowercase hex characters `h`, and folded to 16 bytes as
/// `key[i] = h[i] ^ h[i + 16] ^ secret[i]`.
pub fn derive_key(track_id: &str) -> TrackKey {
    let id_bytes: Vec<u8> = track_id.chars().map(|c| c as u8).collect();
    let digest = Md5::digest(&id_bytes);
    let digest_hex = hex::encode(digest);
    let h = digest_hex.as_bytes();

    let mut key = [0u8; KEY_LEN];
    for i in 0..KEY_LEN {
        key[i] = h[i] ^ h[i + KEY_LEN] ^ KEY_SECRET[i];
    }

    TrackKey(key)
}

/// Memoizing key deriver.
///
/// Derivation is pure, so the memo table is never invalidated; repeated
/// playback of the same track reuses the cached key. Safe to share across
/// concurrently resolving tracks.
pub struct KeyDeriver {
    cache: Mutex<LruCache<String, TrackKey>>,
}

impl KeyDeriver {
    pub fn new() -> Self {
        Self::with_capacity(KEY_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Derive (or look up) the stream key for `track_id`.
    pub fn derive(&self, track_id: &str) -> TrackKey {
        let mut cache = self.cache.lock();
        if let Some(key) = cache.get(track_id) {
            return *key;
        }

        let key = derive_key(track_id);
        cache.put(track_id.to_string(), key);
        key
    }
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new()
    }
}
