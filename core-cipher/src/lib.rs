//! # Cipher Module
//!
//! Pure cryptographic building blocks for the streaming core:
//!
//! - [`KeyDeriver`] — deterministic track-id → 16-byte stream key derivation
//! - [`sign_track_url`] — the legacy CDN URL-signing scheme
//! - [`CipherCache`] — keyed Blowfish cache + stripe block decryption
//!
//! Everything here is deterministic and does no I/O. The embedded constants
//! (separator byte, padding byte, fixed keys and IV) are protocol constants;
//! changing any of them produces output the CDN rejects.

pub mod error;
pub mod key;
pub mod stripe;
pub mod url;

pub use error::{CipherError, Result};
pub use key::{KeyDeriver, TrackKey, KEY_LEN};
pub use stripe::{is_striped, CipherCache, STRIPE_BLOCK_LEN, STRIPE_PERIOD};
#[cfg(any(test, feature = "test-utils"))]
pub use stripe::encipher_block;
pub use url::sign_track_url;
