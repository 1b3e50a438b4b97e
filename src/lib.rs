//! Workspace facade crate.
//!
//! Re-exports the individual workspace crates so host applications can depend
//! on `dzcore` alone: resolve a track descriptor with
//! [`core_media::MediaResolver`], then open the result with
//! [`core_stream::PlayableMedia`].

pub use bridge_http;
pub use core_cipher;
pub use core_media;
pub use core_stream;
