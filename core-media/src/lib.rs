//! # Media Resolution Module
//!
//! Turns a catalog track descriptor into a playable stream handle.
//!
//! ## Overview
//!
//! [`MediaResolver`] drives the multi-path resolution protocol: the
//! token-based media endpoint when the descriptor carries a track token, the
//! legacy quality-negotiation endpoint otherwise, and the signed legacy CDN
//! URL (with fallback-track substitution) when either path refuses to serve
//! the track. The outcome is a [`ResolvedStream`]: final URL, per-track
//! stream key, and authoritative total byte length.
//!
//! Session credentials (ARL cookie, session id, API and license tokens) are
//! supplied by an external collaborator via [`Session`]; this crate never
//! acquires or refreshes them.

pub mod error;
pub mod gateway;
pub mod media;
pub mod protocol;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{ResolveError, Result};
pub use gateway::GatewayClient;
pub use resolver::MediaResolver;
pub use types::{AudioQuality, MediaKind, ResolvedStream, Session, TrackDescriptor};
