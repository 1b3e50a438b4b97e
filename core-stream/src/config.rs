//! Pipe configuration.

use std::time::Duration;

use crate::error::{PipeError, Result};

/// Tuning knobs for one decrypt pipe.
///
/// The 2048-byte block size and the every-third-block stripe are protocol
/// constants and deliberately not configurable.
#[derive(Debug, Clone)]
pub struct PipeConfig {
    /// Capacity of the plaintext channel, in blocks. Bounds producer
    /// read-ahead over a slow consumer.
    pub channel_capacity: usize,
    /// Pause before reopening a connection after a stall.
    pub reconnect_delay: Duration,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
            reconnect_delay: Duration::from_millis(250),
        }
    }
}

impl PipeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(PipeError::Config(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
