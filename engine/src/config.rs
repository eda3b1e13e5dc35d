use std::fmt;
use std::time::Duration;

use crate::error::Error;

/// Stream identifier used when a request does not name one.
pub const DEFAULT_STREAM_ID: &str = "default";

/// Upper bound on a single chunk body.
pub const MAX_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Generation parameters locked by the first connection that creates a
/// periodic stream. Later requests supplying different values are logged as
/// a mismatch and ignored; the original values keep governing.
///
/// The client retry hint is deliberately absent: it is a per-connection
/// courtesy, not a property of the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct EventStreamConfig {
    /// Time between generated events.
    pub interval: Duration,
    /// Events to produce before the stream terminates; `None` is unbounded.
    pub max_events: Option<u64>,
    /// Custom SSE event type attached to generated events.
    pub event_type: Option<String>,
    /// Attach ~1MiB of filler to every payload.
    pub inflate_payload: bool,
    /// 1-based event index at which to inject a simulated failure.
    pub error_at: Option<u64>,
}

impl Default for EventStreamConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_events: None,
            event_type: None,
            inflate_payload: false,
            error_at: None,
        }
    }
}

impl EventStreamConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.interval < Duration::from_millis(1) {
            return Err(Error::invalid_config("interval must be at least 1ms"));
        }
        Ok(())
    }
}

/// Output encodings for the chunked variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFormat {
    /// Random alphanumeric text.
    Plain,
    /// One JSON object per chunk.
    JsonLines,
    /// Random bytes, base64-wrapped.
    Base64,
}

impl fmt::Display for ChunkFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChunkFormat::Plain => write!(f, "plain"),
            ChunkFormat::JsonLines => write!(f, "ndjson"),
            ChunkFormat::Base64 => write!(f, "base64"),
        }
    }
}

/// Parameters locked by the first connection that creates a chunk stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkStreamConfig {
    /// Total synthetic bytes to transfer before the stream terminates.
    pub total_bytes: u64,
    /// Bytes per chunk; the final chunk is truncated to the remainder.
    pub chunk_size: usize,
    /// Time between chunks.
    pub delay: Duration,
    pub format: ChunkFormat,
}

impl Default for ChunkStreamConfig {
    fn default() -> Self {
        Self {
            total_bytes: 64 * 1024,
            chunk_size: 1024,
            delay: Duration::from_millis(200),
            format: ChunkFormat::Plain,
        }
    }
}

impl ChunkStreamConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.total_bytes == 0 {
            return Err(Error::invalid_config("total_bytes must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(Error::invalid_config("chunk_size must be at least 1"));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::invalid_config(format!(
                "chunk_size must not exceed {MAX_CHUNK_SIZE} bytes"
            )));
        }
        if self.delay < Duration::from_millis(1) {
            return Err(Error::invalid_config("delay must be at least 1ms"));
        }
        Ok(())
    }
}
