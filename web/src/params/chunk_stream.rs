use serde::Deserialize;
use std::time::Duration;
use utoipa::{IntoParams, ToSchema};

use engine::config::{ChunkFormat, ChunkStreamConfig, DEFAULT_STREAM_ID};
use service::config::Config;

/// Output encodings accepted by the chunk stream endpoint.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ChunkFormatParam {
    Plain,
    Ndjson,
    Base64,
}

impl From<ChunkFormatParam> for ChunkFormat {
    fn from(format: ChunkFormatParam) -> Self {
        match format {
            ChunkFormatParam::Plain => ChunkFormat::Plain,
            ChunkFormatParam::Ndjson => ChunkFormat::JsonLines,
            ChunkFormatParam::Base64 => ChunkFormat::Base64,
        }
    }
}

/// Query parameters accepted by the chunk stream endpoint. The whole
/// generation surface is locked by the first request that creates the
/// stream identifier.
#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct ChunkStreamParams {
    /// Stream identifier partitioning independent chunk sources.
    pub(crate) stream: Option<String>,
    /// Total synthetic bytes to transfer before the stream ends.
    pub(crate) total_bytes: Option<u64>,
    /// Bytes per chunk; the final chunk is truncated to the remainder.
    pub(crate) chunk_size: Option<usize>,
    /// Milliseconds between chunks.
    pub(crate) delay: Option<u64>,
    /// Chunk body encoding.
    pub(crate) format: Option<ChunkFormatParam>,
    /// Resume position for clients that cannot set the Last-Event-ID header
    /// on a first connect; the header wins when both are present.
    pub(crate) last_event_id: Option<u64>,
}

impl ChunkStreamParams {
    pub(crate) fn stream_id(&self) -> &str {
        self.stream.as_deref().unwrap_or(DEFAULT_STREAM_ID)
    }

    pub(crate) fn to_config(&self, defaults: &Config) -> ChunkStreamConfig {
        ChunkStreamConfig {
            total_bytes: self.total_bytes.unwrap_or(defaults.default_chunk_total_bytes),
            chunk_size: self.chunk_size.unwrap_or(defaults.default_chunk_size),
            delay: Duration::from_millis(self.delay.unwrap_or(defaults.default_chunk_delay_ms)),
            format: self.format.map(Into::into).unwrap_or(ChunkFormat::Plain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn omitted_parameters_fall_back_to_server_defaults() {
        let defaults = Config::parse_from(["sse-sandbox"]);
        let params = ChunkStreamParams {
            stream: None,
            total_bytes: None,
            chunk_size: None,
            delay: None,
            format: None,
            last_event_id: None,
        };
        let config = params.to_config(&defaults);
        assert_eq!(config.total_bytes, 65536);
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.delay, Duration::from_millis(200));
        assert_eq!(config.format, ChunkFormat::Plain);
        assert_eq!(params.stream_id(), DEFAULT_STREAM_ID);
    }

    #[test]
    fn format_names_map_onto_engine_encodings() {
        assert_eq!(ChunkFormat::from(ChunkFormatParam::Plain), ChunkFormat::Plain);
        assert_eq!(ChunkFormat::from(ChunkFormatParam::Ndjson), ChunkFormat::JsonLines);
        assert_eq!(ChunkFormat::from(ChunkFormatParam::Base64), ChunkFormat::Base64);
    }
}
