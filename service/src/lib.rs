use std::sync::Arc;

use engine::config::{ChunkStreamConfig, EventStreamConfig};
use engine::registry::Registry;

use config::Config;

pub mod config;
pub mod logging;

// Service-level state containing only infrastructure concerns.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    /// Registry backing the periodic event stream endpoints.
    pub event_streams: Arc<Registry<EventStreamConfig>>,
    /// Separate namespace backing the chunked-transfer endpoints.
    pub chunk_streams: Arc<Registry<ChunkStreamConfig>>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            event_streams: Arc::new(Registry::new(config.event_buffer_capacity)),
            chunk_streams: Arc::new(Registry::new(config.chunk_buffer_capacity)),
            config,
        }
    }
}
