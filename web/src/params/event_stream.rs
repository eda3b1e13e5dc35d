use serde::Deserialize;
use std::time::Duration;
use utoipa::IntoParams;

use engine::config::{EventStreamConfig, DEFAULT_STREAM_ID};
use service::config::Config;

/// Query parameters accepted by the periodic event stream endpoint.
///
/// Everything except `retry` and `last_event_id` configures generation and
/// is locked by the first request that creates the stream identifier.
#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct EventStreamParams {
    /// Stream identifier partitioning independent simulated sources.
    pub(crate) stream: Option<String>,
    /// Milliseconds between generated events.
    pub(crate) interval: Option<u64>,
    /// Events to produce before the stream terminates; unbounded if omitted.
    pub(crate) max_events: Option<u64>,
    /// Custom SSE event type attached to generated events.
    pub(crate) event: Option<String>,
    /// Reconnection-delay hint in milliseconds, echoed to this client on connect.
    pub(crate) retry: Option<u64>,
    /// Attach ~1MiB of filler to every payload.
    pub(crate) inflate: Option<bool>,
    /// 1-based event index at which to inject a simulated failure.
    pub(crate) error_at: Option<u64>,
    /// Resume position for clients that cannot set the Last-Event-ID header
    /// on a first connect; the header wins when both are present.
    pub(crate) last_event_id: Option<u64>,
}

impl EventStreamParams {
    pub(crate) fn stream_id(&self) -> &str {
        self.stream.as_deref().unwrap_or(DEFAULT_STREAM_ID)
    }

    pub(crate) fn to_config(&self, defaults: &Config) -> EventStreamConfig {
        EventStreamConfig {
            interval: Duration::from_millis(self.interval.unwrap_or(defaults.default_interval_ms)),
            max_events: self.max_events,
            event_type: self.event.clone(),
            inflate_payload: self.inflate.unwrap_or(false),
            error_at: self.error_at,
        }
    }

    pub(crate) fn retry_hint(&self) -> Option<Duration> {
        self.retry.map(Duration::from_millis)
    }
}
