use serde::Serialize;
use utoipa::ToSchema;

use engine::registry::{RetiredStream, StreamSummary};

/// Listing entry for one registered stream.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct StreamSummaryResponse {
    pub id: String,
    /// Lifecycle phase: "live", "halted" or "closed".
    pub phase: String,
    pub produced: u64,
    pub last_id: u64,
    pub buffered: usize,
    pub generator_scheduled: bool,
}

impl From<StreamSummary> for StreamSummaryResponse {
    fn from(summary: StreamSummary) -> Self {
        Self {
            id: summary.id,
            phase: summary.phase.to_string(),
            produced: summary.produced,
            last_id: summary.last_id,
            buffered: summary.buffered,
            generator_scheduled: summary.generator_scheduled,
        }
    }
}

/// Report returned after an administrative stream deletion.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct RetiredStreamResponse {
    pub id: String,
    /// Whether a generator was still running when the stream was removed.
    pub was_live: bool,
    pub produced: u64,
    pub last_id: u64,
}

impl From<RetiredStream> for RetiredStreamResponse {
    fn from(retired: RetiredStream) -> Self {
        Self {
            id: retired.id,
            was_live: retired.was_live,
            produced: retired.produced,
            last_id: retired.last_id,
        }
    }
}
