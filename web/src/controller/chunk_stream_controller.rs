use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use log::*;
use service::AppState;

use crate::error::Error;
use crate::extractors::last_event_id::LastEventId;
use crate::params::chunk_stream::ChunkStreamParams;
use engine::chunk;
use engine::tail::{self, AttachOptions};

/// GET a stream of fixed-size synthetic chunks.
///
/// Chunks are delivered as events keyed by chunk id, so reconnecting with a
/// last-seen id resumes the transfer exactly like the periodic variant. The
/// stream ends once the locked byte target has been transferred, and expires
/// on its own deadline when the producer goes quiet.
#[utoipa::path(
    get,
    path = "/chunks",
    params(ChunkStreamParams),
    responses(
        (status = 200, description = "A stream of synthetic chunks", content_type = "text/event-stream"),
        (status = 422, description = "Unprocessable Entity")
    )
)]
pub async fn chunks(
    State(app_state): State<AppState>,
    LastEventId(header_id): LastEventId,
    Query(params): Query<ChunkStreamParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error> {
    let config = params.to_config(&app_state.config);
    config.validate()?;
    let last_event_id = header_id.or(params.last_event_id);

    debug!(
        "GET /chunks for stream {} (last_event_id={last_event_id:?})",
        params.stream_id()
    );

    let (stream, _created) = app_state
        .chunk_streams
        .get_or_create(params.stream_id(), config);
    chunk::ensure_running(
        &app_state.chunk_streams,
        &stream,
        app_state.config.chunk_ttl(),
    );

    let options = AttachOptions {
        last_event_id,
        retry: None,
    };
    let frames = tail::follow(stream, options).map(|frame| Ok::<_, Infallible>(frame.into_sse()));
    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}
