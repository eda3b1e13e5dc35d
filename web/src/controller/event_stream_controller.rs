use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use log::*;
use service::AppState;

use crate::error::Error;
use crate::extractors::last_event_id::LastEventId;
use crate::params::event_stream::EventStreamParams;
use engine::generator;
use engine::tail::{self, AttachOptions};

/// GET a periodic stream of synthetic server-sent events.
///
/// The first request for a stream identifier creates it and locks its
/// generation parameters; concurrent and later viewers share the same
/// generator and replay buffer. Supplying a last-seen id (header or query)
/// replays exactly the missed events before following live.
#[utoipa::path(
    get,
    path = "/events",
    params(EventStreamParams),
    responses(
        (status = 200, description = "A stream of synthetic events", content_type = "text/event-stream"),
        (status = 422, description = "Unprocessable Entity")
    )
)]
pub async fn events(
    State(app_state): State<AppState>,
    LastEventId(header_id): LastEventId,
    Query(params): Query<EventStreamParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error> {
    let config = params.to_config(&app_state.config);
    config.validate()?;
    let last_event_id = header_id.or(params.last_event_id);

    debug!(
        "GET /events for stream {} (last_event_id={last_event_id:?})",
        params.stream_id()
    );

    let (stream, _created) = app_state
        .event_streams
        .get_or_create(params.stream_id(), config);
    generator::ensure_running(&app_state.event_streams, &stream);

    let options = AttachOptions {
        last_event_id,
        retry: params.retry_hint(),
    };
    let frames = tail::follow(stream, options).map(|frame| Ok::<_, Infallible>(frame.into_sse()));
    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}
