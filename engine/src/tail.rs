use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use log::*;
use serde_json::json;
use tokio::time::Instant;
use uuid::Uuid;

use crate::event::{Frame, Payload, CONNECTED_EVENT, NOT_FOUND_EVENT, RESUMED_EVENT};
use crate::stream::{Phase, Stream};

/// Per-connection attach parameters.
#[derive(Debug, Clone, Default)]
pub struct AttachOptions {
    /// Id of the last event the client saw, when resuming.
    pub last_event_id: Option<u64>,
    /// Reconnection-delay hint echoed to this client on attach.
    pub retry: Option<Duration>,
}

enum Handshake {
    Connected,
    Resumed { from: u64 },
    NotFound { requested: u64 },
}

/// Attach one connection to `stream`: perform the resumption handshake,
/// then follow the buffer live, delivering unseen events in increasing id
/// order until the client goes away or the stream closes.
///
/// Dropping the returned stream cancels exactly this connection; the
/// generator, the buffer, and sibling connections are untouched. Wake-ups
/// are push-based: the tail sleeps on the stream's watch channel and drains
/// everything newer than its cursor whenever the generator publishes.
pub fn follow<C>(
    stream: Arc<Stream<C>>,
    options: AttachOptions,
) -> impl futures::Stream<Item = Frame>
where
    C: Send + Sync + 'static,
{
    stream! {
        let connection = Uuid::new_v4();
        let mut watcher = stream.subscribe();

        let (mut cursor, replay, handshake) = {
            let mut state = stream.state();
            state.last_activity = Instant::now();
            match options.last_event_id {
                None => (state.last_id, Vec::new(), Handshake::Connected),
                Some(seen) if state.buffer.contains(seen) => {
                    let replay = state.buffer.after(seen);
                    let cursor = replay.last().map(|event| event.id).unwrap_or(state.last_id);
                    (cursor, replay, Handshake::Resumed { from: seen })
                }
                // Evicted or never issued: no guessing, no partial splice.
                Some(seen) => (state.last_id, Vec::new(), Handshake::NotFound { requested: seen }),
            }
        };

        debug!(
            "connection {connection} attached to stream {} at cursor {cursor}",
            stream.id()
        );

        match handshake {
            Handshake::Connected => {
                yield connected_frame(stream.id(), options.retry);
            }
            Handshake::Resumed { from } => {
                let replayed = replay.len();
                for event in replay {
                    yield event.frame();
                }
                yield resumed_frame(stream.id(), from, replayed);
            }
            Handshake::NotFound { requested } => {
                yield not_found_frame(stream.id(), requested);
            }
        }

        loop {
            let (fresh, phase) = {
                let state = stream.state();
                (state.buffer.after(cursor), state.phase)
            };
            for event in fresh {
                cursor = event.id;
                yield event.frame();
            }
            if phase == Phase::Closed {
                break;
            }
            if watcher.changed().await.is_err() {
                break;
            }
        }

        debug!("connection {connection} detached from stream {}", stream.id());
    }
}

fn connected_frame(stream_id: &str, retry: Option<Duration>) -> Frame {
    Frame {
        id: None,
        event_type: Some(CONNECTED_EVENT.to_string()),
        retry,
        payload: Payload::Json(json!({ "stream": stream_id })),
    }
}

fn resumed_frame(stream_id: &str, from: u64, replayed: usize) -> Frame {
    Frame {
        id: None,
        event_type: Some(RESUMED_EVENT.to_string()),
        retry: None,
        payload: Payload::Json(json!({
            "stream": stream_id,
            "resumed_from": from,
            "replayed": replayed,
        })),
    }
}

fn not_found_frame(stream_id: &str, requested: u64) -> Frame {
    Frame {
        id: None,
        event_type: Some(NOT_FOUND_EVENT.to_string()),
        retry: None,
        payload: Payload::Json(json!({
            "stream": stream_id,
            "requested": requested,
            "message": "last seen id is outside the replay window; resuming live",
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventStreamConfig;
    use crate::generator;
    use crate::registry::Registry;
    use futures::StreamExt;
    use tokio::time::{sleep, Duration};

    fn fast(max_events: Option<u64>) -> EventStreamConfig {
        EventStreamConfig {
            interval: Duration::from_millis(10),
            max_events,
            ..Default::default()
        }
    }

    fn ids(frames: &[Frame]) -> Vec<u64> {
        frames.iter().filter_map(|frame| frame.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_connect_yields_connected_then_every_event() {
        let registry = Arc::new(Registry::new(16));
        let (stream, _) = registry.get_or_create("fresh", fast(Some(3)));
        generator::ensure_running(&registry, &stream);

        let options = AttachOptions {
            retry: Some(Duration::from_millis(1500)),
            ..Default::default()
        };
        let frames: Vec<Frame> = follow(stream, options).collect().await;

        assert_eq!(frames[0].event_type.as_deref(), Some(CONNECTED_EVENT));
        assert_eq!(frames[0].id, None);
        assert_eq!(frames[0].retry, Some(Duration::from_millis(1500)));
        assert_eq!(ids(&frames), vec![1, 2, 3]);
        assert_eq!(frames.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn resuming_replays_exactly_the_missed_events_once() {
        let registry = Arc::new(Registry::new(16));
        let (stream, _) = registry.get_or_create("resume", fast(Some(5)));
        generator::ensure_running(&registry, &stream);
        sleep(Duration::from_millis(100)).await;

        let options = AttachOptions {
            last_event_id: Some(2),
            ..Default::default()
        };
        let frames: Vec<Frame> = follow(stream, options).collect().await;

        assert_eq!(ids(&frames), vec![3, 4, 5]);
        let resumed = frames.last().unwrap();
        assert_eq!(resumed.event_type.as_deref(), Some(RESUMED_EVENT));
        let payload = resumed.payload.as_json().unwrap();
        assert_eq!(payload["resumed_from"], 2);
        assert_eq!(payload["replayed"], 3);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_and_resume_misses_nothing_and_duplicates_nothing() {
        let registry = Arc::new(Registry::new(16));
        let (stream, _) = registry.get_or_create("comeback", fast(Some(8)));
        generator::ensure_running(&registry, &stream);

        // First viewer takes the handshake plus events 1-3, then goes away.
        let first: Vec<Frame> = follow(stream.clone(), AttachOptions::default())
            .take(4)
            .collect()
            .await;
        assert_eq!(ids(&first), vec![1, 2, 3]);

        sleep(Duration::from_millis(200)).await;

        let options = AttachOptions {
            last_event_id: Some(3),
            ..Default::default()
        };
        let second: Vec<Frame> = follow(stream, options).collect().await;
        assert_eq!(ids(&second), vec![4, 5, 6, 7, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_last_id_yields_not_found_and_no_replay() {
        let registry = Arc::new(Registry::new(16));
        let (stream, _) = registry.get_or_create("miss", fast(Some(3)));
        generator::ensure_running(&registry, &stream);
        sleep(Duration::from_millis(100)).await;

        let options = AttachOptions {
            last_event_id: Some(999),
            ..Default::default()
        };
        let frames: Vec<Frame> = follow(stream, options).collect().await;

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event_type.as_deref(), Some(NOT_FOUND_EVENT));
        assert_eq!(frames[0].payload.as_json().unwrap()["requested"], 999);
    }

    #[tokio::test(start_paused = true)]
    async fn ids_evicted_from_the_window_take_the_not_found_path() {
        let registry = Arc::new(Registry::new(4));
        let (stream, _) = registry.get_or_create("evicted", fast(Some(8)));
        generator::ensure_running(&registry, &stream);
        sleep(Duration::from_millis(200)).await;

        // Only 5..=8 are retained; 2 was real once but is gone.
        let options = AttachOptions {
            last_event_id: Some(2),
            ..Default::default()
        };
        let frames: Vec<Frame> = follow(stream, options).collect().await;
        assert_eq!(frames[0].event_type.as_deref(), Some(NOT_FOUND_EVENT));
        assert!(ids(&frames).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_viewers_see_the_same_sequence() {
        let registry = Arc::new(Registry::new(16));
        let (stream, _) = registry.get_or_create("shared", fast(Some(4)));
        generator::ensure_running(&registry, &stream);

        let left = tokio::spawn(follow(stream.clone(), AttachOptions::default()).collect::<Vec<Frame>>());
        let right = tokio::spawn(follow(stream.clone(), AttachOptions::default()).collect::<Vec<Frame>>());

        let left = left.await.unwrap();
        let right = right.await.unwrap();
        assert_eq!(ids(&left), vec![1, 2, 3, 4]);
        assert_eq!(ids(&left), ids(&right));
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_the_stream_ends_attached_tails() {
        let registry = Arc::new(Registry::new(16));
        let (stream, _) = registry.get_or_create("cut", fast(None));
        generator::ensure_running(&registry, &stream);

        let tail = tokio::spawn(follow(stream, AttachOptions::default()).collect::<Vec<Frame>>());
        sleep(Duration::from_millis(25)).await;
        registry.delete("cut");

        let frames = tail.await.unwrap();
        assert_eq!(ids(&frames), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn halted_streams_keep_tails_attached_but_quiet() {
        let registry = Arc::new(Registry::new(16));
        let config = EventStreamConfig {
            error_at: Some(2),
            ..fast(None)
        };
        let (stream, _) = registry.get_or_create("quiet", config);
        generator::ensure_running(&registry, &stream);

        // connected + event 1 + error event; the tail then idles rather
        // than ending, because the stream is halted, not closed.
        let mut tail = Box::pin(follow(stream.clone(), AttachOptions::default()));
        let mut frames = Vec::new();
        for _ in 0..3 {
            frames.push(tail.next().await.unwrap());
        }
        assert!(frames[2].event_type.as_deref() == Some(crate::event::ERROR_EVENT));

        registry.delete("quiet");
        assert!(tail.next().await.is_none());
    }
}
