use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use log::*;
use serde_json::{json, Value};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::EventStreamConfig;
use crate::event::{Event, Payload, ERROR_EVENT};
use crate::registry::Registry;
use crate::stream::{Phase, Stream};

/// Bytes of filler attached to each payload when inflation is requested.
pub const FILLER_BYTES: usize = 1024 * 1024;

enum Tick {
    Continue,
    Finished,
}

/// Schedule the generator for `stream` unless one is already scheduled or
/// the stream can no longer produce. Exactly one generator runs per stream
/// no matter how many connections are watching: attaching a viewer is what
/// triggers this, but the producer's cadence is entirely its own.
pub fn ensure_running(
    registry: &Arc<Registry<EventStreamConfig>>,
    stream: &Arc<Stream<EventStreamConfig>>,
) {
    let mut state = stream.state();
    if state.phase != Phase::Live || state.generator.is_some() {
        return;
    }
    let task = tokio::spawn(run(registry.clone(), stream.clone()));
    state.generator = Some(task.abort_handle());
    debug!("scheduled generator for stream {}", stream.id());
}

async fn run(registry: Arc<Registry<EventStreamConfig>>, stream: Arc<Stream<EventStreamConfig>>) {
    let period = stream.state().config.interval;
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval() completes its first tick immediately; consume it so the
    // first event lands one full period after the stream is created.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if let Tick::Finished = step(&registry, &stream) {
            break;
        }
    }
}

/// One generator tick: terminal check, synthesis, failure injection, append.
fn step(
    registry: &Arc<Registry<EventStreamConfig>>,
    stream: &Arc<Stream<EventStreamConfig>>,
) -> Tick {
    let mut state = stream.state();
    let config = state.config.clone();

    if let Some(max) = config.max_events {
        if state.produced >= max {
            drop(state);
            info!("stream {} produced its {max} events, closing", stream.id());
            registry.retire(stream);
            return Tick::Finished;
        }
    }

    state.produced += 1;
    state.last_id += 1;
    state.last_activity = Instant::now();
    let id = state.last_id;
    let sequence = state.produced;

    let failing = config.error_at == Some(sequence);
    let event = if failing {
        // Response headers are long committed for attached viewers, so the
        // failure travels as a named event, never as a status change. The
        // stream itself stays registered: history remains inspectable.
        state.phase = Phase::Halted;
        state.generator = None;
        Event {
            id,
            event_type: Some(ERROR_EVENT.to_string()),
            payload: Payload::Json(error_payload(stream.id(), sequence)),
        }
    } else {
        Event {
            id,
            event_type: config.event_type.clone(),
            payload: Payload::Json(event_payload(stream.id(), sequence, config.inflate_payload)),
        }
    };
    state.buffer.push(Arc::new(event));
    drop(state);

    stream.notify();

    if failing {
        warn!(
            "stream {}: injected failure at event {sequence}, generator halted",
            stream.id()
        );
        Tick::Finished
    } else {
        Tick::Continue
    }
}

fn event_payload(stream_id: &str, sequence: u64, inflate: bool) -> Value {
    let mut payload = json!({
        "stream": stream_id,
        "sequence": sequence,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    });
    if inflate {
        payload["filler"] = Value::String("x".repeat(FILLER_BYTES));
    }
    payload
}

fn error_payload(stream_id: &str, sequence: u64) -> Value {
    json!({
        "stream": stream_id,
        "sequence": sequence,
        "message": "simulated upstream failure",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    fn fast(max_events: Option<u64>) -> EventStreamConfig {
        EventStreamConfig {
            interval: Duration::from_millis(10),
            max_events,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn produces_monotonic_ids_then_self_terminates() {
        let registry = Arc::new(Registry::new(16));
        let (stream, _) = registry.get_or_create("finite", fast(Some(3)));
        ensure_running(&registry, &stream);

        sleep(Duration::from_millis(100)).await;

        assert!(registry.get("finite").is_none());
        let state = stream.state();
        assert_eq!(state.phase, Phase::Closed);
        assert_eq!(state.produced, 3);
        assert_eq!(state.last_id, 3);
        let ids: Vec<u64> = state.buffer.after(0).iter().map(|event| event.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        drop(state);

        // Reconnecting after termination is a brand-new stream under the
        // same identifier.
        let (reborn, created) = registry.get_or_create("finite", fast(Some(3)));
        assert!(created);
        assert_eq!(reborn.state().last_id, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn injected_failure_halts_without_discarding_history() {
        let registry = Arc::new(Registry::new(16));
        let config = EventStreamConfig {
            error_at: Some(2),
            ..fast(None)
        };
        let (stream, _) = registry.get_or_create("flaky", config);
        ensure_running(&registry, &stream);

        sleep(Duration::from_millis(100)).await;

        // Still registered: the failure halts generation, not inspection.
        assert!(registry.get("flaky").is_some());
        let state = stream.state();
        assert_eq!(state.phase, Phase::Halted);
        assert_eq!(state.produced, 2);
        assert!(state.generator.is_none());
        let events = state.buffer.after(0);
        assert_eq!(events.len(), 2);
        assert!(!events[0].is_error());
        assert!(events[1].is_error());
        assert_eq!(events[1].id, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn at_most_one_generator_per_stream() {
        let registry = Arc::new(Registry::new(16));
        let (stream, _) = registry.get_or_create("solo", fast(None));
        ensure_running(&registry, &stream);
        ensure_running(&registry, &stream);
        ensure_running(&registry, &stream);

        sleep(Duration::from_millis(25)).await;

        // Ticks at 10ms and 20ms: doubled producers would have doubled this.
        assert_eq!(stream.state().produced, 2);
        registry.delete("solo");
    }

    #[tokio::test(start_paused = true)]
    async fn inflated_payloads_carry_the_filler_field() {
        let registry = Arc::new(Registry::new(16));
        let config = EventStreamConfig {
            inflate_payload: true,
            max_events: Some(1),
            ..fast(None)
        };
        let (stream, _) = registry.get_or_create("large", config);
        ensure_running(&registry, &stream);

        sleep(Duration::from_millis(50)).await;

        let state = stream.state();
        let events = state.buffer.after(0);
        let payload = events[0].payload.as_json().unwrap();
        assert_eq!(payload["sequence"], 1);
        assert_eq!(payload["filler"].as_str().unwrap().len(), FILLER_BYTES);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_event_type_is_attached_to_every_event() {
        let registry = Arc::new(Registry::new(16));
        let config = EventStreamConfig {
            event_type: Some("heartbeat".to_string()),
            max_events: Some(2),
            ..fast(None)
        };
        let (stream, _) = registry.get_or_create("typed", config);
        ensure_running(&registry, &stream);

        sleep(Duration::from_millis(100)).await;

        let state = stream.state();
        for event in state.buffer.after(0) {
            assert_eq!(event.event_type.as_deref(), Some("heartbeat"));
        }
    }
}
