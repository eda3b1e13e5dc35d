//! The chunked-transfer variant of the engine.
//!
//! Structurally the same machinery as the periodic generator — same
//! registry, stream, buffer, and tail types on a separate registry instance
//! — but producing fixed-size synthetic chunks tracked against a total byte
//! target instead of timed JSON events against an event count. Chunks ride
//! the same wire framing keyed by chunk id, which is what lets reconnecting
//! clients resume them exactly like events.
//!
//! Reclamation also differs: chunk streams are never touched by the
//! periodic sweep. Each one carries a single-shot expiry deadline that every
//! emitted chunk pushes forward; a watchdog task retires the stream when the
//! deadline lapses.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::*;
use rand::distr::{Alphanumeric, SampleString};
use rand::Rng;
use serde_json::json;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

use crate::config::{ChunkFormat, ChunkStreamConfig};
use crate::event::{Event, Payload};
use crate::registry::Registry;
use crate::stream::{Phase, Stream};

enum Tick {
    Continue,
    Finished,
}

/// Schedule the chunk generator and its expiry watchdog for `stream` unless
/// one is already scheduled. One producer per stream, no matter how many
/// connections watch it.
pub fn ensure_running(
    registry: &Arc<Registry<ChunkStreamConfig>>,
    stream: &Arc<Stream<ChunkStreamConfig>>,
    ttl: Duration,
) {
    let mut state = stream.state();
    if state.phase != Phase::Live || state.generator.is_some() {
        return;
    }
    state.expires_at = Some(Instant::now() + ttl);
    let task = tokio::spawn(run(registry.clone(), stream.clone(), ttl));
    state.generator = Some(task.abort_handle());
    tokio::spawn(watchdog(registry.clone(), stream.clone()));
    debug!("scheduled chunk generator for stream {}", stream.id());
}

async fn run(
    registry: Arc<Registry<ChunkStreamConfig>>,
    stream: Arc<Stream<ChunkStreamConfig>>,
    ttl: Duration,
) {
    let config = stream.state().config.clone();
    let mut ticker = time::interval(config.delay);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    let mut sent: u64 = 0;
    loop {
        ticker.tick().await;
        if let Tick::Finished = step(&registry, &stream, &config, ttl, &mut sent) {
            break;
        }
    }
}

fn step(
    registry: &Arc<Registry<ChunkStreamConfig>>,
    stream: &Arc<Stream<ChunkStreamConfig>>,
    config: &ChunkStreamConfig,
    ttl: Duration,
    sent: &mut u64,
) -> Tick {
    if *sent >= config.total_bytes {
        info!(
            "chunk stream {} reached its {} byte target, closing",
            stream.id(),
            config.total_bytes
        );
        registry.retire(stream);
        return Tick::Finished;
    }

    let size = (config.total_bytes - *sent).min(config.chunk_size as u64) as usize;
    let mut state = stream.state();
    state.produced += 1;
    state.last_id += 1;
    let id = state.last_id;
    let now = Instant::now();
    state.last_activity = now;
    state.expires_at = Some(now + ttl);
    state.buffer.push(Arc::new(Event {
        id,
        event_type: None,
        payload: synthesize(config.format, id, size),
    }));
    drop(state);

    stream.notify();
    *sent += size as u64;
    Tick::Continue
}

/// Build one chunk body of `size` synthetic bytes in the requested format.
/// The raw synthetic bytes are what count toward the stream's byte target;
/// encoding overhead does not.
fn synthesize(format: ChunkFormat, id: u64, size: usize) -> Payload {
    match format {
        ChunkFormat::Plain => Payload::Text(Alphanumeric.sample_string(&mut rand::rng(), size)),
        ChunkFormat::Base64 => {
            let mut bytes = vec![0u8; size];
            rand::rng().fill_bytes(&mut bytes);
            Payload::Text(BASE64.encode(bytes))
        }
        ChunkFormat::JsonLines => Payload::Json(json!({
            "chunk": id,
            "size": size,
            "data": Alphanumeric.sample_string(&mut rand::rng(), size),
        })),
    }
}

/// Single-shot expiry loop: sleeps until the current deadline and retires
/// the stream if no chunk has pushed it forward in the meantime.
async fn watchdog(registry: Arc<Registry<ChunkStreamConfig>>, stream: Arc<Stream<ChunkStreamConfig>>) {
    loop {
        let deadline = {
            let state = stream.state();
            if state.phase == Phase::Closed {
                return;
            }
            state.expires_at
        };
        let Some(deadline) = deadline else { return };

        time::sleep_until(deadline).await;

        let expired = {
            let state = stream.state();
            if state.phase == Phase::Closed {
                return;
            }
            state.expires_at.is_some_and(|current| current <= Instant::now())
        };
        if expired {
            info!("chunk stream {} expired, reclaiming", stream.id());
            registry.retire(&stream);
            return;
        }
    }
}
