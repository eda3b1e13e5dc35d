use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::*;

use crate::stream::{Phase, Stream};

/// Snapshot of one registered stream, for observability listings.
#[derive(Debug, Clone)]
pub struct StreamSummary {
    pub id: String,
    pub phase: Phase,
    pub produced: u64,
    pub last_id: u64,
    pub buffered: usize,
    pub generator_scheduled: bool,
}

/// Report returned when a stream is removed.
#[derive(Debug, Clone)]
pub struct RetiredStream {
    pub id: String,
    /// Whether a generator was still running at removal time.
    pub was_live: bool,
    pub produced: u64,
    pub last_id: u64,
}

/// Mapping from stream identifier to live stream.
///
/// One instance per variant is owned by the serving process' state — the
/// registry is lifecycle-scoped, never a process-wide global. Its only
/// mutation surface is get-or-create and removal.
pub struct Registry<C> {
    streams: DashMap<String, Arc<Stream<C>>>,
    buffer_capacity: usize,
}

impl<C: PartialEq + fmt::Debug> Registry<C> {
    /// `buffer_capacity` bounds the replay buffer of every stream created
    /// through this registry.
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            streams: DashMap::new(),
            buffer_capacity,
        }
    }

    /// Returns the stream registered under `id`, creating it with `config`
    /// when absent. Creation is atomic with respect to concurrent
    /// first-connects: exactly one state is ever created per identifier.
    ///
    /// When the stream already exists and `config` differs from the locked
    /// value, the mismatch is logged and the original configuration keeps
    /// governing. The boolean reports whether this call created the stream.
    pub fn get_or_create(&self, id: &str, config: C) -> (Arc<Stream<C>>, bool) {
        let stream = match self.streams.entry(id.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let stream = Arc::new(Stream::new(id, config, self.buffer_capacity));
                entry.insert(stream.clone());
                info!("created stream {id}");
                return (stream, true);
            }
        };

        // The map shard is released above; only now touch the stream's own
        // lock.
        let state = stream.state();
        if state.config != config {
            warn!(
                "stream {id}: requested configuration {config:?} differs from locked {:?}; keeping the original",
                state.config
            );
        }
        drop(state);

        (stream, false)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Stream<C>>> {
        self.streams.get(id).map(|entry| entry.value().clone())
    }

    /// Administrative removal: cancels the generator, closes the stream so
    /// attached tails observe it as gone, and reports what it produced.
    pub fn delete(&self, id: &str) -> Option<RetiredStream> {
        let stream = self.get(id)?;
        let retired = self.retire(&stream);
        info!(
            "deleted stream {id} (was_live={}, produced={}, last_id={})",
            retired.was_live, retired.produced, retired.last_id
        );
        Some(retired)
    }

    /// Close `stream` and unlink it from the map. Removal is by identity so
    /// a stale handle can never unlink a newer stream reusing the same
    /// identifier.
    pub(crate) fn retire(&self, stream: &Arc<Stream<C>>) -> RetiredStream {
        self.streams
            .remove_if(stream.id(), |_, current| Arc::ptr_eq(current, stream));

        let mut state = stream.state();
        let was_live = state.phase == Phase::Live && state.generator.is_some();
        if let Some(generator) = state.generator.take() {
            generator.abort();
        }
        state.phase = Phase::Closed;
        state.expires_at = None;
        let retired = RetiredStream {
            id: stream.id().to_string(),
            was_live,
            produced: state.produced,
            last_id: state.last_id,
        };
        drop(state);

        stream.notify();
        retired
    }

    pub fn list(&self) -> Vec<StreamSummary> {
        let mut summaries: Vec<StreamSummary> = self
            .streams
            .iter()
            .map(|entry| {
                let stream = entry.value();
                let state = stream.state();
                StreamSummary {
                    id: stream.id().to_string(),
                    phase: state.phase,
                    produced: state.produced,
                    last_id: state.last_id,
                    buffered: state.buffer.len(),
                    generator_scheduled: state.generator.is_some(),
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<Stream<C>>> {
        self.streams.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
