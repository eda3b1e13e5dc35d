use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::buffer::ReplayBuffer;

/// Lifecycle of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Generator scheduled or schedulable; more events may come.
    Live,
    /// Generator stopped by an injected failure. History stays readable
    /// until the stream expires or is deleted.
    Halted,
    /// Terminal: the limit was reached, the stream was deleted, or it
    /// expired. Attached tails drain what is buffered and end.
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Phase::Live => write!(f, "live"),
            Phase::Halted => write!(f, "halted"),
            Phase::Closed => write!(f, "closed"),
        }
    }
}

/// Mutable record owned by one stream identifier. Only ever touched through
/// the owning [`Stream`]'s lock.
#[derive(Debug)]
pub struct StreamState<C> {
    pub buffer: ReplayBuffer,
    /// Last assigned event id; the source of truth for id monotonicity.
    pub last_id: u64,
    /// Substantive events produced. Control frames are never counted.
    pub produced: u64,
    pub phase: Phase,
    /// Locked at creation by the first requester.
    pub config: C,
    /// Updated on connect, reconnect, and every generated event.
    pub last_activity: Instant,
    /// Present iff a generator task is currently scheduled.
    pub generator: Option<AbortHandle>,
    /// Single-shot expiry deadline, pushed forward on every emitted chunk.
    /// Periodic streams are reclaimed by the sweeper instead and keep this
    /// `None`.
    pub expires_at: Option<Instant>,
}

/// One logical stream: state behind a per-stream lock, plus a watch channel
/// that wakes attached tails after every append and lifecycle change.
///
/// There is exactly one writer (the generator) and any number of readers
/// (tails, the sweeper, admin calls); every mutation is serialized behind
/// the lock, so readers scanning the buffer by id never observe a partial
/// append.
#[derive(Debug)]
pub struct Stream<C> {
    id: String,
    state: Mutex<StreamState<C>>,
    publish: watch::Sender<u64>,
}

impl<C> Stream<C> {
    pub fn new(id: impl Into<String>, config: C, buffer_capacity: usize) -> Self {
        let (publish, _) = watch::channel(0);
        Self {
            id: id.into(),
            state: Mutex::new(StreamState {
                buffer: ReplayBuffer::new(buffer_capacity),
                last_id: 0,
                produced: 0,
                phase: Phase::Live,
                config,
                last_activity: Instant::now(),
                generator: None,
                expires_at: None,
            }),
            publish,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Exclusive access to the mutable state. Critical sections stay short
    /// and synchronous; the guard is never held across an await point.
    pub fn state(&self) -> MutexGuard<'_, StreamState<C>> {
        self.state.lock().expect("stream state lock poisoned")
    }

    /// Wake every attached tail.
    pub fn notify(&self) {
        let last_id = self.state().last_id;
        let _ = self.publish.send(last_id);
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.publish.subscribe()
    }
}
