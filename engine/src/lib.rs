//! The shared stream engine behind the sandbox's SSE endpoints.
//!
//! This crate decouples event *generation* from event *delivery*: one
//! timer-driven producer runs per logical stream identifier, while any
//! number of concurrent connections watch that stream, each at its own
//! pace. A bounded replay buffer per stream makes reconnection with a
//! last-seen id cheap and exact.
//!
//! # Architecture
//!
//! - **One generator per stream**: viewers never multiply producers. The
//!   first connection to an identifier creates the stream and locks its
//!   generation parameters; every later viewer shares the same generator
//!   and buffer.
//! - **Bounded replay**: each stream retains a FIFO window of its history.
//!   Resuming inside the window replays exactly the missed events; resuming
//!   outside it is answered honestly with a `not_found` control frame and a
//!   live cursor — never a guessed splice.
//! - **Push-based tails**: connections sleep on a per-stream watch channel
//!   and drain everything newer than their cursor when the generator
//!   publishes. No polling, no idle wake-ups.
//! - **Per-stream locking**: all mutable state for one stream sits behind
//!   one mutex with short synchronous critical sections. Streams share
//!   nothing with each other; registry shard locks are never held while a
//!   stream's own lock is taken.
//! - **Two reclamation paths**: periodic streams are retired by the
//!   [`sweeper`] once idle past a threshold; chunk streams carry their own
//!   single-shot deadline that every emitted chunk pushes forward.
//!
//! # Connection Flow
//!
//! 1. A handler resolves the stream via [`registry::Registry::get_or_create`]
//! 2. [`generator::ensure_running`] (or [`chunk::ensure_running`]) schedules
//!    the producer if the stream doesn't have one
//! 3. [`tail::follow`] performs the resumption handshake against the replay
//!    buffer, then follows the stream live, yielding wire [`event::Frame`]s
//! 4. Client disconnects drop the tail and nothing else; the stream remains
//!    for other viewers and later reconnects until it terminates, expires,
//!    or is deleted

pub mod buffer;
pub mod chunk;
pub mod config;
pub mod error;
pub mod event;
pub mod generator;
pub mod registry;
pub mod stream;
pub mod sweeper;
pub mod tail;

pub use config::{ChunkFormat, ChunkStreamConfig, EventStreamConfig, DEFAULT_STREAM_ID};
pub use error::{Error, ErrorKind};
pub use event::{Event, Frame, Payload};
pub use registry::{Registry, RetiredStream, StreamSummary};
pub use stream::{Phase, Stream, StreamState};
pub use tail::AttachOptions;
