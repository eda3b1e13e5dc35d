//! Error types for the stream engine.
use std::error::Error as StdError;
use std::fmt;

/// Top-level engine error. The `kind` is what callers dispatch on: the web
/// layer translates kinds into HTTP status codes for failures that happen
/// before a connection enters streaming mode. Failures after headers are
/// committed are never represented here; those travel as named events over
/// the open stream.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The addressed stream identifier is not registered.
    StreamNotFound,
    /// Rejected configuration, with a caller-facing explanation.
    InvalidConfig(String),
}

impl Error {
    pub fn stream_not_found() -> Self {
        Self {
            kind: ErrorKind::StreamNotFound,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidConfig(message.into()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ErrorKind::StreamNotFound => write!(f, "stream not found"),
            ErrorKind::InvalidConfig(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl StdError for Error {}
