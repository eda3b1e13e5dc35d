use std::time::Duration;

use axum::response::sse;
use serde_json::Value;

/// Event type carried by injected mid-stream failures.
pub const ERROR_EVENT: &str = "error";
/// Control frame sent when a connection attaches without a last-seen id.
pub const CONNECTED_EVENT: &str = "connected";
/// Control frame sent after buffered history has been replayed.
pub const RESUMED_EVENT: &str = "resumed";
/// Control frame sent when a supplied last-seen id is outside the replay window.
pub const NOT_FOUND_EVENT: &str = "not_found";

/// Data carried by an event: structured JSON for generated events and
/// control frames, raw text for plain and base64 chunk bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Json(_) => None,
            Payload::Text(text) => Some(text),
        }
    }

    /// The exact bytes written after `data:` on the wire.
    pub fn wire_data(&self) -> String {
        match self {
            Payload::Json(value) => value.to_string(),
            Payload::Text(text) => text.clone(),
        }
    }
}

/// An immutable buffered stream event. Ids are assigned once, strictly
/// increasing within a stream, and never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: u64,
    pub event_type: Option<String>,
    pub payload: Payload,
}

impl Event {
    pub fn frame(&self) -> Frame {
        Frame {
            id: Some(self.id),
            event_type: self.event_type.clone(),
            retry: None,
            payload: self.payload.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.event_type.as_deref() == Some(ERROR_EVENT)
    }
}

/// One unit written to the wire. Substantive events become frames carrying
/// their id; control frames carry no id so a client's `Last-Event-ID` state
/// is never disturbed by protocol signaling.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: Option<u64>,
    pub event_type: Option<String>,
    pub retry: Option<Duration>,
    pub payload: Payload,
}

impl Frame {
    pub fn into_sse(self) -> sse::Event {
        let mut event = sse::Event::default();
        if let Some(id) = self.id {
            event = event.id(id.to_string());
        }
        if let Some(name) = &self.event_type {
            event = event.event(name);
        }
        if let Some(retry) = self.retry {
            event = event.retry(retry);
        }
        event.data(self.payload.wire_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substantive_events_become_frames_with_their_id() {
        let event = Event {
            id: 7,
            event_type: Some("tick".to_string()),
            payload: Payload::Json(json!({"sequence": 7})),
        };
        let frame = event.frame();
        assert_eq!(frame.id, Some(7));
        assert_eq!(frame.event_type.as_deref(), Some("tick"));
        assert_eq!(frame.retry, None);
    }

    #[test]
    fn json_payloads_serialize_to_a_single_wire_line() {
        let payload = Payload::Json(json!({"sequence": 1, "stream": "default"}));
        let data = payload.wire_data();
        assert!(!data.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&data).unwrap()["sequence"], 1);
    }

    #[test]
    fn text_payloads_pass_through_untouched() {
        let payload = Payload::Text("abc123".to_string());
        assert_eq!(payload.wire_data(), "abc123");
        assert_eq!(payload.as_text(), Some("abc123"));
        assert!(payload.as_json().is_none());
    }

    #[test]
    fn error_events_are_distinguished_by_type() {
        let event = Event {
            id: 3,
            event_type: Some(ERROR_EVENT.to_string()),
            payload: Payload::Json(json!({})),
        };
        assert!(event.is_error());
    }
}
