use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::Error;
use engine::error::Error as EngineError;

/// The id of the last event a reconnecting client saw, taken from the
/// standard `Last-Event-ID` request header. Absent on fresh connects;
/// browsers set it automatically when `EventSource` reconnects.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LastEventId(pub(crate) Option<u64>);

#[async_trait]
impl<S> FromRequestParts<S> for LastEventId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get("last-event-id") else {
            return Ok(Self(None));
        };
        let id = value
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                EngineError::invalid_config("Last-Event-ID header must be an unsigned integer")
            })?;
        Ok(Self(Some(id)))
    }
}
