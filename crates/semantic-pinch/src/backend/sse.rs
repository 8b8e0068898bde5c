//! Shared `text/event-stream` handling.
//!
//! Frames are `data: <payload>\n\n`; the stream must end with `data: [DONE]`.
//! Each backend supplies a decoder that maps one payload to an optional
//! fragment.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Response;
use tracing::trace;

use super::FragmentStream;
use crate::errors::TransformError;

/// End-of-stream marker.
pub const DONE_MARKER: &str = "[DONE]";

/// Turn non-success responses into `Http` errors carrying the body text.
pub async fn check_status(response: Response) -> Result<Response, TransformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransformError::Http {
        status: status.as_u16(),
        body,
    })
}

/// Adapt an event-stream response into a fragment stream.
///
/// `decode` returns `Ok(None)` for payloads that carry no text (keep-alives,
/// role deltas). The stream ends cleanly only at `[DONE]`; a close before it
/// or any decode error yields one final `Err` item.
pub fn fragment_stream<F>(response: Response, decode: F) -> FragmentStream
where
    F: Fn(&str) -> Result<Option<String>, TransformError> + Send + 'static,
{
    let events = response.bytes_stream().eventsource().boxed();

    futures::stream::unfold(Some((events, decode)), |state| async move {
        let (mut events, decode) = state?;
        loop {
            let event = match events.next().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    let err = TransformError::Transport(format!("event stream error: {e}"));
                    return Some((Err(err), None));
                }
                None => {
                    let err = TransformError::Transport(
                        "event stream closed before [DONE]".to_string(),
                    );
                    return Some((Err(err), None));
                }
            };

            trace!(data = %event.data, "SSE event");
            if event.data == DONE_MARKER {
                return None;
            }
            match decode(&event.data) {
                Ok(Some(fragment)) => return Some((Ok(fragment), Some((events, decode)))),
                Ok(None) => continue,
                Err(e) => return Some((Err(e), None)),
            }
        }
    })
    .boxed()
}
