use serde_json::Value;

use crate::events::{Citation, StreamEvent};

/// Line prefix marking one event record in the response stream.
const DATA_PREFIX: &str = "data: ";
/// Sentinel payload that terminates the stream.
const DONE_MARKER: &str = "[DONE]";

/// Incremental decoder for the newline-delimited `data: <json>` chat stream.
///
/// Chunk boundaries are not guaranteed to align with record boundaries, so an
/// incomplete trailing line is buffered until the next chunk completes it.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: String,
}

impl SseDecoder {
    /// Creates a decoder with an empty carry-over buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes every complete record contained in `chunk` plus carried text.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.pending.push_str(&String::from_utf8_lossy(chunk));

        let mut events = Vec::new();
        while let Some(newline_index) = self.pending.find('\n') {
            let line = self.pending[..newline_index].to_string();
            self.pending.drain(..=newline_index);

            if let Some(event) = decode_line(&line) {
                events.push(event);
            }
        }

        events
    }

    /// Decodes whatever is still buffered once the byte stream has ended.
    pub fn finish(mut self) -> Option<StreamEvent> {
        let line = std::mem::take(&mut self.pending);
        decode_line(&line)
    }
}

fn decode_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload == DONE_MARKER {
        return Some(StreamEvent::Done);
    }

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(error) => {
            // One corrupt record must not abort the rest of the stream.
            tracing::warn!(error = %error, "skipping malformed chat stream record");
            return None;
        }
    };

    match value.get("type").and_then(Value::as_str) {
        Some("content") => {
            let fragment = value
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(StreamEvent::ContentDelta(fragment))
        }
        Some("citations") => {
            let citations = value
                .get("citations")
                .cloned()
                .map(|raw| serde_json::from_value::<Vec<Citation>>(raw).unwrap_or_default())
                .unwrap_or_default();
            Some(StreamEvent::Citations(citations))
        }
        Some("error") => {
            let detail = value
                .get("detail")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(StreamEvent::Error(detail))
        }
        // Unknown record kinds are forward-compatible noise.
        _ => None,
    }
}
