use serde::Deserialize;

/// One source snippet the backend grounded part of its answer on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub excerpt: String,
}

/// One classified unit decoded from the chat response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Next fragment of the assistant answer, in arrival order.
    ContentDelta(String),
    /// Full replacement set of citations for the in-flight answer.
    Citations(Vec<Citation>),
    /// Backend-signaled failure; terminal for this stream.
    Error(String),
    /// The stream finished and no further events will arrive.
    Done,
}

impl StreamEvent {
    /// True for events after which the stream carries nothing further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }
}
