use askai_api::{ChatBackend, ChatStreamHandle, Citation, ConnectionStatus, StreamEvent};

use crate::history::history_window;
use crate::message::Message;

/// Synthetic assistant greeting seeded into every new session.
pub const GREETING: &str = "Hi! I'm an AI assistant that knows this portfolio inside out. \
Ask me about the projects, skills, or experience you see here.";

/// Canned prompts the surface offers before the visitor types anything.
pub const SUGGESTED_QUESTIONS: &[&str] = &[
    "Which project are you most proud of?",
    "What is your machine learning experience?",
    "Which technologies do you work with day to day?",
];

/// In-memory state for one conversational exchange, created when the chat
/// surface is shown and discarded when it is dismissed.
///
/// The session is exclusively owned by its surface: all mutation flows
/// through `&mut self` on one task. A multi-threaded host must add its own
/// mutex or actor around the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub messages: Vec<Message>,
    pub input_draft: String,
    pub is_loading: bool,
    pub error: Option<String>,
    pub citations: Vec<Citation>,
    pub connection_status: ConnectionStatus,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Creates a session seeded with the default assistant greeting.
    pub fn new() -> Self {
        Self::with_greeting(GREETING)
    }

    /// Creates a session seeded with a configured greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            input_draft: String::new(),
            is_loading: false,
            error: None,
            citations: Vec::new(),
            connection_status: ConnectionStatus::Checking,
        }
    }

    /// Probes the backend once and records the result.
    ///
    /// Run at session start; never retried automatically, and a disconnected
    /// result does not block submits.
    pub async fn check_health(&mut self, backend: &dyn ChatBackend) {
        self.connection_status = backend.health_check().await;
    }

    /// Submits one question and applies the streamed answer to the log.
    ///
    /// Blank questions are ignored, as is any submit while a request is in
    /// flight; the `is_loading` guard is the session's only concurrency
    /// control. Every failure ends up in `error` rather than propagating.
    pub async fn submit(&mut self, backend: &dyn ChatBackend, question: &str) {
        let question = question.trim();
        if question.is_empty() || self.is_loading {
            return;
        }

        self.error = None;
        self.citations.clear();

        // The question travels in its own request field; the window carries
        // only the turns that preceded it.
        let history = history_window(&self.messages);

        self.messages.push(Message::user(question));
        self.input_draft.clear();
        self.is_loading = true;

        match backend.send_chat(question, &history).await {
            Ok(handle) => {
                // Live placeholder the stream overwrites fragment by fragment.
                self.messages.push(Message::assistant(String::new()));
                self.consume_stream(handle).await;
            }
            Err(error) => {
                tracing::warn!(error = %error, "chat request rejected before streaming");
                self.error = Some(error.to_string());
            }
        }

        self.is_loading = false;
    }

    async fn consume_stream(&mut self, handle: ChatStreamHandle) {
        let ChatStreamHandle { mut stream, worker } = handle;
        tokio::spawn(worker);

        let mut answer = String::new();
        while let Some(event) = stream.recv().await {
            match event {
                StreamEvent::ContentDelta(fragment) => {
                    answer.push_str(&fragment);
                    if let Some(last) = self.messages.last_mut() {
                        // Replace rather than append so the displayed message
                        // always equals the accumulator snapshot.
                        last.content = answer.clone();
                    }
                }
                StreamEvent::Citations(citations) => {
                    self.citations = citations;
                }
                StreamEvent::Error(detail) => {
                    // Partial content stays visible; only consumption stops.
                    self.error = Some(detail);
                    break;
                }
                StreamEvent::Done => break,
            }
        }
    }
}
