use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;
use snafu::{ResultExt, ensure};

use crate::error::{ApiResult, ChatRequestSnafu, ChatRejectedSnafu, MissingBaseUrlSnafu};
use crate::stream::ChatStreamHandle;

/// Route probed to decide whether the backend is reachable.
const HEALTH_PATH: &str = "/api/health";
/// Route answering questions with a streamed response.
const CHAT_PATH: &str = "/api/chat";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Reachability of the answering backend, probed once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Checking,
    Connected,
    Disconnected,
}

/// Chat turn role as serialized into the request history window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// One prior turn forwarded to the backend for context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryMessage {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryMessage {
    /// Creates a history entry with explicit role.
    pub fn new(role: HistoryRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    question: &'a str,
    messages: &'a [HistoryMessage],
}

/// Transport seam between the chat session and the portfolio backend.
///
/// The session consumes this trait so tests can script responses without a
/// network; `ApiClient` is the production implementation.
pub trait ChatBackend: Send + Sync {
    fn health_check<'a>(&'a self) -> BoxFuture<'a, ConnectionStatus>;
    fn send_chat<'a>(
        &'a self,
        question: &'a str,
        history: &'a [HistoryMessage],
    ) -> BoxFuture<'a, ApiResult<ChatStreamHandle>>;
}

/// HTTP client for the backend's health and chat endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for `base_url`, trimming whitespace and trailing slashes.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(base_url.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probes `/api/health`; any failure reads as disconnected.
    ///
    /// An unset base URL short-circuits without touching the network.
    pub async fn health_check(&self) -> ConnectionStatus {
        if self.base_url.is_empty() {
            return ConnectionStatus::Disconnected;
        }

        let url = format!("{}{HEALTH_PATH}", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => ConnectionStatus::Connected,
            Ok(response) => {
                tracing::debug!(status = %response.status(), "health probe rejected");
                ConnectionStatus::Disconnected
            }
            Err(error) => {
                tracing::debug!(error = %error, "health probe failed");
                ConnectionStatus::Disconnected
            }
        }
    }

    /// Submits a question plus its history window and opens the answer stream.
    pub async fn send_chat(
        &self,
        question: &str,
        history: &[HistoryMessage],
    ) -> ApiResult<ChatStreamHandle> {
        ensure!(
            !self.base_url.is_empty(),
            MissingBaseUrlSnafu { stage: "send-chat" }
        );

        let url = format!("{}{CHAT_PATH}", self.base_url);
        let body = ChatRequestBody {
            question,
            messages: history,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context(ChatRequestSnafu {
                stage: "send-chat-request",
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return ChatRejectedSnafu {
                status: status.as_u16(),
                detail: rejection_detail(status.as_u16(), &body_text),
            }
            .fail();
        }

        Ok(ChatStreamHandle::from_byte_stream(response.bytes_stream()))
    }
}

impl ChatBackend for ApiClient {
    fn health_check<'a>(&'a self) -> BoxFuture<'a, ConnectionStatus> {
        Box::pin(ApiClient::health_check(self))
    }

    fn send_chat<'a>(
        &'a self,
        question: &'a str,
        history: &'a [HistoryMessage],
    ) -> BoxFuture<'a, ApiResult<ChatStreamHandle>> {
        Box::pin(ApiClient::send_chat(self, question, history))
    }
}

/// Derives the user-facing message for a rejected chat call.
fn rejection_detail(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("detail")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Request failed ({status})"))
}

fn normalize_base_url(raw: String) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
