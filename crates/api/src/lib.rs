/// HTTP boundary to the portfolio backend plus the transport seam trait.
pub mod client;
pub mod error;
/// Wire-level event and citation types.
pub mod events;
/// Incremental decoder for the `data: <json>` response stream.
pub mod sse;
pub mod stream;

pub use client::{
    ApiClient, BoxFuture, ChatBackend, ConnectionStatus, HistoryMessage, HistoryRole,
};
pub use error::{ApiError, ApiResult};
pub use events::{Citation, StreamEvent};
pub use sse::SseDecoder;
pub use stream::{ChatEventStream, ChatStreamHandle, StreamWorker};
