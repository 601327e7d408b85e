use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};

use crate::events::StreamEvent;
use crate::sse::SseDecoder;

/// Driver future that pumps the HTTP byte stream into decoded events.
pub type StreamWorker = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Receiving half of one chat response stream.
pub struct ChatEventStream {
    events: mpsc::UnboundedReceiver<StreamEvent>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

/// One in-flight chat response: the event receiver plus its worker future.
///
/// The worker must be polled (typically spawned) for events to flow; the
/// receiver is consumed by whoever owns the session.
pub struct ChatStreamHandle {
    pub stream: ChatEventStream,
    pub worker: StreamWorker,
}

impl ChatEventStream {
    pub(crate) fn new(
        events: mpsc::UnboundedReceiver<StreamEvent>,
        cancel_tx: oneshot::Sender<()>,
    ) -> Self {
        Self {
            events,
            cancel_tx: Some(cancel_tx),
        }
    }

    /// Waits for the next decoded event; `None` once the worker is done.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Signals the worker to stop reading the response body.
    ///
    /// Nothing calls this on the default path; an abandoned request runs to
    /// completion exactly like the original surface behaved.
    pub fn cancel(&mut self) -> bool {
        self.cancel_tx
            .take()
            .map(|tx| tx.send(()).is_ok())
            .unwrap_or(false)
    }
}

impl Drop for ChatEventStream {
    fn drop(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
        }
    }
}

impl ChatStreamHandle {
    /// Wraps a raw byte stream in a decoding worker plus event receiver.
    pub fn from_byte_stream<S, E>(byte_stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let (event_tx, stream, cancel_rx) = make_event_stream();
        let worker: StreamWorker = Box::pin(run_stream_worker(byte_stream, event_tx, cancel_rx));
        Self { stream, worker }
    }
}

pub(crate) fn make_event_stream() -> (
    mpsc::UnboundedSender<StreamEvent>,
    ChatEventStream,
    oneshot::Receiver<()>,
) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = oneshot::channel();
    (event_tx, ChatEventStream::new(event_rx, cancel_tx), cancel_rx)
}

/// Consumes the response byte stream and forwards decoded events.
///
/// Returns after forwarding a terminal event (`Done` or `Error`), after the
/// byte stream ends naturally (a `Done` is synthesized so consumers always
/// observe a terminator), on a mid-stream transport failure, or once the
/// receiving side cancels or goes away.
async fn run_stream_worker<S, E>(
    byte_stream: S,
    event_tx: mpsc::UnboundedSender<StreamEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    futures::pin_mut!(byte_stream);
    let mut decoder = SseDecoder::new();

    loop {
        tokio::select! {
            _ = &mut cancel_rx => {
                tracing::debug!("chat stream cancelled before completion");
                return;
            }
            next_chunk = byte_stream.next() => {
                match next_chunk {
                    Some(Ok(chunk)) => {
                        for event in decoder.push_chunk(&chunk) {
                            let terminal = event.is_terminal();
                            if event_tx.send(event).is_err() || terminal {
                                return;
                            }
                        }
                    }
                    Some(Err(source)) => {
                        tracing::warn!(error = %source, "chat stream failed mid-response");
                        let _ = event_tx.send(StreamEvent::Error(source.to_string()));
                        return;
                    }
                    None => {
                        if let Some(event) = decoder.finish() {
                            let terminal = event.is_terminal();
                            if event_tx.send(event).is_err() || terminal {
                                return;
                            }
                        }
                        // Backend closed without an explicit terminator.
                        let _ = event_tx.send(StreamEvent::Done);
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::stream;

    use super::*;

    fn byte_chunks(chunks: &[&str]) -> Vec<Result<Bytes, Infallible>> {
        chunks
            .iter()
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk.as_bytes())))
            .collect()
    }

    async fn collect_events(chunks: &[&str]) -> Vec<StreamEvent> {
        let handle = ChatStreamHandle::from_byte_stream(stream::iter(byte_chunks(chunks)));
        let ChatStreamHandle { mut stream, worker } = handle;
        tokio::spawn(worker);

        let mut events = Vec::new();
        while let Some(event) = stream.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn worker_forwards_events_until_done() {
        let events = collect_events(&[
            "data: {\"type\":\"content\",\"content\":\"Hel\"}\n",
            "data: {\"type\":\"content\",\"content\":\"lo\"}\n",
            "data: [DONE]\n",
        ])
        .await;

        assert_eq!(
            events,
            vec![
                StreamEvent::ContentDelta("Hel".to_string()),
                StreamEvent::ContentDelta("lo".to_string()),
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn natural_end_of_stream_synthesizes_done() {
        let events = collect_events(&["data: {\"type\":\"content\",\"content\":\"partial\"}\n"]).await;

        assert_eq!(
            events,
            vec![
                StreamEvent::ContentDelta("partial".to_string()),
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn error_record_terminates_the_stream() {
        let events = collect_events(&[
            "data: {\"type\":\"content\",\"content\":\"Hi\"}\n",
            "data: {\"type\":\"error\",\"detail\":\"boom\"}\n",
            "data: {\"type\":\"content\",\"content\":\"never delivered\"}\n",
        ])
        .await;

        assert_eq!(
            events,
            vec![
                StreamEvent::ContentDelta("Hi".to_string()),
                StreamEvent::Error("boom".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn cancel_stops_the_worker_before_terminal_event() {
        // A pending stream never yields, so only cancellation can end the worker.
        let handle = ChatStreamHandle::from_byte_stream(stream::pending::<Result<Bytes, Infallible>>());
        let ChatStreamHandle { mut stream, worker } = handle;
        let join = tokio::spawn(worker);

        assert!(stream.cancel());
        join.await.expect("worker task should finish after cancel");
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn mid_stream_transport_failure_surfaces_as_error_event() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"data: {\"type\":\"content\",\"content\":\"Hi\"}\n")),
            Err("connection reset".to_string()),
        ];
        let handle = ChatStreamHandle::from_byte_stream(stream::iter(chunks));
        let ChatStreamHandle { mut stream, worker } = handle;
        tokio::spawn(worker);

        let mut events = Vec::new();
        while let Some(event) = stream.recv().await {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                StreamEvent::ContentDelta("Hi".to_string()),
                StreamEvent::Error("connection reset".to_string()),
            ]
        );
    }
}
