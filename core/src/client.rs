//! HTTP client for the analysis endpoint and the pump that turns its byte
//! stream into decoded events.

use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;
use futures::TryStreamExt;
use reglens_protocol::AnalysisEvent;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::decoder::decode_record;
use crate::session::AnalysisOutcome;
use crate::session::MessageId;
use crate::session::SessionError;
use crate::session::Transcript;
use crate::sse::FrameSplitter;

/// Failures that terminate an analysis stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("analysis request failed with status {status}: {message}")]
    Http { status: u16, message: String },
    /// The backend reported a failure through an `error` record.
    #[error("{0}")]
    Backend(String),
}

/// Path of the streaming analysis endpoint.
pub const ANALYZE_PATH: &str = "/regulation-analysis/analyze";

/// Buffered events between the pump task and the consumer.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Client for the streaming analysis endpoint.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// Submits `text` for analysis and returns the stream of decoded
    /// events. The HTTP body is consumed by a spawned pump task, so the
    /// stream keeps filling while the caller renders.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisStream, StreamError> {
        let url = format!("{}{ANALYZE_PATH}", self.base_url);
        let response = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StreamError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let chunks = response.bytes_stream().map_err(StreamError::Network);
        tokio::spawn(async move {
            pump_events(chunks, tx).await;
        });
        Ok(AnalysisStream { rx })
    }
}

/// Stream of decoded events produced by [`AnalysisClient::analyze`].
#[derive(Debug)]
pub struct AnalysisStream {
    rx: mpsc::Receiver<Result<AnalysisEvent, StreamError>>,
}

impl Stream for AnalysisStream {
    type Item = Result<AnalysisEvent, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Feeds raw chunks through the frame splitter and decoder, forwarding each
/// decoded event over `tx`. A record that fails to decode is logged and
/// skipped. A transport failure or a backend `error` record ends the pump
/// with a terminal error.
pub async fn pump_events<S>(mut chunks: S, tx: mpsc::Sender<Result<AnalysisEvent, StreamError>>)
where
    S: Stream<Item = Result<Bytes, StreamError>> + Unpin,
{
    let mut splitter = FrameSplitter::new();
    while let Some(chunk) = chunks.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(error) => {
                let _ = tx.send(Err(error)).await;
                return;
            }
        };
        for payload in splitter.push(&chunk) {
            match decode_record(&payload) {
                Ok(AnalysisEvent::Error(message)) => {
                    let _ = tx.send(Err(StreamError::Backend(message))).await;
                    return;
                }
                Ok(event) => {
                    if tx.send(Ok(event)).await.is_err() {
                        // Consumer dropped the stream; stop reading.
                        return;
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, %payload, "skipping undecodable record");
                }
            }
        }
    }
    if !splitter.leftover().is_empty() {
        tracing::debug!(
            bytes = splitter.leftover().len(),
            "stream ended with an incomplete trailing line"
        );
    }
}

/// Consumes an event stream into the transcript message, honoring
/// cancellation. Exactly one terminal outcome is applied; events
/// accumulated before an interruption stay on the message.
pub async fn drive<S>(
    transcript: &mut Transcript,
    id: MessageId,
    mut events: S,
    cancel: &CancellationToken,
) -> Result<AnalysisOutcome, SessionError>
where
    S: Stream<Item = Result<AnalysisEvent, StreamError>> + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                transcript.finalize(id, AnalysisOutcome::Interrupted)?;
                return Ok(AnalysisOutcome::Interrupted);
            }
            next = events.next() => next,
        };
        match next {
            Some(Ok(event)) => transcript.append_event(id, event)?,
            Some(Err(error)) => {
                let outcome = AnalysisOutcome::Failed {
                    reason: error.to_string(),
                };
                transcript.finalize(id, outcome.clone())?;
                return Ok(outcome);
            }
            None => {
                transcript.finalize(id, AnalysisOutcome::Completed)?;
                return Ok(AnalysisOutcome::Completed);
            }
        }
    }
}
