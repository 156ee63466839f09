use crate::protocol::{OutgoingMessage, Segment};
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Delivers messages to a group through the host framework
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, group_id: &str, segments: Vec<Segment>) -> Result<(), SendError>;
}

/// Send a message, degrading to `fallback` as plain text if delivery fails
pub async fn send_or_fallback(
    sink: &dyn MessageSink,
    group_id: &str,
    segments: Vec<Segment>,
    fallback: String,
) {
    if let Err(e) = sink.send(group_id, segments).await {
        tracing::error!("Failed to send message to group {}: {}", group_id, e);

        if let Err(e) = sink.send(group_id, vec![Segment::Text(fallback)]).await {
            tracing::error!("Failed to send fallback to group {}: {}", group_id, e);
        }
    }
}

/// Send a plain text reply, logging failures
pub async fn send_text(sink: &dyn MessageSink, group_id: &str, text: impl Into<String>) {
    if let Err(e) = sink.send(group_id, vec![Segment::text(text)]).await {
        tracing::error!("Failed to send reply to group {}: {}", group_id, e);
    }
}

/// Writes each message as one JSON line
pub struct JsonLineSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLineSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W> MessageSink for JsonLineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, group_id: &str, segments: Vec<Segment>) -> Result<(), SendError> {
        let msg = OutgoingMessage {
            group_id: group_id.to_string(),
            segments,
        };
        let mut line = serde_json::to_vec(&msg)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}
