//! Line-oriented adapter: one JSON `HostEvent` per input line

use crate::handlers::{self, Whois};
use crate::protocol::HostEvent;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Feed events to the game until the input closes.
/// Events are handled one at a time; round timers run alongside.
pub async fn run<R>(whois: Arc<Whois>, reader: R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<HostEvent>(line) {
            Ok(event) => handlers::handle_event(&whois, event).await,
            Err(e) => tracing::warn!("Skipping malformed event: {}", e),
        }
    }

    tracing::info!("Input closed");
    Ok(())
}
