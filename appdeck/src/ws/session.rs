//! Bounded log-stream receive loop

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{timeout, Instant};
use tracing::debug;

use crate::errors::AppsError;
use crate::models::log_entry::LogEntry;
use crate::ws::frame::{Frame, FrameStream, Opcode};

/// The server signals end-of-stream with a single NUL payload.
const END_OF_STREAM: &[u8] = b"\x00";

/// Log stream session options
#[derive(Debug, Clone)]
pub struct LogStreamOptions {
    /// Search term sent as the subscribe message (empty = no filter)
    pub search: String,

    /// Overall receive deadline
    pub deadline: Duration,

    /// Per-read timeout; expiry means "no more logs right now"
    pub per_read_timeout: Duration,

    /// Maximum number of log lines to accumulate
    pub max_entries: usize,
}

impl Default for LogStreamOptions {
    fn default() -> Self {
        Self {
            search: String::new(),
            deadline: Duration::from_secs(8),
            per_read_timeout: Duration::from_millis(1500),
            max_entries: 500,
        }
    }
}

/// Run one log-stream session over an already-upgraded socket.
///
/// Sends the subscribe message, then accumulates rendered log lines
/// until the deadline, the entry cap, the end-of-stream sentinel, or a
/// close frame. The socket is shut down on every exit path.
pub async fn stream_logs<S>(
    stream: S,
    leftover: Vec<u8>,
    options: &LogStreamOptions,
) -> Result<String, AppsError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut ws = FrameStream::new(stream, leftover);
    let result = receive_loop(&mut ws, options).await;
    ws.shutdown().await;

    let lines = result?;
    Ok(lines.join("\n").trim().to_string())
}

async fn receive_loop<S>(
    ws: &mut FrameStream<S>,
    options: &LogStreamOptions,
) -> Result<Vec<String>, AppsError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    ws.send_text(&options.search).await?;

    let deadline = Instant::now() + options.deadline;
    let mut lines: Vec<String> = Vec::new();

    while Instant::now() < deadline && lines.len() < options.max_entries {
        let frame = match timeout(options.per_read_timeout, ws.read_frame()).await {
            // No data within the read window: no more logs right now.
            Err(_) => break,
            Ok(Ok(Some(frame))) => frame,
            // End of stream, including mid-frame truncation.
            Ok(Ok(None)) => break,
            Ok(Err(e)) => return Err(e),
        };

        match frame.opcode {
            Opcode::Close => break,
            Opcode::Ping => {
                ws.send_pong(&frame.payload).await?;
                continue;
            }
            Opcode::Text => {}
            _ => continue,
        }

        if frame.payload == END_OF_STREAM {
            debug!("Log stream sent end-of-stream sentinel");
            break;
        }

        push_line(&mut lines, &frame);
    }

    Ok(lines)
}

fn push_line(lines: &mut Vec<String>, frame: &Frame) {
    let text = String::from_utf8_lossy(&frame.payload);
    if text.trim().is_empty() {
        return;
    }

    match serde_json::from_str::<LogEntry>(&text) {
        Ok(entry) => lines.push(entry.render()),
        // Not structured JSON: keep the raw text unchanged.
        Err(_) => lines.push(text.into_owned()),
    }
}
