//! RFC 6455 frame codec over a raw byte stream
//!
//! Client-originated frames are always masked; inbound frames are
//! unmasked based on the MASK bit rather than assumed unmasked.

use rand::rngs::OsRng;
use rand::RngCore;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::AppsError;

/// Upper bound on a single inbound payload. Log frames are short; a
/// length beyond this indicates a corrupt header.
const MAX_PAYLOAD_LEN: u64 = 16 * 1024 * 1024;

/// WebSocket opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    Other(u8),
}

impl Opcode {
    pub fn from_u4(value: u8) -> Self {
        match value & 0x0F {
            0x0 => Opcode::Continuation,
            0x1 => Opcode::Text,
            0x2 => Opcode::Binary,
            0x8 => Opcode::Close,
            0x9 => Opcode::Ping,
            0xA => Opcode::Pong,
            other => Opcode::Other(other),
        }
    }
}

/// One decoded WebSocket frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub opcode: Opcode,
    pub fin: bool,
    pub masked: bool,
    pub payload: Vec<u8>,
}

/// Encode a masked text frame (FIN set, opcode 0x1)
pub fn encode_text(payload: &[u8]) -> Vec<u8> {
    encode_masked(0x81, payload)
}

/// Encode a masked pong frame (FIN set, opcode 0xA)
pub fn encode_pong(payload: &[u8]) -> Vec<u8> {
    encode_masked(0x8A, payload)
}

fn encode_masked(first: u8, payload: &[u8]) -> Vec<u8> {
    let length = payload.len();
    let mut frame = Vec::with_capacity(length + 14);
    frame.push(first);

    // MASK bit set on every client-originated frame
    if length < 126 {
        frame.push(0x80 | length as u8);
    } else if length < 65536 {
        frame.push(0x80 | 126);
        frame.extend_from_slice(&(length as u16).to_be_bytes());
    } else {
        frame.push(0x80 | 127);
        frame.extend_from_slice(&(length as u64).to_be_bytes());
    }

    let mut mask = [0u8; 4];
    OsRng.fill_bytes(&mut mask);
    frame.extend_from_slice(&mask);
    frame.extend(payload.iter().enumerate().map(|(i, b)| b ^ mask[i % 4]));
    frame
}

/// A WebSocket framing layer over an owned byte stream.
///
/// Bytes the handshake read past the header terminator are drained
/// before the socket is touched again.
pub struct FrameStream<S> {
    stream: S,
    leftover: Vec<u8>,
    pos: usize,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FrameStream<S> {
    pub fn new(stream: S, leftover: Vec<u8>) -> Self {
        Self {
            stream,
            leftover,
            pos: 0,
        }
    }

    /// Send one masked text frame
    pub async fn send_text(&mut self, text: &str) -> Result<(), AppsError> {
        self.stream.write_all(&encode_text(text.as_bytes())).await?;
        Ok(())
    }

    /// Send one masked pong frame echoing `payload`
    pub async fn send_pong(&mut self, payload: &[u8]) -> Result<(), AppsError> {
        self.stream.write_all(&encode_pong(payload)).await?;
        Ok(())
    }

    /// Read one frame.
    ///
    /// Returns `Ok(None)` when the stream ends, including a truncation
    /// mid-frame: the peer dropping the connection while we wait for
    /// payload bytes is treated as end-of-stream, not an error.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, AppsError> {
        let mut header = [0u8; 2];
        if !self.read_exact(&mut header).await? {
            return Ok(None);
        }

        let fin = header[0] & 0x80 != 0;
        let opcode = Opcode::from_u4(header[0]);
        let masked = header[1] & 0x80 != 0;
        let mut length = u64::from(header[1] & 0x7F);

        if length == 126 {
            let mut ext = [0u8; 2];
            if !self.read_exact(&mut ext).await? {
                return Ok(None);
            }
            length = u64::from(u16::from_be_bytes(ext));
        } else if length == 127 {
            let mut ext = [0u8; 8];
            if !self.read_exact(&mut ext).await? {
                return Ok(None);
            }
            length = u64::from_be_bytes(ext);
        }

        if length > MAX_PAYLOAD_LEN {
            return Err(AppsError::Protocol(format!(
                "frame payload length {} exceeds limit",
                length
            )));
        }

        let mut mask = [0u8; 4];
        if masked && !self.read_exact(&mut mask).await? {
            return Ok(None);
        }

        let mut payload = vec![0u8; length as usize];
        if !self.read_exact(&mut payload).await? {
            return Ok(None);
        }

        if masked {
            for (i, byte) in payload.iter_mut().enumerate() {
                *byte ^= mask[i % 4];
            }
        }

        Ok(Some(Frame {
            opcode,
            fin,
            masked,
            payload,
        }))
    }

    /// Shut down the underlying socket. Errors are ignored: the session
    /// is over either way.
    pub async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }

    /// Fill `buf` completely, draining handshake leftover bytes first
    /// and looping on short socket reads. Returns false on EOF before
    /// `buf` is full.
    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<bool, AppsError> {
        let mut filled = 0;

        while filled < buf.len() && self.pos < self.leftover.len() {
            buf[filled] = self.leftover[self.pos];
            filled += 1;
            self.pos += 1;
        }

        while filled < buf.len() {
            let n = self.stream.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Ok(false);
            }
            filled += n;
        }

        Ok(true)
    }
}
