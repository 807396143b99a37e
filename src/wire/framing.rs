//! Message framing
//!
//! The probed server delimits messages with connection state rather than
//! explicit framing: the client half-closes its write side to say "request
//! complete", and the server's reply ends when the server closes. That wire
//! behavior lives behind the [`Framing`] trait so a length-prefixed framing
//! can be substituted without touching exchange logic.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default cap on reply size for half-close framing
pub const DEFAULT_MAX_REPLY_BYTES: usize = 64 * 1024;

/// Maximum message size for length-prefixed framing (10 MB)
pub const MAX_FRAMED_MESSAGE_SIZE: u32 = 10 * 1024 * 1024;

/// One request/reply framing strategy
///
/// `write_request` transmits one request and signals end-of-message to the
/// peer; `read_reply` reads one reply until the peer signals end-of-message.
#[async_trait]
pub trait Framing: Send + Sync {
    /// Transmit the request bytes and mark the message boundary
    async fn write_request(&self, stream: &mut TcpStream, payload: &[u8]) -> io::Result<()>;

    /// Read the reply bytes; an empty vec means the peer sent nothing
    async fn read_reply(&self, stream: &mut TcpStream) -> io::Result<Vec<u8>>;
}

/// Half-close framing: the observed wire behavior
///
/// The request boundary is a write-side shutdown; the reply boundary is the
/// peer closing. Known limitation: a reply longer than `max_reply_bytes` is
/// truncated at the cap, which will usually surface as a decode error - the
/// truncation is reported, not silently repaired. This framing cannot support
/// persistent or multiplexed connections.
#[derive(Debug, Clone)]
pub struct HalfClose {
    max_reply_bytes: usize,
}

impl HalfClose {
    pub fn new(max_reply_bytes: usize) -> Self {
        Self { max_reply_bytes }
    }
}

impl Default for HalfClose {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REPLY_BYTES)
    }
}

#[async_trait]
impl Framing for HalfClose {
    async fn write_request(&self, stream: &mut TcpStream, payload: &[u8]) -> io::Result<()> {
        stream.write_all(payload).await?;
        stream.flush().await?;
        // Half-close: FIN on the write direction, read stays open
        stream.shutdown().await
    }

    async fn read_reply(&self, stream: &mut TcpStream) -> io::Result<Vec<u8>> {
        read_until_eof(stream, self.max_reply_bytes).await
    }
}

/// Length-prefixed framing: u32-LE length followed by the message body
#[derive(Debug, Clone)]
pub struct LengthPrefixed {
    max_message_size: u32,
}

impl LengthPrefixed {
    pub fn new(max_message_size: u32) -> Self {
        Self { max_message_size }
    }
}

impl Default for LengthPrefixed {
    fn default() -> Self {
        Self::new(MAX_FRAMED_MESSAGE_SIZE)
    }
}

#[async_trait]
impl Framing for LengthPrefixed {
    async fn write_request(&self, stream: &mut TcpStream, payload: &[u8]) -> io::Result<()> {
        write_framed(stream, payload, self.max_message_size).await
    }

    async fn read_reply(&self, stream: &mut TcpStream) -> io::Result<Vec<u8>> {
        read_framed(stream, self.max_message_size).await
    }
}

/// Read until the peer closes or `limit` bytes have accumulated
pub(crate) async fn read_until_eof<R: AsyncRead + Unpin>(
    reader: &mut R,
    limit: usize,
) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    while data.len() < limit {
        let want = chunk.len().min(limit - data.len());
        let n = reader.read(&mut chunk[..want]).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
    }

    Ok(data)
}

/// Write a length-prefixed message
pub(crate) async fn write_framed<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
    max_message_size: u32,
) -> io::Result<()> {
    if data.len() > max_message_size as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Message too large",
        ));
    }

    let len = data.len() as u32;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Receive a length-prefixed message
pub(crate) async fn read_framed<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_message_size: u32,
) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf);

    if len > max_message_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Message too large: {} bytes", len),
        ));
    }

    let mut data = vec![0u8; len as usize];
    reader.read_exact(&mut data).await?;
    Ok(data)
}
