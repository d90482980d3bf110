//! MCP transport implementations.
//!
//! The server speaks newline-delimited JSON. [`StdioTransport`] wraps any
//! buffered reader and writer pair; in production that is the process's
//! stdin and stdout, in tests an in-memory duplex stream.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tracing::debug;

use crate::error::TransportError;

/// Trait for MCP transport implementations.
#[async_trait]
pub trait Transport: Send {
    /// Send a message to the client.
    async fn send(&mut self, message: &str) -> Result<(), TransportError>;

    /// Receive the next message from the client.
    ///
    /// Cancelling this future loses no data: a partially read line is kept
    /// and completed by the next call.
    async fn receive(&mut self) -> Result<String, TransportError>;

    /// Close the transport connection.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Check if the transport is connected.
    fn is_connected(&self) -> bool;
}

/// Line-oriented transport over a reader and a writer.
pub struct StdioTransport<R, W> {
    reader: R,
    writer: W,
    /// Bytes of the line currently being read.
    buffer: Vec<u8>,
    connected: bool,
}

impl StdioTransport<BufReader<Stdin>, Stdout> {
    /// Transport over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a transport over the given streams.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            buffer: Vec::new(),
            connected: true,
        }
    }
}

#[async_trait]
impl<R, W> Transport for StdioTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }

        debug!(message = message, "Sending message to MCP client");

        self.writer
            .write_all(message.as_bytes())
            .await
            .map_err(TransportError::WriteError)?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(TransportError::WriteError)?;
        self.writer.flush().await.map_err(TransportError::WriteError)?;

        Ok(())
    }

    async fn receive(&mut self) -> Result<String, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }

        loop {
            let bytes_read = self
                .reader
                .read_until(b'\n', &mut self.buffer)
                .await
                .map_err(TransportError::ReadError)?;

            if bytes_read == 0 && self.buffer.is_empty() {
                self.connected = false;
                return Err(TransportError::ConnectionClosed);
            }

            let line = String::from_utf8_lossy(&self.buffer).trim().to_string();
            self.buffer.clear();

            // Blank keep-alive lines carry no message.
            if line.is_empty() {
                if bytes_read == 0 {
                    self.connected = false;
                    return Err(TransportError::ConnectionClosed);
                }
                continue;
            }

            debug!(message = %line, "Received message from MCP client");
            return Ok(line);
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if !self.connected {
            return Ok(());
        }
        debug!("Closing MCP transport");
        self.connected = false;
        self.writer.shutdown().await.map_err(TransportError::WriteError)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
