//! Framed line I/O for the IMAP protocol.
//!
//! Reads are buffered and split on line endings; literal bytes are handed up
//! line by line and reassembled by the session, which knows their length.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;

use super::config::{Config, DEFAULT_READ_ATTEMPTS};
use super::transport::Transport;
use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum literal size to prevent memory exhaustion.
pub const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// A [`Transport`] over any async byte stream.
pub struct FramedTransport<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
    io_timeout: Duration,
    read_attempts: u32,
    connected: bool,
    last_error: String,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a transport with the default 60 second wait and two attempts.
    pub fn new(stream: S) -> Self {
        Self::with_timeouts(stream, Duration::from_secs(60), DEFAULT_READ_ATTEMPTS)
    }

    /// Creates a transport using the timeouts from `config`.
    pub fn with_config(stream: S, config: &Config) -> Self {
        Self::with_timeouts(stream, config.io_timeout, config.read_attempts)
    }

    /// Creates a transport that waits `io_timeout` per attempt.
    pub fn with_timeouts(stream: S, io_timeout: Duration, read_attempts: u32) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            io_timeout,
            read_attempts: read_attempts.max(1),
            connected: true,
            last_error: String::new(),
        }
    }

    /// Gets a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        self.reader.get_mut()
    }

    /// Waits for buffered data, retrying on timeout. Returns 0 at EOF.
    async fn wait_for_data(&mut self) -> Result<usize> {
        for attempt in 1..=self.read_attempts {
            match timeout(self.io_timeout, self.reader.fill_buf()).await {
                Ok(filled) => return Ok(filled?.len()),
                Err(_) => tracing::debug!(attempt, "no data before read timeout"),
            }
        }
        Err(Error::Timeout(self.io_timeout * self.read_attempts))
    }

    async fn read_line_inner(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            if self.wait_for_data().await? == 0 {
                return Err(Error::Closed);
            }

            let buf = self.reader.buffer();
            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&buf[..=pos]);
                self.reader.consume(pos + 1);
                return Ok(line);
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }
    }

    async fn write_inner(&mut self, data: &[u8]) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(data);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buffer).await?;
        stream.flush().await?;
        Ok(())
    }

    fn fail(&mut self, error: &Error) {
        self.last_error = error.to_string();
        if error.is_transport() {
            self.connected = false;
        }
    }
}

impl<S> Transport for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let result = self.read_line_inner().await;
        if let Err(error) = &result {
            self.fail(error);
        }
        result
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let result = self.write_inner(data).await;
        if let Err(error) = &result {
            self.fail(error);
        }
        result
    }

    async fn disconnect(&mut self) {
        if self.connected {
            let _ = self.reader.get_mut().shutdown().await;
            self.connected = false;
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn error_string(&self) -> &str {
        &self.last_error
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_simple_line() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedTransport::new(mock);

        let line = framed.read_line().await.unwrap();
        assert_eq!(line, b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn test_read_line_split_across_reads() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY {5}")
            .read(b"\r\nhel")
            .read(b"lo)\r\n")
            .build();
        let mut framed = FramedTransport::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"* 1 FETCH (BODY {5}\r\n");
        assert_eq!(framed.read_line().await.unwrap(), b"hello)\r\n");
    }

    #[tokio::test]
    async fn test_two_lines_in_one_read() {
        let mock = Builder::new().read(b"* 2 EXISTS\r\nA1 OK done\r\n").build();
        let mut framed = FramedTransport::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"* 2 EXISTS\r\n");
        assert_eq!(framed.read_line().await.unwrap(), b"A1 OK done\r\n");
    }

    #[tokio::test]
    async fn test_write() {
        let mock = Builder::new().write(b"A001 LOGIN user pass\r\n").build();
        let mut framed = FramedTransport::new(mock);

        framed.write(b"A001 LOGIN user pass\r\n").await.unwrap();
        assert!(framed.is_connected());
    }

    #[tokio::test]
    async fn test_eof_closes() {
        let mock = Builder::new().build();
        let mut framed = FramedTransport::new(mock);

        let error = framed.read_line().await.unwrap_err();
        assert!(matches!(error, Error::Closed));
        assert!(!framed.is_connected());
        assert_eq!(framed.error_string(), "Connection closed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_retries_then_times_out() {
        let mock = Builder::new().wait(Duration::from_secs(10)).build();
        let mut framed = FramedTransport::with_timeouts(mock, Duration::from_secs(1), 2);

        let error = framed.read_line().await.unwrap_err();
        assert!(matches!(error, Error::Timeout(d) if d == Duration::from_secs(2)));
        assert!(!framed.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_attempt_succeeds() {
        let mock = Builder::new()
            .wait(Duration::from_millis(1500))
            .read(b"* OK late\r\n")
            .build();
        let mut framed = FramedTransport::with_timeouts(mock, Duration::from_secs(1), 2);

        assert_eq!(framed.read_line().await.unwrap(), b"* OK late\r\n");
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = FramedTransport::new(mock);

        let result = framed.read_line().await;
        assert!(result.unwrap_err().to_string().contains("line too long"));
        assert!(framed.error_string().contains("line too long"));
    }
}
