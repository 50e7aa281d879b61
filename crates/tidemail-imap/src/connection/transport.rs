//! The byte-stream abstraction a [`Session`](crate::Session) talks through.

use std::future::Future;

use crate::Result;

/// A line-oriented connection to an IMAP server.
///
/// Implementations own the socket (or a test double). Connecting is left to
/// the concrete type's constructor.
pub trait Transport: Send {
    /// Reads one line, including its line ending.
    ///
    /// Implementations wait a bounded number of times for data and fail with
    /// [`Error::Timeout`](crate::Error::Timeout) once that is exhausted.
    fn read_line(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Writes and flushes `data`.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Closes the connection. Errors while closing are ignored.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;

    /// Returns true until the connection is closed or fails.
    fn is_connected(&self) -> bool;

    /// Text of the last transport failure, empty if there was none.
    fn error_string(&self) -> &str;
}
