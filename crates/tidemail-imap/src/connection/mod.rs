//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, security mode, timeouts)
//! - TLS/plaintext stream abstraction
//! - The [`Transport`] trait and its framed implementation

mod config;
mod framed;
mod stream;
mod transport;

pub use config::{Config, ConfigBuilder, DEFAULT_READ_ATTEMPTS, Security};
pub use framed::{FramedTransport, MAX_LINE_LENGTH, MAX_LITERAL_SIZE};
pub use stream::{ImapStream, connect, create_tls_connector};
pub use transport::Transport;
