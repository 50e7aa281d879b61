//! # tidemail-imap
//!
//! An IMAP4rev1 client engine for reading mail from a server.
//!
//! ## Features
//!
//! - **One command at a time**: a [`Session`] writes a tagged command,
//!   collects untagged data with literals spliced in, and ends on the
//!   matching tagged completion
//! - **Authentication**: LOGIN, SASL LOGIN, and CRAM-MD5
//! - **Mailboxes**: SELECT, EXAMINE, LIST, CREATE, DELETE, RENAME, COPY
//! - **Messages**: envelopes, BODYSTRUCTURE trees, body part content with
//!   transfer decoding, flag updates by UID, SEARCH
//! - **TLS via rustls**: implicit TLS on port 993 without OpenSSL
//! - **Pluggable transport**: any [`Transport`] can drive a session, which
//!   keeps the engine testable without a socket
//!
//! ## Quick Start
//!
//! ```no_run
//! use tidemail_imap::{ConfigBuilder, LoginType, Security, Session};
//!
//! #[tokio::main]
//! async fn main() -> tidemail_imap::Result<()> {
//!     let config = ConfigBuilder::new("imap.example.com")
//!         .security(Security::Implicit)
//!         .build();
//!     let mut session = Session::connect(&config).await?;
//!
//!     session.login("user@example.com", "password", LoginType::Plain).await?;
//!
//!     let mut inbox = session.select("INBOX").await?;
//!     session.fetch_mailbox(&mut inbox).await?;
//!
//!     for message in inbox.messages() {
//!         println!("{}: {}", message.id.unwrap_or_default(), message.subject);
//!     }
//!
//!     if let Some(id) = inbox.messages().first().and_then(|m| m.id) {
//!         let mut message = session.fetch_headers(id).await?;
//!         session.fetch_body_structure(&mut message).await?;
//!         if let Some(index) = message.text_part_index() {
//!             session.fetch_body_part(&mut message, index).await?;
//!         }
//!     }
//!
//!     session.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`Result`]. The session also keeps the text of
//! the last failure, available from [`Session::error_string`]: the server's
//! text for NO and BAD, or the transport's description after an I/O error.
//!
//! ## Modules
//!
//! - [`command`]: command types, serialization, and tags
//! - [`connection`]: configuration, TLS streams, and the line transport
//! - [`parser`]: response classification and FETCH data parsing
//! - [`types`]: messages, body parts, mailboxes, flags, and addresses

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
mod session;
pub mod types;

pub use command::{
    Command, FetchItems, LoginType, SearchCriteria, SequenceSet, StoreAction, TagGenerator,
};
pub use connection::{Config, ConfigBuilder, FramedTransport, ImapStream, Security, Transport};
pub use error::{Error, Result};
pub use session::Session;
pub use types::{
    Address, BodyPart, Flag, Flags, ListEntry, Mailbox, MailboxAttribute, Message,
};
