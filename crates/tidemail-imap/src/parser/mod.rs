//! IMAP response parser.
//!
//! Sans-I/O parsing of logical response lines, i.e. lines with their `{N}`
//! literals already spliced in by the session.
//!
//! # Architecture
//!
//! - **Cursor**: recursive-descent reader producing [`Value`] trees
//! - **Response**: tagged/untagged classification and per-command data lines
//! - **Fetch**: `* n FETCH (...)` into [`Message`](crate::Message) fields,
//!   with the envelope and BODYSTRUCTURE handled by their own modules
//!
//! # Example
//!
//! ```
//! use tidemail_imap::parser::fetch::parse_message;
//!
//! let line = br#"* 12 FETCH (FLAGS (\Seen) RFC822.SIZE 512)"#;
//! let message = parse_message(line).unwrap();
//! assert_eq!(message.id, Some(12));
//! assert_eq!(message.size, 512);
//! ```

pub mod body_structure;
pub mod cursor;
pub mod date;
pub mod envelope;
pub mod fetch;
pub mod response;

pub use cursor::{Cursor, Value};
