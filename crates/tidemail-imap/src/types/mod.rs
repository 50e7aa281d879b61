//! Core IMAP types.
//!
//! The data model handed back to callers: mailboxes own messages, messages
//! own their addresses and body parts.

#![allow(clippy::missing_const_for_fn)]

mod address;
mod body_part;
mod flags;
mod mailbox;
mod message;

pub use address::{Address, UNKNOWN_PART};
pub use body_part::BodyPart;
pub use flags::{Flag, Flags};
pub use mailbox::{ListEntry, Mailbox, MailboxAttribute};
pub use message::Message;
