//! IMAP command builder.
//!
//! This module provides types and serialization for IMAP commands.

mod serialize;
mod tag_generator;
mod types;

pub use tag_generator::{DEFAULT_TAG_PREFIX, TagGenerator};
pub use types::{FetchItems, LoginType, SearchCriteria, SequenceSet, StoreAction};

use crate::{Error, Result};
use serialize::{write_astring, write_fetch_items, write_search_criteria, write_store_action};

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Any State Commands
    /// CAPABILITY command.
    Capability,
    /// LOGOUT command.
    Logout,

    // Not Authenticated State Commands
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// AUTHENTICATE command.
    Authenticate {
        /// Authentication mechanism.
        mechanism: String,
    },

    // Authenticated State Commands
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: String,
    },
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: String,
    },
    /// CREATE command.
    Create {
        /// Mailbox to create.
        mailbox: String,
    },
    /// DELETE command.
    Delete {
        /// Mailbox to delete.
        mailbox: String,
    },
    /// RENAME command.
    Rename {
        /// Current mailbox name.
        from: String,
        /// New mailbox name.
        to: String,
    },
    /// LIST command.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },

    // Selected State Commands
    /// EXPUNGE command.
    Expunge,
    /// SEARCH command.
    Search {
        /// Search criteria.
        criteria: SearchCriteria,
    },
    /// FETCH command.
    Fetch {
        /// Sequence set.
        sequence: SequenceSet,
        /// Items to fetch.
        items: FetchItems,
    },
    /// UID STORE command.
    UidStore {
        /// Message UID.
        uid: u32,
        /// Store action.
        action: StoreAction,
    },
    /// COPY command.
    Copy {
        /// Sequence set.
        sequence: SequenceSet,
        /// Target mailbox.
        mailbox: String,
    },
}

impl Command {
    /// Serializes the command to bytes with the given tag, CRLF included.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),

            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }

            Self::Authenticate { mechanism } => {
                buf.extend_from_slice(b"AUTHENTICATE ");
                buf.extend_from_slice(mechanism.as_bytes());
            }

            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_astring(&mut buf, mailbox);
            }

            Self::Examine { mailbox } => {
                buf.extend_from_slice(b"EXAMINE ");
                write_astring(&mut buf, mailbox);
            }

            Self::Create { mailbox } => {
                buf.extend_from_slice(b"CREATE ");
                write_astring(&mut buf, mailbox);
            }

            Self::Delete { mailbox } => {
                buf.extend_from_slice(b"DELETE ");
                write_astring(&mut buf, mailbox);
            }

            Self::Rename { from, to } => {
                buf.extend_from_slice(b"RENAME ");
                write_astring(&mut buf, from);
                buf.push(b' ');
                write_astring(&mut buf, to);
            }

            Self::List { reference, pattern } => {
                buf.extend_from_slice(b"LIST ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_astring(&mut buf, pattern);
            }

            Self::Expunge => buf.extend_from_slice(b"EXPUNGE"),

            Self::Search { criteria } => {
                buf.extend_from_slice(b"SEARCH ");
                write_search_criteria(&mut buf, criteria);
            }

            Self::Fetch { sequence, items } => {
                buf.extend_from_slice(b"FETCH ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_items(&mut buf, items);
            }

            Self::UidStore { uid, action } => {
                buf.extend_from_slice(format!("UID STORE {uid} ").as_bytes());
                write_store_action(&mut buf, action);
            }

            Self::Copy { sequence, mailbox } => {
                buf.extend_from_slice(b"COPY ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_astring(&mut buf, mailbox);
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Checks the string arguments before the command is written.
    ///
    /// Neither an atom nor a quoted string can carry CR, LF or NUL; sent
    /// as is, they would end the command line early.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if an argument contains one of
    /// them. The argument itself is not echoed.
    pub fn validate(&self) -> Result<()> {
        let arguments: Vec<&str> = match self {
            Self::Capability | Self::Logout | Self::Expunge | Self::UidStore { .. } => Vec::new(),
            Self::Login { username, password } => vec![username.as_str(), password.as_str()],
            Self::Authenticate { mechanism } => vec![mechanism.as_str()],
            Self::Select { mailbox }
            | Self::Examine { mailbox }
            | Self::Create { mailbox }
            | Self::Delete { mailbox }
            | Self::Copy { mailbox, .. } => vec![mailbox.as_str()],
            Self::Rename { from, to } => vec![from.as_str(), to.as_str()],
            Self::List { reference, pattern } => vec![reference.as_str(), pattern.as_str()],
            Self::Search { criteria } => criteria.text().into_iter().collect(),
            Self::Fetch { items, .. } => match items {
                FetchItems::Body(section) => vec![section.as_str()],
                _ => Vec::new(),
            },
        };

        if arguments
            .iter()
            .any(|argument| argument.bytes().any(|b| matches!(b, b'\r' | b'\n' | 0)))
        {
            return Err(Error::InvalidArgument(format!(
                "{} argument contains CR, LF or NUL",
                self.name()
            )));
        }
        Ok(())
    }

    /// Returns the command name for logging.
    ///
    /// Never includes arguments, so credentials stay out of the logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Logout => "LOGOUT",
            Self::Login { .. } => "LOGIN",
            Self::Authenticate { .. } => "AUTHENTICATE",
            Self::Select { .. } => "SELECT",
            Self::Examine { .. } => "EXAMINE",
            Self::Create { .. } => "CREATE",
            Self::Delete { .. } => "DELETE",
            Self::Rename { .. } => "RENAME",
            Self::List { .. } => "LIST",
            Self::Expunge => "EXPUNGE",
            Self::Search { .. } => "SEARCH",
            Self::Fetch { .. } => "FETCH",
            Self::UidStore { .. } => "UID STORE",
            Self::Copy { .. } => "COPY",
        }
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
    use crate::types::Flag;

    fn wire(command: &Command) -> String {
        String::from_utf8(command.serialize("A1")).unwrap()
    }

    #[test]
    fn test_login() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "pass word".to_string(),
        };
        assert_eq!(wire(&cmd), "A1 LOGIN user \"pass word\"\r\n");
        assert_eq!(cmd.name(), "LOGIN");
    }

    #[test]
    fn test_select() {
        let cmd = Command::Select {
            mailbox: "INBOX".to_string(),
        };
        assert_eq!(wire(&cmd), "A1 SELECT INBOX\r\n");
    }

    #[test]
    fn test_list() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };
        assert_eq!(wire(&cmd), "A1 LIST \"\" \"*\"\r\n");
    }

    #[test]
    fn test_fetch_range_all() {
        let cmd = Command::Fetch {
            sequence: SequenceSet::Range(1, 10),
            items: FetchItems::All,
        };
        assert_eq!(wire(&cmd), "A1 FETCH 1:10 ALL\r\n");
    }

    #[test]
    fn test_uid_store() {
        let cmd = Command::UidStore {
            uid: 42,
            action: StoreAction::AddFlag(Flag::Seen),
        };
        assert_eq!(wire(&cmd), "A1 UID STORE 42 +flags (\\Seen)\r\n");
    }

    #[test]
    fn test_copy() {
        let cmd = Command::Copy {
            sequence: SequenceSet::Range(2, 4),
            mailbox: "Archive 2024".to_string(),
        };
        assert_eq!(wire(&cmd), "A1 COPY 2:4 \"Archive 2024\"\r\n");
    }

    #[test]
    fn test_validate_rejects_line_breaks() {
        let login = Command::Login {
            username: "u".to_string(),
            password: "pw\r\nT9 LOGOUT".to_string(),
        };
        let error = login.validate().unwrap_err();
        assert!(matches!(error, Error::InvalidArgument(_)));
        assert!(!error.to_string().contains("LOGOUT"));

        let search = Command::Search {
            criteria: SearchCriteria::Subject("x\nT9 DELETE INBOX".to_string()),
        };
        assert!(search.validate().is_err());

        let select = Command::Select {
            mailbox: "IN\0BOX".to_string(),
        };
        assert!(select.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_plain_arguments() {
        let rename = Command::Rename {
            from: "Caf\u{e9}".to_string(),
            to: "Sent Items".to_string(),
        };
        rename.validate().unwrap();
        Command::Expunge.validate().unwrap();
        Command::Search {
            criteria: SearchCriteria::Since(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn test_search_raw() {
        let cmd = Command::Search {
            criteria: SearchCriteria::Raw("UNSEEN FROM alice".to_string()),
        };
        assert_eq!(wire(&cmd), "A1 SEARCH UNSEEN FROM alice\r\n");
    }
}
