//! Mailbox types.

use super::{Flags, Message};

/// A mailbox and the messages fetched from it.
///
/// Status fields come from SELECT/EXAMINE; messages are appended in server
/// order by the fetch commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mailbox {
    name: String,
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// First unseen message sequence number, 0 if not reported.
    pub unseen: u32,
    /// Whether the mailbox was opened read-write.
    pub read_write: bool,
    /// Flags defined for this mailbox.
    pub flags: Flags,
    messages: Vec<Message>,
}

impl Mailbox {
    /// Creates an empty mailbox with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The INBOX mailbox (case-insensitive per RFC).
    #[must_use]
    pub fn inbox() -> Self {
        Self::new("INBOX")
    }

    /// Returns the mailbox name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the local value; does not talk to the server.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Appends a message.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Messages in the order they were fetched.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Mutable access to the fetched messages.
    pub fn messages_mut(&mut self) -> &mut [Message] {
        &mut self.messages
    }

    /// Message at a list position.
    #[must_use]
    pub fn message_at(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    /// Finds a message by sequence number.
    #[must_use]
    pub fn find_by_id(&self, id: u32) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == Some(id))
    }

    /// Finds a message by sequence number, mutably.
    pub fn find_by_id_mut(&mut self, id: u32) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == Some(id))
    }

    /// Removes and returns the message at a list position.
    pub fn take_at(&mut self, index: usize) -> Option<Message> {
        (index < self.messages.len()).then(|| self.messages.remove(index))
    }

    /// Drops all fetched messages.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    /// Number of fetched messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no messages were fetched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// LIST response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Mailbox attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
    /// Mailbox name.
    pub name: String,
}

/// Mailbox attributes from LIST response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// Mailbox cannot be selected.
    NoSelect,
    /// Mailbox cannot have children.
    NoInferiors,
    /// Mailbox has no children.
    HasNoChildren,
    /// Mailbox has children.
    HasChildren,
    /// Mailbox is marked for attention.
    Marked,
    /// Mailbox is not marked.
    Unmarked,
    /// Unknown attribute.
    Unknown(String),
}

impl MailboxAttribute {
    /// Parses a mailbox attribute string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "\\NOSELECT" => Self::NoSelect,
            "\\NOINFERIORS" => Self::NoInferiors,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            _ => Self::Unknown(s.to_string()),
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

    mod mailbox_tests {
        use super::*;

        fn with_messages(ids: &[u32]) -> Mailbox {
            let mut mailbox = Mailbox::inbox();
            for &id in ids {
                mailbox.add_message(Message::with_id(id));
            }
            mailbox
        }

        #[test]
        fn new_is_empty() {
            let mb = Mailbox::new("Archive");
            assert_eq!(mb.name(), "Archive");
            assert!(mb.is_empty());
            assert!(!mb.read_write);
        }

        #[test]
        fn find_by_id() {
            let mb = with_messages(&[4, 7, 9]);
            assert_eq!(mb.find_by_id(7).unwrap().id, Some(7));
            assert!(mb.find_by_id(8).is_none());
        }

        #[test]
        fn take_at_removes() {
            let mut mb = with_messages(&[1, 2, 3]);
            let taken = mb.take_at(1).unwrap();
            assert_eq!(taken.id, Some(2));
            assert_eq!(mb.len(), 2);
            assert!(mb.take_at(5).is_none());
        }

        #[test]
        fn clear_messages() {
            let mut mb = with_messages(&[1, 2]);
            mb.clear_messages();
            assert!(mb.is_empty());
            assert_eq!(mb.name(), "INBOX");
        }

        #[test]
        fn messages_keep_order() {
            let mb = with_messages(&[3, 1, 2]);
            let ids: Vec<_> = mb.messages().iter().filter_map(|m| m.id).collect();
            assert_eq!(ids, vec![3, 1, 2]);
        }
    }

    mod attribute_tests {
        use super::*;

        #[test]
        fn parse_known() {
            assert_eq!(MailboxAttribute::parse("\\Noselect"), MailboxAttribute::NoSelect);
            assert_eq!(
                MailboxAttribute::parse("\\HasChildren"),
                MailboxAttribute::HasChildren
            );
        }

        #[test]
        fn parse_unknown() {
            assert_eq!(
                MailboxAttribute::parse("\\Trash"),
                MailboxAttribute::Unknown("\\Trash".to_string())
            );
        }
    }
}
