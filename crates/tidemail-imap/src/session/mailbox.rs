//! Mailbox selection and management commands.

use super::Session;
use crate::command::{Command, SequenceSet};
use crate::connection::Transport;
use crate::parser::response::{SelectData, is_untagged, line_text, parse_list, parse_select_data};
use crate::types::{ListEntry, Mailbox};
use crate::{Error, Result};

/// Separator used by the folder helpers.
const FOLDER_SEPARATOR: char = '.';

impl<T: Transport> Session<T> {
    /// Selects a mailbox for reading and writing.
    pub async fn select(&mut self, name: &str) -> Result<Mailbox> {
        let command = Command::Select {
            mailbox: name.to_string(),
        };
        self.open_mailbox(&command, name).await
    }

    /// Selects a mailbox read-only.
    pub async fn examine(&mut self, name: &str) -> Result<Mailbox> {
        let command = Command::Examine {
            mailbox: name.to_string(),
        };
        self.open_mailbox(&command, name).await
    }

    async fn open_mailbox(&mut self, command: &Command, name: &str) -> Result<Mailbox> {
        let response = self.execute(command).await?;

        if let Some(first) = response.lines.first().filter(|line| !is_untagged(line)) {
            let error = Error::Protocol(format!(
                "unexpected {} response: {}",
                command.name(),
                line_text(first)
            ));
            return self.record(Err(error));
        }

        let mut mailbox = Mailbox::new(name);
        for line in &response.lines {
            match parse_select_data(line) {
                SelectData::Exists(count) => mailbox.exists = count,
                SelectData::Recent(count) => mailbox.recent = count,
                SelectData::Unseen(count) => mailbox.unseen = count,
                SelectData::Flags(flags) => mailbox.flags = flags,
                SelectData::Other => {}
            }
        }
        mailbox.read_write = response.text.to_ascii_uppercase().contains("READ-WRITE");

        tracing::debug!(
            mailbox = name,
            exists = mailbox.exists,
            read_write = mailbox.read_write,
            "mailbox opened"
        );
        Ok(mailbox)
    }

    /// Lists mailboxes under `reference` matching `pattern` (`*`, `%`).
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        let response = self
            .execute(&Command::List {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;
        Ok(response.lines.iter().filter_map(|line| parse_list(line)).collect())
    }

    /// Creates a mailbox.
    pub async fn create_mailbox(&mut self, name: &str) -> Result<()> {
        self.execute(&Command::Create {
            mailbox: name.to_string(),
        })
        .await
        .map(drop)
    }

    /// Creates `name` inside `folder`, joined with `.`.
    pub async fn create_mailbox_in(&mut self, folder: &str, name: &str) -> Result<()> {
        self.create_mailbox(&format!("{folder}{FOLDER_SEPARATOR}{name}"))
            .await
    }

    /// Deletes a mailbox.
    pub async fn delete_mailbox(&mut self, name: &str) -> Result<()> {
        self.execute(&Command::Delete {
            mailbox: name.to_string(),
        })
        .await
        .map(drop)
    }

    /// Deletes `name` inside `folder`, joined with `.`.
    pub async fn delete_mailbox_in(&mut self, folder: &str, name: &str) -> Result<()> {
        self.delete_mailbox(&format!("{folder}{FOLDER_SEPARATOR}{name}"))
            .await
    }

    /// Renames a mailbox.
    pub async fn rename_mailbox(&mut self, from: &str, to: &str) -> Result<()> {
        self.execute(&Command::Rename {
            from: from.to_string(),
            to: to.to_string(),
        })
        .await
        .map(drop)
    }

    /// Copies messages `begin..=end` of the selected mailbox into `mailbox`.
    pub async fn copy_messages(&mut self, mailbox: &str, begin: u32, end: u32) -> Result<()> {
        let sequence = if begin == end {
            SequenceSet::Single(begin)
        } else {
            SequenceSet::Range(begin, end)
        };
        self.execute(&Command::Copy {
            sequence,
            mailbox: mailbox.to_string(),
        })
        .await
        .map(drop)
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
    use crate::command::TagGenerator;
    use crate::connection::FramedTransport;
    use crate::types::{Flag, MailboxAttribute};
    use tokio_test::io::Builder;

    fn session(mock: tokio_test::io::Mock) -> Session<FramedTransport<tokio_test::io::Mock>> {
        Session::with_tags(FramedTransport::new(mock), TagGenerator::new("A"))
    }

    #[tokio::test]
    async fn test_select() {
        let mock = Builder::new()
            .write(b"A0000 SELECT INBOX\r\n")
            .read(b"* 172 EXISTS\r\n* 1 RECENT\r\n")
            .read(b"* OK [UNSEEN 12] Message 12 is first unseen\r\n")
            .read(b"* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n")
            .read(b"A0000 OK [READ-WRITE] SELECT completed\r\n")
            .build();
        let mut session = session(mock);

        let mailbox = session.select("INBOX").await.unwrap();
        assert_eq!(mailbox.name(), "INBOX");
        assert_eq!(mailbox.exists, 172);
        assert_eq!(mailbox.recent, 1);
        assert_eq!(mailbox.unseen, 12);
        assert!(mailbox.flags.contains(Flag::Flagged));
        assert!(mailbox.read_write);
    }

    #[tokio::test]
    async fn test_examine_read_only() {
        let mock = Builder::new()
            .write(b"A0000 EXAMINE \"Sent Items\"\r\n")
            .read(b"* 3 EXISTS\r\nA0000 OK [READ-ONLY] EXAMINE completed\r\n")
            .build();
        let mut session = session(mock);

        let mailbox = session.examine("Sent Items").await.unwrap();
        assert_eq!(mailbox.exists, 3);
        assert!(!mailbox.read_write);
    }

    #[tokio::test]
    async fn test_select_missing_mailbox() {
        let mock = Builder::new()
            .write(b"A0000 SELECT Nope\r\n")
            .read(b"A0000 NO Mailbox doesn't exist\r\n")
            .build();
        let mut session = session(mock);

        assert!(matches!(session.select("Nope").await, Err(Error::No(_))));
        assert_eq!(session.error_string(), "Mailbox doesn't exist");
    }

    #[tokio::test]
    async fn test_select_unexpected_first_line() {
        let mock = Builder::new()
            .write(b"A0000 SELECT INBOX\r\n")
            .read(b"garbage\r\nA0000 OK [READ-WRITE] done\r\n")
            .build();
        let mut session = session(mock);

        assert!(matches!(session.select("INBOX").await, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn test_list() {
        let mock = Builder::new()
            .write(b"A0000 LIST \"\" \"*\"\r\n")
            .read(b"* LIST (\\HasNoChildren) \".\" INBOX\r\n")
            .read(b"* LIST (\\HasChildren \\Noselect) \".\" Archive\r\n")
            .read(b"A0000 OK LIST completed\r\n")
            .build();
        let mut session = session(mock);

        let entries = session.list("", "*").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "Archive");
        assert_eq!(entries[1].delimiter, Some('.'));
        assert!(entries[1].attributes.contains(&MailboxAttribute::NoSelect));
    }

    #[tokio::test]
    async fn test_folder_helpers() {
        let mock = Builder::new()
            .write(b"A0000 CREATE Work.Reports\r\n")
            .read(b"A0000 OK CREATE completed\r\n")
            .write(b"A0001 RENAME Work.Reports Work.Old\r\n")
            .read(b"A0001 OK RENAME completed\r\n")
            .write(b"A0002 DELETE Work.Old\r\n")
            .read(b"A0002 OK DELETE completed\r\n")
            .build();
        let mut session = session(mock);

        session.create_mailbox_in("Work", "Reports").await.unwrap();
        session.rename_mailbox("Work.Reports", "Work.Old").await.unwrap();
        session.delete_mailbox_in("Work", "Old").await.unwrap();
    }

    #[tokio::test]
    async fn test_copy_messages() {
        let mock = Builder::new()
            .write(b"A0000 COPY 2:4 Archive\r\n")
            .read(b"A0000 OK COPY completed\r\n")
            .write(b"A0001 COPY 7 Archive\r\n")
            .read(b"A0001 OK COPY completed\r\n")
            .build();
        let mut session = session(mock);

        session.copy_messages("Archive", 2, 4).await.unwrap();
        session.copy_messages("Archive", 7, 7).await.unwrap();
    }
}
