//! Command argument types.

use std::fmt;

use chrono::NaiveDate;

use crate::types::Flag;

/// How [`Session::login`](crate::Session::login) authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoginType {
    /// `LOGIN user pass` in a single command.
    #[default]
    Plain,
    /// `AUTHENTICATE LOGIN` with base64 username and password continuations.
    Authenticate,
    /// `AUTHENTICATE CRAM-MD5` challenge/response.
    CramMd5,
}

/// Sequence set for specifying message ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single sequence number.
    Single(u32),
    /// Range of sequence numbers (inclusive).
    Range(u32, u32),
    /// Range from start to end of mailbox.
    RangeFrom(u32),
    /// Explicit list of sequence numbers.
    List(Vec<u32>),
}

impl SequenceSet {
    /// Every message in the mailbox (`1:*`).
    pub const ALL: Self = Self::RangeFrom(1);
}

impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::List(ids) => {
                let s: Vec<_> = ids.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}

/// Items to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// Macro: FLAGS INTERNALDATE RFC822.SIZE ENVELOPE.
    All,
    /// UID only.
    Uid,
    /// BODYSTRUCTURE.
    BodyStructure,
    /// `BODY[section]`.
    Body(String),
}

/// STORE action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    /// Add a flag.
    AddFlag(Flag),
    /// Remove a flag.
    RemoveFlag(Flag),
}

impl StoreAction {
    /// Adds the flag when `value` is true, removes it otherwise.
    #[must_use]
    pub const fn set(flag: Flag, value: bool) -> Self {
        if value {
            Self::AddFlag(flag)
        } else {
            Self::RemoveFlag(flag)
        }
    }
}

/// SEARCH criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// To contains text.
    To(String),
    /// Cc contains text.
    Cc(String),
    /// Bcc contains text.
    Bcc(String),
    /// From contains text.
    From(String),
    /// Text in header or body.
    Text(String),
    /// Body contains text.
    Body(String),
    /// Subject contains text.
    Subject(String),
    /// Internal date on or after the day.
    Since(NaiveDate),
    /// Date header on the day.
    SentOn(NaiveDate),
    /// Date header on or after the day.
    SentSince(NaiveDate),
    /// Date header before the day.
    SentBefore(NaiveDate),
    /// Larger than size.
    Larger(u32),
    /// Smaller than size.
    Smaller(u32),
    /// Messages with \Draft flag.
    Draft,
    /// Messages with \Recent flag.
    Recent,
    /// Messages without \Seen flag.
    Unseen,
    /// Messages with \Deleted flag.
    Deleted,
    /// Messages with \Answered flag.
    Answered,
    /// Messages without \Answered flag.
    Unanswered,
    /// Recent messages that have not been seen.
    RecentUnseen,
    /// Criteria text passed through as is.
    Raw(String),
}

impl SearchCriteria {
    /// Caller-supplied text the criterion carries, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::To(text)
            | Self::Cc(text)
            | Self::Bcc(text)
            | Self::From(text)
            | Self::Text(text)
            | Self::Body(text)
            | Self::Subject(text)
            | Self::Raw(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        super::serialize::write_search_criteria(&mut buf, self);
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_set_display() {
        assert_eq!(SequenceSet::Single(1).to_string(), "1");
        assert_eq!(SequenceSet::Range(1, 10).to_string(), "1:10");
        assert_eq!(SequenceSet::ALL.to_string(), "1:*");
        assert_eq!(SequenceSet::List(vec![3, 5, 8]).to_string(), "3,5,8");
    }

    #[test]
    fn test_store_action_set() {
        assert_eq!(StoreAction::set(Flag::Seen, true), StoreAction::AddFlag(Flag::Seen));
        assert_eq!(
            StoreAction::set(Flag::Deleted, false),
            StoreAction::RemoveFlag(Flag::Deleted)
        );
    }

    #[test]
    fn test_search_criteria_display() {
        assert_eq!(SearchCriteria::To("bob".into()).to_string(), "TO bob");
        assert_eq!(
            SearchCriteria::Subject("two words".into()).to_string(),
            "SUBJECT \"two words\""
        );
        assert_eq!(
            SearchCriteria::SentSince(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).to_string(),
            "SENTSINCE 01-Jan-2024"
        );
        assert_eq!(SearchCriteria::Larger(1024).to_string(), "LARGER 1024");
        assert_eq!(SearchCriteria::RecentUnseen.to_string(), "RECENT UNSEEN");
    }
}
