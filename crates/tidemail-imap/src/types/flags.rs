//! Message flags.

use std::fmt;

/// A standard IMAP system flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message has been answered.
    Answered,
    /// Message is marked for deletion.
    Deleted,
    /// Message is a draft.
    Draft,
    /// Message is flagged for special attention.
    Flagged,
    /// Message is recent (first session to see it).
    Recent,
    /// Message has been read.
    Seen,
}

impl Flag {
    /// All system flags in canonical order.
    pub const ALL: [Self; 6] = [
        Self::Answered,
        Self::Deleted,
        Self::Draft,
        Self::Flagged,
        Self::Recent,
        Self::Seen,
    ];

    /// Parses a flag string such as `\Seen`, ignoring case.
    ///
    /// Keywords and unknown flags return `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let name = s.strip_prefix('\\')?;
        Self::ALL
            .into_iter()
            .find(|flag| flag.as_str()[1..].eq_ignore_ascii_case(name))
    }

    /// Returns the flag as an IMAP string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Answered => "\\Answered",
            Self::Deleted => "\\Deleted",
            Self::Draft => "\\Draft",
            Self::Flagged => "\\Flagged",
            Self::Recent => "\\Recent",
            Self::Seen => "\\Seen",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Answered => 1,
            Self::Deleted => 1 << 1,
            Self::Draft => 1 << 2,
            Self::Flagged => 1 << 3,
            Self::Recent => 1 << 4,
            Self::Seen => 1 << 5,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of system flags on a message or mailbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    /// Creates an empty flag set.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Parses a space-separated flag list, with or without parentheses.
    ///
    /// Keywords and unknown flags are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        text.trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split_ascii_whitespace()
            .filter_map(Flag::parse)
            .collect()
    }

    /// Adds a flag.
    pub const fn insert(&mut self, flag: Flag) {
        self.0 |= flag.bit();
    }

    /// Removes a flag.
    pub const fn remove(&mut self, flag: Flag) {
        self.0 &= !flag.bit();
    }

    /// Adds or removes a flag.
    pub const fn set(&mut self, flag: Flag, value: bool) {
        if value {
            self.insert(flag);
        } else {
            self.remove(flag);
        }
    }

    /// Returns true if the flag is present.
    #[must_use]
    pub const fn contains(self, flag: Flag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Returns true if the message has been seen.
    #[must_use]
    pub const fn is_seen(self) -> bool {
        self.contains(Flag::Seen)
    }

    /// Returns true if the message has been answered.
    #[must_use]
    pub const fn is_answered(self) -> bool {
        self.contains(Flag::Answered)
    }

    /// Returns true if the message is flagged.
    #[must_use]
    pub const fn is_flagged(self) -> bool {
        self.contains(Flag::Flagged)
    }

    /// Returns true if the message is marked for deletion.
    #[must_use]
    pub const fn is_deleted(self) -> bool {
        self.contains(Flag::Deleted)
    }

    /// Returns true if the message is a draft.
    #[must_use]
    pub const fn is_draft(self) -> bool {
        self.contains(Flag::Draft)
    }

    /// Returns true if the message is recent.
    #[must_use]
    pub const fn is_recent(self) -> bool {
        self.contains(Flag::Recent)
    }

    /// Returns an iterator over the flags in canonical order.
    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }

    /// Returns the number of flags.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns true if there are no flags.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut flags = Self::new();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl From<Flag> for Flags {
    fn from(flag: Flag) -> Self {
        Self(flag.bit())
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(flag.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_flag_parse() {
        assert_eq!(Flag::parse("\\Seen"), Some(Flag::Seen));
        assert_eq!(Flag::parse("\\FLAGGED"), Some(Flag::Flagged));
        assert_eq!(Flag::parse("custom"), None);
        assert_eq!(Flag::parse("\\Junk"), None);
    }

    #[test]
    fn test_flags_parse_list() {
        let flags = Flags::parse("(\\Seen \\Answered $Forwarded)");
        assert!(flags.is_seen());
        assert!(flags.is_answered());
        assert_eq!(flags.len(), 2);
    }

    #[test]
    fn test_flags_collection() {
        let mut flags = Flags::new();
        assert!(flags.is_empty());

        flags.insert(Flag::Seen);
        assert!(flags.is_seen());
        assert!(!flags.is_flagged());

        flags.insert(Flag::Flagged);
        assert!(flags.is_flagged());
        assert_eq!(flags.len(), 2);

        flags.set(Flag::Seen, false);
        assert!(!flags.is_seen());
    }

    #[test]
    fn test_flags_display() {
        let flags: Flags = [Flag::Seen, Flag::Answered].into_iter().collect();
        assert_eq!(flags.to_string(), "\\Answered \\Seen");
        assert_eq!(Flags::new().to_string(), "");
    }

    proptest! {
        #[test]
        fn prop_flags_round_trip(bits in 0u8..64) {
            let flags: Flags = Flag::ALL
                .into_iter()
                .enumerate()
                .filter(|(i, _)| bits & (1 << i) != 0)
                .map(|(_, flag)| flag)
                .collect();
            prop_assert_eq!(Flags::parse(&flags.to_string()), flags);
        }
    }
}
