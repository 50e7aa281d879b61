//! IMAP command tag generator.
//!
//! Tags are used to match commands with their responses.

/// Default tag prefix.
pub const DEFAULT_TAG_PREFIX: &str = "THIMAP";

/// Tag generator for IMAP commands.
///
/// Generates sequential tags in the format `THIMAP0000`, `THIMAP0001`, etc.
/// The counter wraps instead of overflowing, so consecutive tags always
/// differ.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: u32,
    prefix: String,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            counter: 0,
            prefix: prefix.into(),
        }
    }

    /// Generates the next tag.
    #[must_use]
    pub fn next(&mut self) -> String {
        let n = self.counter;
        self.counter = self.counter.wrapping_add(1);
        format!("{}{:04}", self.prefix, n)
    }

    /// Returns the current counter value without incrementing.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.counter
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_PREFIX)
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

    #[test]
    fn test_tag_generation() {
        let mut generator = TagGenerator::default();
        assert_eq!(generator.next(), "THIMAP0000");
        assert_eq!(generator.next(), "THIMAP0001");
        assert_eq!(generator.next(), "THIMAP0002");
    }

    #[test]
    fn test_custom_prefix() {
        let mut generator = TagGenerator::new("T");
        assert_eq!(generator.next(), "T0000");
        assert_eq!(generator.next(), "T0001");
    }

    #[test]
    fn test_current() {
        let mut generator = TagGenerator::default();
        assert_eq!(generator.current(), 0);
        let _ = generator.next();
        assert_eq!(generator.current(), 1);
    }

    #[test]
    fn test_consecutive_tags_differ() {
        let mut generator = TagGenerator::new("X");
        let mut previous = generator.next();
        for _ in 0..10000 {
            let tag = generator.next();
            assert_ne!(tag, previous);
            previous = tag;
        }
    }

    #[test]
    fn test_wraps_without_panicking() {
        let mut generator = TagGenerator::new("A");
        generator.counter = u32::MAX;
        let last = generator.next();
        let first = generator.next();
        assert_eq!(last, format!("A{}", u32::MAX));
        assert_eq!(first, "A0000");
    }
}
