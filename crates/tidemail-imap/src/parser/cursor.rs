//! Recursive-descent cursor over one logical response line.
//!
//! A logical line is what [`Session`](crate::Session) hands to the parsers:
//! the server's text with every `{N}` literal already spliced in. The cursor
//! reads IMAP values (atoms, numbers, quoted strings, literals, `NIL`, and
//! parenthesized lists) into a [`Value`] tree.

#![allow(clippy::missing_errors_doc)]

use std::borrow::Cow;

use crate::{Error, Result};

/// One parsed IMAP value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `NIL`.
    Nil,
    /// Bare atom, including flags (`\Seen`) and section keys (`BODY[1]`).
    Atom(String),
    /// All-digit atom.
    Number(u32),
    /// Quoted string or literal.
    String(Vec<u8>),
    /// Parenthesized list.
    List(Vec<Value>),
}

impl Value {
    /// Returns true for `NIL`.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true for a parenthesized list.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// List items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Text of a string, atom, or number. `NIL` and lists have none.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(bytes) => Some(String::from_utf8_lossy(bytes)),
            Self::Atom(atom) => Some(Cow::Borrowed(atom)),
            Self::Number(n) => Some(Cow::Owned(n.to_string())),
            Self::Nil | Self::List(_) => None,
        }
    }

    /// Raw bytes of a string value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::String(bytes) => Some(bytes),
            Self::Atom(atom) => Some(atom.as_bytes()),
            _ => None,
        }
    }

    /// Numeric value, also accepting digits sent as a string.
    #[must_use]
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Cursor state.
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor for the given input.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Returns true if only a line ending (or nothing) is left.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.remaining().iter().all(|b| matches!(b, b'\r' | b'\n'))
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Advances by one byte and returns it.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips optional spaces.
    pub fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    /// Consumes `literal` (ASCII case-insensitive) or fails without moving.
    pub fn expect(&mut self, literal: &str) -> Result<()> {
        if self.try_expect(literal) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected {literal:?}")))
        }
    }

    /// Consumes `literal` (ASCII case-insensitive) if it comes next.
    pub fn try_expect(&mut self, literal: &str) -> bool {
        let end = self.pos + literal.len();
        match self.input.get(self.pos..end) {
            Some(next) if next.eq_ignore_ascii_case(literal.as_bytes()) => {
                self.pos = end;
                true
            }
            _ => false,
        }
    }

    /// Reads an atom.
    ///
    /// Brackets are kept together so `BODY[HEADER.FIELDS (FROM)]` and
    /// `[UNSEEN 3]` read as one atom.
    pub fn parse_atom(&mut self) -> Result<&'a str> {
        let start = self.pos;
        let mut depth = 0usize;

        while let Some(b) = self.peek() {
            match b {
                b'[' => depth += 1,
                b']' if depth > 0 => depth -= 1,
                b'\r' | b'\n' => break,
                b' ' | b'(' | b')' | b'"' | b'{' if depth == 0 => break,
                _ => {}
            }
            self.pos += 1;
        }

        if self.pos == start {
            return Err(self.error("Expected atom"));
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("Invalid UTF-8 in atom"))
    }

    /// Reads an unsigned number.
    pub fn parse_number(&mut self) -> Result<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| self.error("Expected number"))
    }

    /// Reads an nstring: a quoted string, a literal, or `NIL`.
    pub fn parse_quoted_or_nil(&mut self) -> Result<Option<Vec<u8>>> {
        match self.peek() {
            Some(b'"') => self.parse_quoted().map(Some),
            Some(b'{') => self.parse_literal().map(Some),
            _ if self.try_expect("NIL") => Ok(None),
            _ => Err(self.error("Expected string or NIL")),
        }
    }

    /// Reads a parenthesized list of values.
    ///
    /// A list cut off by the end of input is closed implicitly.
    pub fn parse_paren_list(&mut self) -> Result<Vec<Value>> {
        self.expect("(")?;
        let mut items = Vec::new();

        loop {
            self.skip_spaces();
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(items);
                }
                None | Some(b'\r' | b'\n') => {
                    tracing::debug!(position = self.pos, "unterminated list in response");
                    return Ok(items);
                }
                Some(_) => items.push(self.parse_value()?),
            }
        }
    }

    /// Reads any value.
    pub fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some(b'(') => self.parse_paren_list().map(Value::List),
            Some(b'"') => self.parse_quoted().map(Value::String),
            Some(b'{') => self.parse_literal().map(Value::String),
            Some(_) => {
                let atom = self.parse_atom()?;
                if atom.eq_ignore_ascii_case("NIL") {
                    Ok(Value::Nil)
                } else if atom.bytes().all(|b| b.is_ascii_digit()) {
                    Ok(atom
                        .parse()
                        .map_or_else(|_| Value::Atom(atom.to_string()), Value::Number))
                } else {
                    Ok(Value::Atom(atom.to_string()))
                }
            }
            None => Err(self.error("Unexpected end of input")),
        }
    }

    /// Reads a quoted string, unescaping `\"` and `\\`.
    fn parse_quoted(&mut self) -> Result<Vec<u8>> {
        self.expect("\"")?;
        let mut result = Vec::new();

        loop {
            match self.advance() {
                Some(b'"') => return Ok(result),
                Some(b'\\') => match self.advance() {
                    Some(c) => result.push(c),
                    None => return Err(self.error("Unexpected EOF in quoted string")),
                },
                Some(c) => result.push(c),
                None => return Err(self.error("Unexpected EOF in quoted string")),
            }
        }
    }

    /// Reads a `{N}` literal and its N bytes of data.
    fn parse_literal(&mut self) -> Result<Vec<u8>> {
        self.expect("{")?;
        let size = self.parse_number()? as usize;
        self.try_expect("+");
        self.expect("}")?;
        if !self.try_expect("\r\n") {
            self.expect("\n")?;
        }

        let end = self.pos + size;
        let data = self
            .input
            .get(self.pos..end)
            .ok_or_else(|| self.error("Incomplete literal data"))?;
        self.pos = end;
        Ok(data.to_vec())
    }

    /// Creates a parse error at the current position.
    fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn string(s: &str) -> Value {
        Value::String(s.as_bytes().to_vec())
    }

    #[test]
    fn test_expect_case_insensitive() {
        let mut cursor = Cursor::new(b"* search 1");
        cursor.expect("* SEARCH").unwrap();
        assert_eq!(cursor.remaining(), b" 1");
        assert!(cursor.expect("X").is_err());
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_nested_list() {
        let mut cursor = Cursor::new(b"(\"a\" NIL (1 \\Seen))");
        let value = cursor.parse_value().unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                string("a"),
                Value::Nil,
                Value::List(vec![Value::Number(1), Value::Atom("\\Seen".into())]),
            ])
        );
    }

    #[test]
    fn test_quoted_escapes() {
        let mut cursor = Cursor::new(br#""say \"hi\" \\ bye""#);
        assert_eq!(
            cursor.parse_quoted_or_nil().unwrap().unwrap(),
            br#"say "hi" \ bye"#
        );
    }

    #[test]
    fn test_literal_value() {
        let mut cursor = Cursor::new(b"(BODY[1] {5}\r\nhe)lo)");
        let value = cursor.parse_value().unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Atom("BODY[1]".into()), string("he)lo")])
        );
    }

    #[test]
    fn test_incomplete_literal_fails() {
        let mut cursor = Cursor::new(b"{10}\r\nshort");
        assert!(cursor.parse_value().is_err());
    }

    #[test]
    fn test_bracketed_atom_with_spaces() {
        let mut cursor = Cursor::new(b"BODY[HEADER.FIELDS (FROM TO)] NIL");
        assert_eq!(cursor.parse_atom().unwrap(), "BODY[HEADER.FIELDS (FROM TO)]");
    }

    #[test]
    fn test_unterminated_list_closes() {
        let mut cursor = Cursor::new(b"(1 2\r\n");
        assert_eq!(
            cursor.parse_value().unwrap(),
            Value::List(vec![Value::Number(1), Value::Number(2)])
        );
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(string("42").as_number(), Some(42));
        assert_eq!(Value::Atom("x".into()).as_text().unwrap(), "x");
        assert!(Value::Nil.as_text().is_none());
        assert!(Value::List(Vec::new()).is_list());
        assert!(Cursor::new(b"NIL").parse_value().unwrap().is_nil());
        assert!(!string("NIL").is_nil());
    }

    #[test]
    fn test_is_eof_ignores_line_ending() {
        let mut cursor = Cursor::new(b"OK\r\n");
        cursor.expect("OK").unwrap();
        assert!(cursor.is_eof());
    }
}
