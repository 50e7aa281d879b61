//! Email addresses from ENVELOPE structures.

use std::fmt;

/// Placeholder used when one half of an address is missing.
pub const UNKNOWN_PART: &str = "unknown";

/// An email address as reported in an IMAP envelope.
///
/// Addresses are immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Address {
    display_name: Option<String>,
    smtp_domain: Option<String>,
    mailbox: String,
    host: String,
}

impl Address {
    /// Creates an address from its mailbox (local part) and host.
    #[must_use]
    pub fn new(mailbox: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            display_name: None,
            smtp_domain: None,
            mailbox: mailbox.into(),
            host: host.into(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the SMTP source route.
    #[must_use]
    pub fn with_smtp_domain(mut self, route: impl Into<String>) -> Self {
        self.smtp_domain = Some(route.into());
        self
    }

    /// Returns the display name, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the SMTP source route, if any.
    #[must_use]
    pub fn smtp_domain(&self) -> Option<&str> {
        self.smtp_domain.as_deref()
    }

    /// Returns the local part.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns `mailbox@host`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}@{}", self.mailbox, self.host)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => {
                write!(f, "\"{name}\" <{}@{}>", self.mailbox, self.host)
            }
            _ => write!(f, "{}@{}", self.mailbox, self.host),
        }
    }
}
