//! htpasswd line format.

use serde::Serialize;
use tracing::debug;

use crate::hash::Scheme;

/// One `username:hash` line of a credential file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialEntry {
    pub username: String,
    pub password_hash: String,
}

/// Classification of a single credential-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Entry(CredentialEntry),
    /// Blank line or `#` comment.
    Ignored,
    /// No `:` separator or an empty username.
    Malformed,
}

impl CredentialEntry {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }

    /// Scheme of the stored hash.
    #[inline]
    pub fn scheme(&self) -> Scheme {
        Scheme::detect(&self.password_hash)
    }

    /// Classify one line. Surrounding whitespace is ignored.
    pub fn parse_line(line: &str) -> Line {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Line::Ignored;
        }
        match line.split_once(':') {
            Some((user, hash)) if !user.is_empty() => Line::Entry(Self::new(user, hash)),
            _ => Line::Malformed,
        }
    }

    /// Render as a credential-file line, without the newline.
    pub fn to_line(&self) -> String {
        format!("{}:{}", self.username, self.password_hash)
    }
}

/// Iterate over the well-formed entries of a credential file, in file order.
///
/// Malformed lines are skipped with a debug trace.
pub fn parse_entries(content: &str) -> impl Iterator<Item = CredentialEntry> + '_ {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match CredentialEntry::parse_line(line) {
            Line::Entry(entry) => Some(entry),
            Line::Ignored => None,
            Line::Malformed => {
                debug!(line = idx + 1, "skipping malformed credential line");
                None
            }
        })
}

/// First entry for `username`, if any.
pub fn find_entry(content: &str, username: &str) -> Option<CredentialEntry> {
    parse_entries(content).find(|e| e.username == username)
}
