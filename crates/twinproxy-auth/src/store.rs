//! File-backed credential store.
//!
//! The file is read again on every verification, so edits take effect for
//! the next connection without a restart. Nothing is cached.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::entry::{self, CredentialEntry, Line};
use crate::error::AuthError;
use crate::hash::verify_hash;
use crate::result::AuthResult;
use crate::traits::CredentialVerifier;

/// Outcome of [`CredentialStore::ensure_exists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// No path configured; nothing to do.
    Skipped,
    /// The file did not exist and was created empty.
    Created,
    /// The file already existed and was left untouched.
    Existing,
}

/// htpasswd-style credential file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure a credential file exists at `path`.
    ///
    /// Opens the file in append/create mode, so existing content is never
    /// truncated. `None` is a no-op.
    pub async fn ensure_exists(path: Option<&Path>) -> Result<EnsureOutcome, AuthError> {
        let Some(path) = path else {
            return Ok(EnsureOutcome::Skipped);
        };
        let existed = tokio::fs::try_exists(path).await.unwrap_or(false);
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        if existed {
            Ok(EnsureOutcome::Existing)
        } else {
            info!(path = %path.display(), "auth file created");
            Ok(EnsureOutcome::Created)
        }
    }

    /// Read the whole file.
    async fn read(&self) -> Result<String, AuthError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AuthError::Backend(format!("cannot read {}: {e}", self.path.display()))
        })
    }

    /// All well-formed entries, in file order.
    pub async fn entries(&self) -> Result<Vec<CredentialEntry>, AuthError> {
        let content = self.read().await?;
        Ok(entry::parse_entries(&content).collect())
    }

    /// First entry for `username`.
    pub async fn find(&self, username: &str) -> Result<Option<CredentialEntry>, AuthError> {
        let content = self.read().await?;
        Ok(entry::find_entry(&content, username))
    }

    /// Append a `username:hash` line, creating the file if needed.
    ///
    /// Existing entries for the same username are left in place; the earlier
    /// entry keeps winning lookups.
    pub async fn append_entry(&self, entry: &CredentialEntry) -> Result<(), AuthError> {
        validate_username(&entry.username)?;
        if entry.password_hash.contains(['\n', '\r']) {
            return Err(AuthError::Backend("hash must be a single line".into()));
        }

        let needs_newline = match tokio::fs::read(&self.path).await {
            Ok(existing) => existing.last().is_some_and(|b| *b != b'\n'),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let mut line = String::new();
        if needs_newline {
            line.push('\n');
        }
        line.push_str(&entry.to_line());
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        debug!(user = %entry.username, path = %self.path.display(), "credential appended");
        Ok(())
    }

    /// Rewrite the file without any entry for `username`.
    ///
    /// Comments, blank and malformed lines are preserved. Returns the number
    /// of removed entries.
    pub async fn remove_user(&self, username: &str) -> Result<usize, AuthError> {
        let content = self.read().await?;
        let mut removed = 0;
        let mut kept = String::with_capacity(content.len());
        for line in content.lines() {
            if let Line::Entry(e) = CredentialEntry::parse_line(line)
                && e.username == username
            {
                removed += 1;
                continue;
            }
            kept.push_str(line);
            kept.push('\n');
        }
        if removed > 0 {
            tokio::fs::write(&self.path, kept).await?;
        }
        Ok(removed)
    }
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::Backend("username must not be empty".into()));
    }
    if username.contains([':', '\n', '\r']) || username.starts_with('#') {
        return Err(AuthError::Backend(format!(
            "username {username:?} contains reserved characters"
        )));
    }
    Ok(())
}

#[async_trait]
impl CredentialVerifier for CredentialStore {
    async fn verify(&self, username: &str, password: &str) -> Result<AuthResult, AuthError> {
        let Some(entry) = self.find(username).await? else {
            return Err(AuthError::NotFound);
        };

        let password = password.to_owned();
        let hash = entry.password_hash;
        let matched = tokio::task::spawn_blocking(move || verify_hash(&password, &hash))
            .await
            .map_err(AuthError::backend)?;

        if matched {
            Ok(AuthResult::with_user_id(entry.username))
        } else {
            Err(AuthError::Invalid)
        }
    }
}
