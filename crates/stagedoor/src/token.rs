//! Durable bearer token storage.
//!
//! One token, one file in the state directory. Written on login, removed on
//! logout and on any rejected session check.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const TOKEN_FILE: &str = "token";

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(TOKEN_FILE),
        }
    }

    /// The stored token, if a non-empty one exists.
    pub fn load(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let token = raw.trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }

    pub fn save(&self, token: &str) -> Result<()> {
        std::fs::write(&self.path, token)
            .with_context(|| format!("failed to write token file {}", self.path.display()))
    }

    /// Remove the stored token. Missing files are fine; anything else is
    /// logged and swallowed, since clearing runs on paths that must not
    /// fail (forced logout).
    pub fn clear(&self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), %err, "failed to clear token");
            }
        }
    }
}
