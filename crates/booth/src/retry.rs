//! The durable re-record budget.
//!
//! The only value in the booth with a durability requirement: the count is
//! written synchronously on every decrement, before control returns, so a
//! restart mid-session resumes with the budget already spent.

use std::path::{Path, PathBuf};

/// Retries remaining after the first attempt, i.e. three total attempts.
pub const INITIAL_RETRY_BUDGET: u32 = 2;

/// Fixed name of the ledger file inside the state directory.
pub const RETRY_LEDGER_FILE: &str = "interview_retry_count";

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("failed to read retry ledger {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write retry ledger {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Bounded retry counter backed by a single integer on disk.
#[derive(Debug)]
pub struct RetryLedger {
    remaining: u32,
    path: PathBuf,
}

impl RetryLedger {
    /// Read the ledger from the state directory, starting a fresh budget
    /// when no ledger exists yet. An unreadable value (hand-edited file)
    /// resets to the initial budget rather than locking the candidate out.
    pub fn open(state_dir: &Path) -> Result<Self, LedgerError> {
        let path = state_dir.join(RETRY_LEDGER_FILE);
        let remaining = match std::fs::read_to_string(&path) {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(n) => n.min(INITIAL_RETRY_BUDGET),
                Err(err) => {
                    tracing::warn!(%err, path = %path.display(), "unreadable retry ledger, resetting");
                    INITIAL_RETRY_BUDGET
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => INITIAL_RETRY_BUDGET,
            Err(source) => return Err(LedgerError::Read { path, source }),
        };

        Ok(Self { remaining, path })
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Spend one retry. Returns `false` without touching anything when the
    /// budget is already exhausted; otherwise the decremented count is on
    /// disk before this returns.
    pub fn consume(&mut self) -> Result<bool, LedgerError> {
        if self.remaining == 0 {
            return Ok(false);
        }

        let next = self.remaining - 1;
        std::fs::write(&self.path, next.to_string()).map_err(|source| LedgerError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.remaining = next;
        tracing::info!(remaining = next, "retry spent");
        Ok(true)
    }
}
