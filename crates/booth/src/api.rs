//! Seam between the booth and its network collaborators.
//!
//! The state machine never talks to HTTP directly; it drives this trait,
//! implemented by the real API client in `stagedoor` and by fakes in tests.

use async_trait::async_trait;

use crate::session::Session;
use crate::take::Take;

/// A failure already shaped for the candidate: the message is the cleaned,
/// human-readable text and nothing else.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct UploadFailure {
    pub message: String,
}

impl UploadFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Operations the booth needs from the auth and upload services.
#[async_trait]
pub trait InterviewApi: Send + Sync {
    /// Upload the finished take as the candidate's single submission.
    async fn submit_video(&self, token: &str, take: &Take) -> Result<(), UploadFailure>;

    /// Re-fetch the session record from the auth service.
    async fn refresh_session(&self, token: &str) -> Result<Session, UploadFailure>;

    /// Best-effort server-side logout.
    async fn end_session(&self, token: &str) -> Result<(), UploadFailure>;
}
