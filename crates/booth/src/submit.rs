//! The submission pipeline.
//!
//! One upload, one confirmation. After a successful upload the session is
//! refreshed; if the server has not yet flipped the upload status, exactly
//! one more refresh runs after a fixed delay. The pipeline never re-uploads
//! on its own — re-invoking `submit` after a reported failure is the
//! candidate's call and is safe any number of times.

use std::sync::Arc;
use std::time::Duration;

use crate::api::InterviewApi;
use crate::session::Session;
use crate::take::Take;

/// Pause before the one-shot confirmation re-check.
pub const RECONCILE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("not signed in, please log in again")]
    MissingToken,

    #[error("the recording exceeds the upload size limit")]
    Oversized,

    #[error("an upload is already in progress")]
    Busy,

    #[error("{0}")]
    Upload(String),
}

/// Terminal state of one submission attempt that reached the server.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The refreshed session confirms the upload as completed.
    Confirmed(Session),
    /// The upload succeeded but no refresh confirmed it yet. The next
    /// session check on restart resolves the truth.
    Unconfirmed(Option<Session>),
}

impl SubmitOutcome {
    pub fn confirmed(&self) -> bool {
        matches!(self, SubmitOutcome::Confirmed(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SubmitOutcome::Confirmed(s) => Some(s),
            SubmitOutcome::Unconfirmed(s) => s.as_ref(),
        }
    }
}

pub struct SubmissionPipeline {
    api: Arc<dyn InterviewApi>,
    uploading: bool,
}

impl SubmissionPipeline {
    pub fn new(api: Arc<dyn InterviewApi>) -> Self {
        Self {
            api,
            uploading: false,
        }
    }

    /// Whether an upload is in flight. Gates both the upload action and the
    /// recording retry while set.
    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Upload a finished take and confirm it server-side.
    ///
    /// Requires a stored credential and a take under the size ceiling; both
    /// gates fail before any network traffic.
    pub async fn submit(
        &mut self,
        token: Option<&str>,
        take: &Take,
    ) -> Result<SubmitOutcome, SubmitError> {
        if self.uploading {
            return Err(SubmitError::Busy);
        }
        let token = token.ok_or(SubmitError::MissingToken)?;
        if take.oversized {
            return Err(SubmitError::Oversized);
        }

        self.uploading = true;
        let uploaded = self.api.submit_video(token, take).await;
        let first = match &uploaded {
            Ok(()) => {
                tracing::info!(size_bytes = take.size_bytes, "video uploaded");
                self.refresh(token).await
            }
            Err(_) => None,
        };
        self.uploading = false;

        uploaded.map_err(|failure| SubmitError::Upload(failure.message))?;

        match first {
            Some(session) if session.upload_completed() => Ok(SubmitOutcome::Confirmed(session)),
            first => {
                tokio::time::sleep(RECONCILE_DELAY).await;
                match self.refresh(token).await {
                    Some(session) if session.upload_completed() => {
                        Ok(SubmitOutcome::Confirmed(session))
                    }
                    second => Ok(SubmitOutcome::Unconfirmed(second.or(first))),
                }
            }
        }
    }

    async fn refresh(&self, token: &str) -> Option<Session> {
        match self.api.refresh_session(token).await {
            Ok(session) => Some(session),
            Err(failure) => {
                tracing::warn!(%failure, "session refresh failed");
                None
            }
        }
    }
}
