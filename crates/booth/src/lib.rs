//! The interview booth core: a candidate records one continuous, bounded
//! take and submits it exactly once, while a time-boxed access session
//! counts down beside them.
//!
//! The moving parts, leaf to root:
//! - [`countdown`] — the session-expiry clock and its notices
//! - [`recorder`] — the `idle → recording → stopped` capture session
//! - [`take`] — the finished artifact and its playback handle
//! - [`retry`] — the durable re-record budget
//! - [`questions`] — the fixed prompt deck
//! - [`submit`] — the upload pipeline and its confirmation check
//!
//! Everything network-shaped goes through the [`api::InterviewApi`] seam so
//! the state machine can be driven against a fake directory in tests.

pub mod api;
pub mod countdown;
pub mod questions;
pub mod recorder;
pub mod retry;
pub mod session;
pub mod submit;
pub mod take;

pub use api::{InterviewApi, UploadFailure};
pub use countdown::{format_remaining, Countdown, CountdownEvent};
pub use questions::{Question, QuestionDeck, QUESTIONS};
pub use recorder::{format_elapsed, RecorderStatus, RecordingHandle, MAX_TAKE_SECS};
pub use retry::{RetryLedger, INITIAL_RETRY_BUDGET};
pub use session::{Session, UserData, VideoUpload, UPLOAD_STATUS_COMPLETED};
pub use submit::{SubmissionPipeline, SubmitError, SubmitOutcome};
pub use take::{PlaybackHandle, Take, MAX_TAKE_BYTES, TAKE_FILENAME};
