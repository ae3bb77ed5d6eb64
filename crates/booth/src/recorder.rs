//! The recording session.
//!
//! One attempt moves `idle → recording → stopped` and never backwards; a
//! retry builds a fresh session instead of rewinding this one. While
//! recording, chunks are appended in arrival order and the elapsed counter
//! advances once per second in lockstep, with the hard cap checked on every
//! tick before yielding.

use std::time::Duration;

use bytes::Bytes;
use optic::{CaptureStream, VideoConstraints};
use tokio::sync::{oneshot, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::take::Take;

/// Hard recording cap. Reaching it stops the session exactly as a manual
/// stop would; nothing distinguishes a capped take from a voluntary one.
pub const MAX_TAKE_SECS: u64 = 900;

/// Where a recording session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderStatus {
    Idle,
    Recording,
    Stopped,
}

impl std::fmt::Display for RecorderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecorderStatus::Idle => write!(f, "idle"),
            RecorderStatus::Recording => write!(f, "recording"),
            RecorderStatus::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("recording session ended without producing a take")]
    Interrupted,
}

/// Handle over a live recording task.
///
/// The capture stream is lent to the task for the duration of the attempt
/// and handed back with the finished take, so a retry can reuse the same
/// device acquisition. Dropping the handle cancels the task; the stream then
/// drops with it and the device is released.
pub struct RecordingHandle {
    cancel: CancellationToken,
    elapsed: watch::Receiver<u64>,
    outcome: oneshot::Receiver<(Take, CaptureStream)>,
}

impl RecordingHandle {
    pub fn elapsed_secs(&self) -> u64 {
        *self.elapsed.borrow()
    }

    pub fn elapsed_watch(&self) -> watch::Receiver<u64> {
        self.elapsed.clone()
    }

    /// Whether the session task has already finalized (hard cap reached).
    pub fn finished(&self) -> bool {
        self.elapsed.has_changed().is_err()
    }

    /// Stop the session and collect the take plus the still-live stream.
    ///
    /// Valid whether the session is still recording or already capped: the
    /// cancel is idempotent and the finalized outcome is delivered either
    /// way.
    pub async fn stop(mut self) -> Result<(Take, CaptureStream), RecorderError> {
        self.cancel.cancel();
        (&mut self.outcome)
            .await
            .map_err(|_| RecorderError::Interrupted)
    }
}

impl Drop for RecordingHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Begin a recording session on a live capture stream.
///
/// Anything buffered before this call is discarded so the take starts at
/// the moment the candidate pressed record.
pub fn start(mut stream: CaptureStream) -> RecordingHandle {
    stream.apply_constraints(&VideoConstraints::default());
    stream.discard_backlog();

    let mime_type = stream.mime_type().to_string();
    let cancel = CancellationToken::new();
    let (elapsed_tx, elapsed_rx) = watch::channel(0u64);
    let (outcome_tx, outcome_rx) = oneshot::channel();

    let token = cancel.clone();
    tokio::spawn(async move {
        let start = tokio::time::Instant::now();
        let mut ticker =
            tokio::time::interval_at(start + Duration::from_secs(1), Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut chunks: Vec<Bytes> = Vec::new();
        let mut elapsed: u64 = 0;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if token.is_cancelled() {
                        break;
                    }

                    let arrived = stream.poll_chunks();
                    if arrived.is_empty() {
                        tracing::warn!(elapsed, "no chunk arrived this tick");
                    }
                    chunks.extend(arrived.into_iter().map(|c| c.data));

                    elapsed += 1;
                    let _ = elapsed_tx.send(elapsed);

                    if elapsed >= MAX_TAKE_SECS {
                        tracing::info!(elapsed, "recording reached the hard cap, stopping");
                        break;
                    }
                }
            }
        }

        // Flush whatever the encoder delivered while we were stopping.
        chunks.extend(stream.poll_chunks().into_iter().map(|c| c.data));

        let take = Take::assemble(chunks, &mime_type);
        tracing::info!(
            elapsed,
            size_bytes = take.size_bytes,
            oversized = take.oversized,
            "recording finalized"
        );

        if outcome_tx.send((take, stream)).is_err() {
            // Nobody is waiting; the stream drops here and the device with it.
            tracing::debug!("recording outcome discarded, releasing stream");
        }
    });

    RecordingHandle {
        cancel,
        elapsed: elapsed_rx,
        outcome: outcome_rx,
    }
}

/// Render elapsed recording time as `m:ss`.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
