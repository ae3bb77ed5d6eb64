//! Deterministic test-signal backend.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::backend::{CaptureBackend, CaptureError};
use crate::profile::{EncodingProfile, VideoConstraints, PREFERRED_MIME_TYPE};
use crate::stream::{CaptureStream, MediaChunk, CHUNK_BUFFER};

/// Generates encoder-shaped chunks on the one second cadence without touching
/// any real device. Chunk size follows the negotiated bitrates unless
/// overridden, and the byte pattern is a pure function of the sequence number.
#[derive(Debug, Clone, Default)]
pub struct SyntheticBackend {
    deny: bool,
    without_h264: bool,
    chunk_bytes: Option<usize>,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the candidate refusing the device permission prompt.
    pub fn deny_access(mut self) -> Self {
        self.deny = true;
        self
    }

    /// Simulate a platform without the preferred H.264 encoder.
    pub fn without_h264(mut self) -> Self {
        self.without_h264 = true;
        self
    }

    /// Override the per-chunk payload size.
    pub fn chunk_bytes(mut self, bytes: usize) -> Self {
        self.chunk_bytes = Some(bytes);
        self
    }
}

#[async_trait]
impl CaptureBackend for SyntheticBackend {
    async fn acquire(&self, constraints: &VideoConstraints) -> Result<CaptureStream, CaptureError> {
        if self.deny {
            return Err(CaptureError::PermissionDenied);
        }

        let without_h264 = self.without_h264;
        let profile =
            EncodingProfile::negotiate(|mime| !(without_h264 && mime == PREFERRED_MIME_TYPE));
        tracing::debug!(
            width = constraints.width,
            height = constraints.height,
            frame_rate = constraints.frame_rate,
            mime = %profile.mime_type,
            "synthetic capture acquired"
        );

        let chunk_bytes = self.chunk_bytes.unwrap_or_else(|| profile.bytes_per_second());
        let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
        let stop = CancellationToken::new();
        let producer_stop = stop.clone();

        tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            let mut ticker =
                tokio::time::interval_at(start + Duration::from_secs(1), Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seq: u64 = 0;

            loop {
                tokio::select! {
                    _ = producer_stop.cancelled() => break,
                    _ = ticker.tick() => {
                        if producer_stop.is_cancelled() {
                            break;
                        }
                        let fill = (seq % 251) as u8;
                        let chunk = MediaChunk {
                            seq,
                            data: Bytes::from(vec![fill; chunk_bytes]),
                        };
                        seq += 1;
                        match tx.try_send(chunk) {
                            Ok(()) => {}
                            Err(mpsc::error::TrySendError::Full(_)) => {
                                tracing::trace!(seq, "chunk buffer full, dropping");
                            }
                            Err(mpsc::error::TrySendError::Closed(_)) => break,
                        }
                    }
                }
            }
            tracing::debug!("synthetic capture tracks stopped");
        });

        Ok(CaptureStream::new(profile, rx, stop, true))
    }
}
