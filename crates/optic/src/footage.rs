//! Canned-footage backend.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::backend::{CaptureBackend, CaptureError};
use crate::profile::{EncodingProfile, VideoConstraints};
use crate::stream::{CaptureStream, MediaChunk, CHUNK_BUFFER};

/// Feeds a pre-encoded recording through the live-capture chunk cadence.
///
/// The file is read once at acquisition and then sliced into one second
/// windows sized from the encoding bitrates. When the footage runs out the
/// feed loops, the way a fake webcam device does.
#[derive(Debug, Clone)]
pub struct FootageBackend {
    path: PathBuf,
}

impl FootageBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CaptureBackend for FootageBackend {
    async fn acquire(&self, constraints: &VideoConstraints) -> Result<CaptureStream, CaptureError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|source| CaptureError::Footage {
                path: self.path.clone(),
                source,
            })?;
        if data.is_empty() {
            return Err(CaptureError::Device(format!(
                "footage file {} is empty",
                self.path.display()
            )));
        }

        tracing::debug!(
            width = constraints.width,
            height = constraints.height,
            "footage source keeps its original geometry"
        );

        let profile = EncodingProfile::negotiate(|_| true);
        let window = profile.bytes_per_second().max(1);
        let data = Bytes::from(data);
        let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
        let stop = CancellationToken::new();
        let producer_stop = stop.clone();

        tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            let mut ticker =
                tokio::time::interval_at(start + Duration::from_secs(1), Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seq: u64 = 0;
            let mut offset: usize = 0;

            loop {
                tokio::select! {
                    _ = producer_stop.cancelled() => break,
                    _ = ticker.tick() => {
                        if producer_stop.is_cancelled() {
                            break;
                        }
                        let end = (offset + window).min(data.len());
                        let chunk = MediaChunk {
                            seq,
                            data: data.slice(offset..end),
                        };
                        seq += 1;
                        offset = if end == data.len() { 0 } else { end };
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
            tracing::debug!("footage feed stopped");
        });

        Ok(CaptureStream::new(profile, rx, stop, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn missing_file_is_a_footage_error() {
        let backend = FootageBackend::new("/nonexistent/take.mp4");
        let err = backend
            .acquire(&VideoConstraints::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Footage { .. }));
    }

    #[tokio::test]
    async fn empty_file_is_a_device_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let backend = FootageBackend::new(file.path());
        let err = backend
            .acquire(&VideoConstraints::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Device(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn short_footage_loops() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abcd").unwrap();
        file.flush().unwrap();

        let backend = FootageBackend::new(file.path());
        let mut stream = backend
            .acquire(&VideoConstraints::default())
            .await
            .unwrap();

        for _ in 0..2 {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }

        let chunks = stream.poll_chunks();
        assert_eq!(chunks.len(), 2);
        // Four bytes fit inside one window, so every chunk replays the file.
        assert_eq!(&chunks[0].data[..], b"abcd");
        assert_eq!(&chunks[1].data[..], b"abcd");
    }
}
