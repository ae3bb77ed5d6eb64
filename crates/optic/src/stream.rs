//! The live capture stream handle.

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::profile::{EncodingProfile, VideoConstraints};

/// How many encoded chunks may sit unread before the producer starts
/// dropping. The recorder drains every second, so this only fills while
/// nobody is recording.
pub(crate) const CHUNK_BUFFER: usize = 8;

/// One second of encoded media, tagged with its arrival sequence.
#[derive(Debug, Clone)]
pub struct MediaChunk {
    pub seq: u64,
    pub data: Bytes,
}

/// A live audio+video device handle.
///
/// Exactly one stream exists per successful acquisition. The preview side of
/// the stream is muted by construction; monitoring the microphone during
/// capture would feed back into it.
///
/// Releasing stops every track exactly once. It runs on explicit
/// [`release`](CaptureStream::release), on replacement, and on drop.
#[derive(Debug)]
pub struct CaptureStream {
    profile: EncodingProfile,
    chunks: mpsc::Receiver<MediaChunk>,
    stop: CancellationToken,
    adjustable: bool,
}

impl CaptureStream {
    pub(crate) fn new(
        profile: EncodingProfile,
        chunks: mpsc::Receiver<MediaChunk>,
        stop: CancellationToken,
        adjustable: bool,
    ) -> Self {
        Self {
            profile,
            chunks,
            stop,
            adjustable,
        }
    }

    /// Ask the device for a specific geometry. Best-effort: a source that
    /// cannot adjust keeps what it granted at acquisition, and recording
    /// proceeds either way.
    pub fn apply_constraints(&self, constraints: &VideoConstraints) {
        if self.adjustable {
            tracing::debug!(
                width = constraints.width,
                height = constraints.height,
                frame_rate = constraints.frame_rate,
                "video constraints applied"
            );
        } else {
            tracing::warn!(
                width = constraints.width,
                height = constraints.height,
                frame_rate = constraints.frame_rate,
                "device declined the requested constraints, keeping its native format"
            );
        }
    }

    pub fn profile(&self) -> &EncodingProfile {
        &self.profile
    }

    pub fn mime_type(&self) -> &str {
        &self.profile.mime_type
    }

    /// Whether the device tracks are still running.
    pub fn is_live(&self) -> bool {
        !self.stop.is_cancelled()
    }

    /// Drain every chunk that has arrived since the last poll, in arrival
    /// order. Returns an empty vec when nothing is pending.
    pub fn poll_chunks(&mut self) -> Vec<MediaChunk> {
        let mut out = Vec::new();
        while let Ok(chunk) = self.chunks.try_recv() {
            out.push(chunk);
        }
        out
    }

    /// Throw away anything buffered before a recording starts, so a take
    /// never opens with footage from before the candidate pressed record.
    pub fn discard_backlog(&mut self) -> usize {
        let dropped = self.poll_chunks().len();
        if dropped > 0 {
            tracing::debug!(dropped, "discarded buffered capture chunks");
        }
        dropped
    }

    /// Stop every track. Safe to call any number of times.
    pub fn release(&mut self) {
        if !self.stop.is_cancelled() {
            self.stop.cancel();
            tracing::debug!("capture stream released, tracks stopped");
        }
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_stream() -> (mpsc::Sender<MediaChunk>, CaptureStream) {
        let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
        let stream = CaptureStream::new(
            EncodingProfile::preferred(),
            rx,
            CancellationToken::new(),
            true,
        );
        (tx, stream)
    }

    #[tokio::test]
    async fn poll_preserves_arrival_order() {
        let (tx, mut stream) = test_stream();
        for seq in 0..3u64 {
            tx.send(MediaChunk {
                seq,
                data: Bytes::from(vec![seq as u8]),
            })
            .await
            .unwrap();
        }

        let chunks = stream.poll_chunks();
        let seqs: Vec<u64> = chunks.iter().map(|c| c.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert!(stream.poll_chunks().is_empty());
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let (_tx, mut stream) = test_stream();
        assert!(stream.is_live());

        stream.release();
        assert!(!stream.is_live());

        // A second release must be a no-op, not a panic or a double stop.
        stream.release();
        assert!(!stream.is_live());
    }

    #[tokio::test]
    async fn discard_backlog_counts_dropped_chunks() {
        let (tx, mut stream) = test_stream();
        for seq in 0..5u64 {
            tx.send(MediaChunk {
                seq,
                data: Bytes::new(),
            })
            .await
            .unwrap();
        }

        assert_eq!(stream.discard_backlog(), 5);
        assert_eq!(stream.discard_backlog(), 0);
    }
}
