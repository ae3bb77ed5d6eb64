//! The finished recording artifact.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::{Bytes, BytesMut};
use uuid::Uuid;

/// Upload ceiling. A take above this is kept for display but can never be
/// offered for submission.
pub const MAX_TAKE_BYTES: u64 = 100 * 1024 * 1024;

/// Filename the take travels under.
pub const TAKE_FILENAME: &str = "interview-recording.mp4";

/// A finalized recording: every chunk of one attempt, concatenated in
/// arrival order. At most one take exists at a time; a new attempt replaces
/// the previous take rather than mutating it.
#[derive(Debug, Clone)]
pub struct Take {
    pub data: Bytes,
    pub size_bytes: u64,
    pub mime_type: String,
    pub oversized: bool,
}

impl Take {
    /// Concatenate accumulated chunks into a single artifact and apply the
    /// size gate.
    pub fn assemble(chunks: Vec<Bytes>, mime_type: &str) -> Self {
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        let mut data = BytesMut::with_capacity(total);
        for chunk in &chunks {
            data.extend_from_slice(chunk);
        }

        let size_bytes = total as u64;
        let oversized = size_bytes > MAX_TAKE_BYTES;
        if oversized {
            tracing::warn!(size_bytes, "take exceeds the upload ceiling");
        }

        Self {
            data: data.freeze(),
            size_bytes,
            mime_type: mime_type.to_string(),
            oversized,
        }
    }

    pub fn submittable(&self) -> bool {
        !self.oversized
    }

    /// Whole megabytes, for display next to the filename.
    pub fn size_mb(&self) -> u64 {
        self.size_bytes / (1024 * 1024)
    }
}

/// A scrubbable playback copy of a take, materialized on disk.
///
/// The file lives only as long as the handle: replacing the take or tearing
/// the booth down drops the handle and removes the file.
#[derive(Debug)]
pub struct PlaybackHandle {
    path: PathBuf,
}

impl PlaybackHandle {
    pub fn materialize(take: &Take, dir: &Path) -> Result<Self> {
        let path = dir.join(format!("playback-{}.mp4", Uuid::new_v4()));
        std::fs::write(&path, &take.data)
            .with_context(|| format!("failed to write playback file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "playback copy materialized");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), %err, "failed to remove playback file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_preserves_chunk_order() {
        let take = Take::assemble(
            vec![
                Bytes::from_static(b"one"),
                Bytes::from_static(b"two"),
                Bytes::from_static(b"three"),
            ],
            "video/mp4",
        );
        assert_eq!(&take.data[..], b"onetwothree");
        assert_eq!(take.size_bytes, 11);
        assert!(take.submittable());
    }

    #[test]
    fn take_at_the_ceiling_is_still_submittable() {
        let take = Take::assemble(
            vec![Bytes::from(vec![0u8; MAX_TAKE_BYTES as usize])],
            "video/mp4",
        );
        assert!(!take.oversized);
        assert!(take.submittable());
    }

    #[test]
    fn take_over_the_ceiling_is_flagged() {
        let take = Take::assemble(
            vec![Bytes::from(vec![0u8; MAX_TAKE_BYTES as usize + 1])],
            "video/mp4",
        );
        assert!(take.oversized);
        assert!(!take.submittable());
        // The oversized take is retained for display.
        assert_eq!(take.size_bytes, MAX_TAKE_BYTES + 1);
    }

    #[test]
    fn playback_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let take = Take::assemble(vec![Bytes::from_static(b"footage")], "video/mp4");

        let handle = PlaybackHandle::materialize(&take, dir.path()).unwrap();
        let path = handle.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"footage");

        drop(handle);
        assert!(!path.exists());
    }
}
