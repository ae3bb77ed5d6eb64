//! The platform capture seam.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::profile::VideoConstraints;
use crate::stream::CaptureStream;

/// Errors surfaced while acquiring or feeding the capture device.
///
/// Acquisition failures are terminal for the attempt but never for the
/// session: the caller may invoke [`CaptureBackend::acquire`] again.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("camera and microphone access was denied")]
    PermissionDenied,

    #[error("capture device unavailable: {0}")]
    Device(String),

    #[error("unreadable footage file {path}: {source}")]
    Footage {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Source of the live camera+microphone stream.
///
/// `acquire` suspends while the platform prompts for device access, then
/// yields a [`CaptureStream`] whose producer honors the requested constraints
/// best-effort: a backend that cannot apply them logs and proceeds with what
/// the device grants.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn acquire(&self, constraints: &VideoConstraints) -> Result<CaptureStream, CaptureError>;
}
