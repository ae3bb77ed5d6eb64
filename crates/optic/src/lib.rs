//! Camera and microphone capture for the interview booth.
//!
//! The platform camera lives behind the [`CaptureBackend`] trait. A backend
//! hands out at most one [`CaptureStream`] per acquisition: a live handle that
//! delivers encoded media chunks on a one second cadence and stops its tracks
//! when released. Release is idempotent and also runs on drop, so a stream can
//! never outlive its owner.
//!
//! Two backends ship with the crate:
//! - [`SyntheticBackend`] generates a deterministic test signal shaped like
//!   the real encoder output (chunk size derived from the encoding bitrates).
//! - [`FootageBackend`] feeds a pre-encoded recording through the same chunk
//!   cadence, which is how the booth runs against canned footage.

mod backend;
mod footage;
mod profile;
mod stream;
mod synthetic;

pub use backend::{CaptureBackend, CaptureError};
pub use footage::FootageBackend;
pub use profile::{
    EncodingProfile, VideoConstraints, AUDIO_BITS_PER_SECOND, FALLBACK_MIME_TYPE,
    PREFERRED_MIME_TYPE, VIDEO_BITS_PER_SECOND,
};
pub use stream::{CaptureStream, MediaChunk};
pub use synthetic::SyntheticBackend;
