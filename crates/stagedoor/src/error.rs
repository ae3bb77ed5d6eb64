//! Failure classification and upstream message normalization.

use std::sync::OnceLock;

use regex::Regex;

/// Substring the auth service puts in `detail` when the access window has
/// closed. Distinguished so the UI can word it differently from a bad
/// credential.
pub(crate) const ACCESS_EXPIRED_MARKER: &str = "Access expired";

/// Shown when an upload dies without a usable upstream message.
pub(crate) const GENERIC_UPLOAD_ERROR: &str =
    "There was an error uploading your video. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid email or access token")]
    InvalidCredentials,

    /// The access window has closed. Carries the server's own wording.
    #[error("{0}")]
    AccessExpired(String),

    /// The session check was rejected; the stored token is no longer good.
    #[error("session check failed: {0}")]
    Unauthorized(String),

    /// The service answered with a non-success status. The message has
    /// already been cleaned for display.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub fn is_access_expired(&self) -> bool {
        matches!(self, ApiError::AccessExpired(_))
    }
}

/// Strip the numeric status prefix some upstream `detail` strings carry
/// (`"422: Bad file"` → `"Bad file"`). Cosmetic only.
pub(crate) fn clean_detail(detail: &str) -> String {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let re = PREFIX.get_or_init(|| Regex::new(r"^\d+:\s*").expect("static pattern"));
    re.replace(detail, "").into_owned()
}
