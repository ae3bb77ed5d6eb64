//! The server-issued session record.
//!
//! Owned by the auth service; the booth only reads it. Unknown fields are
//! tolerated and every optional field defaults to absent, so a newer server
//! never breaks an older booth.

use serde::{Deserialize, Serialize};

/// Upload status value that marks a submission as received and confirmed.
pub const UPLOAD_STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
}

/// The stored upload record, present once a video has reached the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoUpload {
    pub upload_status: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub storage_filename: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_data: UserData,
    /// ISO-8601 access expiry. Absent means no countdown runs.
    #[serde(default)]
    pub access_expiry: Option<String>,
    #[serde(default)]
    pub minutes_remaining: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub video_upload: Option<VideoUpload>,
}

impl Session {
    /// Whether the server already holds a confirmed submission.
    pub fn upload_completed(&self) -> bool {
        matches!(&self.video_upload, Some(v) if v.upload_status == UPLOAD_STATUS_COMPLETED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_minimal_payload() {
        let session: Session = serde_json::from_str(
            r#"{"user_data": {"id": "u-1", "email": "a@b.example"}}"#,
        )
        .unwrap();
        assert!(session.access_expiry.is_none());
        assert!(!session.upload_completed());
    }

    #[test]
    fn completed_requires_the_exact_status() {
        let session: Session = serde_json::from_str(
            r#"{
                "user_data": {"id": "u-1", "email": "a@b.example"},
                "video_upload": {"upload_status": "processing"}
            }"#,
        )
        .unwrap();
        assert!(!session.upload_completed());

        let session: Session = serde_json::from_str(
            r#"{
                "user_data": {"id": "u-1", "email": "a@b.example"},
                "video_upload": {"upload_status": "completed", "file_size": 12345}
            }"#,
        )
        .unwrap();
        assert!(session.upload_completed());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let session: Session = serde_json::from_str(
            r#"{
                "user_data": {"id": "u-1", "email": "a@b.example", "tier": "gold"},
                "access_expiry": "2026-03-01T12:00:00Z",
                "flags": {"beta": true}
            }"#,
        )
        .unwrap();
        assert_eq!(session.access_expiry.as_deref(), Some("2026-03-01T12:00:00Z"));
    }
}
