//! The API client proper.

use async_trait::async_trait;
use serde::Deserialize;

use booth::{InterviewApi, Session, Take, UploadFailure, TAKE_FILENAME};

use crate::error::{clean_detail, ApiError, ACCESS_EXPIRED_MARKER, GENERIC_UPLOAD_ERROR};

/// Structured error payload every collaborator returns on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Payload returned by a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: Session,
}

/// Client over the auth and upload services.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange an email and access secret for a bearer token and session.
    ///
    /// The upstream takes credentials as query parameters. An "Access
    /// expired" detail is classified apart from a plain bad credential so
    /// the login screen can word it precisely.
    pub async fn login(&self, email: &str, secret: &str) -> Result<AuthResponse, ApiError> {
        let response = self
            .http
            .post(self.url("/api/v1/auth/login"))
            .query(&[("email", email), ("password", secret)])
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        match response.json::<ErrorBody>().await {
            Ok(body) if body.detail.contains(ACCESS_EXPIRED_MARKER) => {
                Err(ApiError::AccessExpired(body.detail))
            }
            _ => Err(ApiError::InvalidCredentials),
        }
    }

    /// Fetch the session record for a bearer token.
    pub async fn whoami(&self, token: &str) -> Result<Session, ApiError> {
        let response = self
            .http
            .get(self.url("/api/v1/auth/me"))
            .bearer_auth(token)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        match response.json::<ErrorBody>().await {
            Ok(body) if body.detail.contains(ACCESS_EXPIRED_MARKER) => {
                Err(ApiError::AccessExpired(body.detail))
            }
            Ok(body) => Err(ApiError::Unauthorized(clean_detail(&body.detail))),
            Err(_) => Err(ApiError::Unauthorized("session rejected".to_string())),
        }
    }

    /// Server-side logout. Callers treat this as best-effort; local token
    /// clearing happens regardless of the result.
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/api/v1/auth/logout"))
            .bearer_auth(token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::Upstream {
                status: response.status().as_u16(),
                message: "logout rejected".to_string(),
            })
        }
    }

    /// Upload a finished take as a single multipart file field.
    ///
    /// The success payload is parsed to validate it and then discarded;
    /// nothing downstream depends on its shape.
    pub async fn upload(&self, token: &str, take: &Take) -> Result<(), ApiError> {
        let part = reqwest::multipart::Part::bytes(take.data.to_vec())
            .file_name(TAKE_FILENAME)
            .mime_str(&take.mime_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/api/v1/videos/upload"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .map(|body| clean_detail(&body.detail))
                .filter(|cleaned| !cleaned.is_empty())
                .unwrap_or_else(|| "Upload failed".to_string());
            tracing::warn!(status, %message, "upload rejected");
            return Err(ApiError::Upstream { status, message });
        }

        let _stored: serde_json::Value = response.json().await?;
        Ok(())
    }
}

#[async_trait]
impl InterviewApi for ApiClient {
    async fn submit_video(&self, token: &str, take: &Take) -> Result<(), UploadFailure> {
        self.upload(token, take).await.map_err(|err| match err {
            ApiError::Upstream { message, .. } => UploadFailure::new(message),
            other => {
                tracing::warn!(%other, "upload did not reach the server");
                UploadFailure::new(GENERIC_UPLOAD_ERROR)
            }
        })
    }

    async fn refresh_session(&self, token: &str) -> Result<Session, UploadFailure> {
        self.whoami(token)
            .await
            .map_err(|err| UploadFailure::new(err.to_string()))
    }

    async fn end_session(&self, token: &str) -> Result<(), UploadFailure> {
        self.logout(token)
            .await
            .map_err(|err| UploadFailure::new(err.to_string()))
    }
}
