//! Client behavior against a mocked upstream.

use bytes::Bytes;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booth::{InterviewApi, Take};
use stagedoor::{ApiClient, ApiError};

fn small_take() -> Take {
    Take::assemble(vec![Bytes::from_static(b"footage")], "video/mp4")
}

#[tokio::test]
async fn login_returns_token_and_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(query_param("email", "a@b.example"))
        .and(query_param("password", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "token_type": "bearer",
            "user": {
                "user_data": {"id": "u-1", "email": "a@b.example"},
                "access_expiry": "2026-03-01T12:00:00Z"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let auth = client.login("a@b.example", "s3cret").await.unwrap();
    assert_eq!(auth.access_token, "tok-1");
    assert_eq!(
        auth.user.access_expiry.as_deref(),
        Some("2026-03-01T12:00:00Z")
    );
}

#[tokio::test]
async fn login_distinguishes_expired_access() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "detail": "Access expired for this candidate"
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = client.login("a@b.example", "s3cret").await.unwrap_err();
    assert!(err.is_access_expired());
    assert!(err.to_string().contains("Access expired"));
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = client.login("a@b.example", "wrong").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidCredentials));
}

#[tokio::test]
async fn whoami_parses_the_session_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_data": {"id": "u-1", "email": "a@b.example"},
            "video_upload": {"upload_status": "completed", "file_size": 9000}
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let session = client.whoami("tok-1").await.unwrap();
    assert!(session.upload_completed());
}

#[tokio::test]
async fn whoami_classifies_expired_access() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "Access expired"})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = client.whoami("tok-1").await.unwrap_err();
    assert!(err.is_access_expired());
}

#[tokio::test]
async fn whoami_rejection_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "401: bad token"})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = client.whoami("tok-1").await.unwrap_err();
    match err {
        ApiError::Unauthorized(message) => assert_eq!(message, "bad token"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn upload_sends_bearer_and_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/videos/upload"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "v-1",
            "upload_status": "completed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    client.upload("tok-1", &small_take()).await.unwrap();
}

#[tokio::test]
async fn upload_strips_the_numeric_detail_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/videos/upload"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"detail": "422: Bad file"})),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());

    let err = client.upload("tok-1", &small_take()).await.unwrap_err();
    match err {
        ApiError::Upstream { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Bad file");
        }
        other => panic!("unexpected {other:?}"),
    }

    // The booth-facing seam surfaces the same cleaned text.
    let failure = client
        .submit_video("tok-1", &small_take())
        .await
        .unwrap_err();
    assert_eq!(failure.message, "Bad file");
}

#[tokio::test]
async fn upload_without_detail_uses_a_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/videos/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = client.upload("tok-1", &small_take()).await.unwrap_err();
    match err {
        ApiError::Upstream { message, .. } => assert_eq!(message, "Upload failed"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_maps_to_the_generic_upload_message() {
    let client = ApiClient::new("http://127.0.0.1:1");
    let failure = client
        .submit_video("tok-1", &small_take())
        .await
        .unwrap_err();
    assert_eq!(
        failure.message,
        "There was an error uploading your video. Please try again."
    );
}

#[tokio::test]
async fn logout_succeeds_against_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    client.logout("tok-1").await.unwrap();
}
