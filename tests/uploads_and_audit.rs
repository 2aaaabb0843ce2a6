//! Multipart uploads, static file serving, transaction ids and the audit trail

#![cfg(feature = "ssr")]

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

use common::TestApp;

const BOUNDARY: &str = "tourfleet-boundary";

fn multipart_request(token: &str, field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn user_token(app: &TestApp) -> String {
    app.register_verified("uploader", "uploader@example.com", "081500000001").await;
    app.login("uploader@example.com").await
}

#[tokio::test]
async fn test_upload_is_stored_and_served() {
    let app = TestApp::new().await;
    let token = user_token(&app).await;

    let response = app
        .send(multipart_request(&token, "file", "../../ktp scan.PNG", b"\x89PNG fake image"))
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

    let data = response.data();
    assert_eq!(data["original_name"], "ktp scan.PNG");
    assert_eq!(data["size"], 15);
    let file_name = data["file_name"].as_str().unwrap();
    assert!(file_name.ends_with(".png"));

    let url = data["url"].as_str().unwrap();
    assert!(url.starts_with("http://files.test/uploads/"));
    let path = url.trim_start_matches("http://files.test");

    let served = app
        .router
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(served.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"\x89PNG fake image");
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension() {
    let app = TestApp::new().await;
    let token = user_token(&app).await;

    let response = app
        .send(multipart_request(&token, "file", "payload.exe", b"MZ"))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_requires_file_field() {
    let app = TestApp::new().await;
    let token = user_token(&app).await;

    let response = app
        .send(multipart_request(&token, "attachment", "photo.jpg", b"jpeg"))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected_and_removed() {
    let app = TestApp::with_env(&[("UPLOAD_MAX_BYTES", "1024")]).await;
    let token = user_token(&app).await;

    let response = app
        .send(multipart_request(&token, "file", "big.pdf", &[b'x'; 4096]))
        .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);

    let leftovers: Vec<_> = walk(app.upload_dir.path());
    assert!(leftovers.is_empty(), "partial files left: {:?}", leftovers);
}

fn walk(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            files.extend(walk(&path));
        } else {
            files.push(path);
        }
    }
    files
}

#[tokio::test]
async fn test_every_response_carries_transaction_id() {
    let app = TestApp::new().await;

    let health = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    let header_id = health.transaction_id.clone().expect("missing header");
    assert_eq!(health.body["transactionid"], header_id.as_str());

    let missing = app.call(Method::GET, "/api/nope", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["success"], false);
    assert!(missing.transaction_id.is_some());
    assert_ne!(missing.transaction_id, health.transaction_id);
}

#[tokio::test]
async fn test_failed_request_is_audited_without_secrets() {
    let app = TestApp::new().await;

    let response = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "hunter2-secret" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let transaction_id = response.transaction_id.unwrap();

    let logs: Vec<_> = walk(app.audit_dir.path());
    assert_eq!(logs.len(), 1);
    let contents = std::fs::read_to_string(&logs[0]).unwrap();
    let entry: serde_json::Value = serde_json::from_str(contents.lines().last().unwrap()).unwrap();

    assert_eq!(entry["transactionid"], transaction_id.as_str());
    assert_eq!(entry["status"], 401);
    assert_eq!(entry["path"], "/api/auth/login");
    assert_eq!(entry["request"]["email"], "nobody@example.com");
    assert_ne!(entry["request"]["password"], "hunter2-secret");
    assert!(!contents.contains("hunter2-secret"));
}
