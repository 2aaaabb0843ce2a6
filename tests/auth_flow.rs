//! Registration, verification, login and password reset over HTTP

#![cfg(feature = "ssr")]

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{TestApp, OTP_LENGTH, PASSWORD};
use tourfleet::backend::cache::{CacheError, CodeCache, MemoryCodeCache};

/// Holds codes but every removal fails
struct UndeletableCache(MemoryCodeCache);

#[async_trait]
impl CodeCache for UndeletableCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.0.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<String, CacheError> {
        self.0.get(key).await
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Backend("READONLY replica".to_string()))
    }

    async fn take_matching(&self, _key: &str, _expected: &str) -> Result<bool, CacheError> {
        Err(CacheError::Backend("READONLY replica".to_string()))
    }
}

fn registration(username: &str, email: &str, phone: &str) -> serde_json::Value {
    json!({
        "username": username,
        "fullname": "Made Wirawan",
        "email": email,
        "password": PASSWORD,
        "phone": phone,
    })
}

#[tokio::test]
async fn test_register_sends_code_of_configured_length() {
    let app = TestApp::new().await;

    let response = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(registration("made", "made@example.com", "081234567890")),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.data()["user"]["is_verified"], false);
    assert!(response.data()["verification_token"].is_string());
    assert!(response.data()["user"].get("password_hash").is_none());

    let code = app.mailer.last_code("made@example.com");
    assert_eq!(code.len(), OTP_LENGTH);
}

#[tokio::test]
async fn test_verified_code_cannot_be_reused() {
    let app = TestApp::new().await;
    let registered = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(registration("ayu", "ayu@example.com", "081200000001")),
        )
        .await;
    let token = registered.data()["verification_token"].as_str().unwrap().to_string();
    let code = app.mailer.last_code("ayu@example.com");

    let first = app
        .call(
            Method::POST,
            "/api/auth/verify-otp",
            None,
            Some(json!({ "token": token, "otp": code })),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["is_verified"], true);

    let again = app
        .call(
            Method::POST,
            "/api/auth/verify-otp",
            None,
            Some(json!({ "token": token, "otp": code })),
        )
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["success"], false);
    assert_eq!(again.body["message"], "invalid or expired OTP");
}

#[tokio::test]
async fn test_resend_invalidates_previous_code() {
    let app = TestApp::new().await;
    let registered = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(registration("komang", "komang@example.com", "081200000002")),
        )
        .await;
    let token = registered.data()["verification_token"].as_str().unwrap().to_string();
    let old_code = app.mailer.last_code("komang@example.com");

    let resent = app
        .call(
            Method::POST,
            "/api/auth/resend-otp",
            None,
            Some(json!({ "email": "komang@example.com" })),
        )
        .await;
    assert_eq!(resent.status, StatusCode::OK);
    let new_code = app.mailer.last_code("komang@example.com");
    assert_eq!(app.mailer.sent_to("komang@example.com").len(), 2);

    if old_code != new_code {
        let stale = app
            .call(
                Method::POST,
                "/api/auth/verify-otp",
                None,
                Some(json!({ "token": token, "otp": old_code })),
            )
            .await;
        assert_eq!(stale.status, StatusCode::BAD_REQUEST);
    }

    let fresh = app
        .call(
            Method::POST,
            "/api/auth/verify-otp",
            None,
            Some(json!({ "token": token, "otp": new_code })),
        )
        .await;
    assert_eq!(fresh.status, StatusCode::OK);
}

#[tokio::test]
async fn test_code_is_not_accepted_when_cache_cannot_remove_it() {
    let app = TestApp::with_cache(Arc::new(UndeletableCache(MemoryCodeCache::new()))).await;
    let registered = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(registration("wayan", "wayan@example.com", "081200000010")),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    let token = registered.data()["verification_token"].as_str().unwrap().to_string();
    let code = app.mailer.last_code("wayan@example.com");

    for _ in 0..2 {
        let attempt = app
            .call(
                Method::POST,
                "/api/auth/verify-otp",
                None,
                Some(json!({ "token": token, "otp": code })),
            )
            .await;
        assert_eq!(attempt.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    let login = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "wayan@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(login.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_resend_succeeds_when_mail_delivery_fails() {
    let app = TestApp::new().await;
    app.call(
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("kadek", "kadek@example.com", "081200000011")),
    )
    .await;

    app.mailer.fail_deliveries(true);
    let resent = app
        .call(
            Method::POST,
            "/api/auth/resend-otp",
            None,
            Some(json!({ "email": "kadek@example.com" })),
        )
        .await;
    assert_eq!(resent.status, StatusCode::OK, "{}", resent.body);
    let token = resent.data()["verification_token"].as_str().unwrap().to_string();

    let code = app.mailer.last_code("kadek@example.com");
    let verified = app
        .call(
            Method::POST,
            "/api/auth/verify-otp",
            None,
            Some(json!({ "token": token, "otp": code })),
        )
        .await;
    assert_eq!(verified.status, StatusCode::OK);
}

#[tokio::test]
async fn test_resend_requires_exactly_one_identifier() {
    let app = TestApp::new().await;
    let response = app
        .call(Method::POST, "/api/auth/resend-otp", None, Some(json!({})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = TestApp::new().await;
    app.register_verified("wayan", "wayan@example.com", "081200000003").await;

    let response = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(registration("wayan2", "WAYAN@example.com", "081200000004")),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "email is already registered");
}

#[tokio::test]
async fn test_invalid_registration_lists_field_errors() {
    let app = TestApp::new().await;
    let response = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": "1x",
                "fullname": "",
                "email": "not-an-email",
                "password": "short",
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = response.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    for field in ["username", "fullname", "email", "password"] {
        assert!(fields.contains(&field), "missing error for {}", field);
    }
}

#[tokio::test]
async fn test_login_by_phone() {
    let app = TestApp::new().await;
    app.register_verified("putu", "putu@example.com", "081200000005").await;

    let response = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "phone": "081200000005", "password": PASSWORD })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["username"], "putu");
    assert!(response.data()["organization"].is_null());

    let token = response.data()["token"].as_str().unwrap().to_string();
    let me = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.data()["email"], "putu@example.com");

    let forged = app.call(Method::GET, "/api/auth/me", Some("garbage"), None).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_account_look_the_same() {
    let app = TestApp::new().await;
    app.register_verified("nyoman", "nyoman@example.com", "081200000006").await;

    let wrong = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nyoman@example.com", "password": "wrong-password" })),
        )
        .await;
    let unknown = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "wrong-password" })),
        )
        .await;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["message"], unknown.body["message"]);
}

#[tokio::test]
async fn test_unknown_account_login_pays_for_a_hash() {
    let app = TestApp::with_env(&[("BCRYPT_COST", "10")]).await;
    app.register_verified("dewi", "dewi@example.com", "081200000012").await;

    let login = |email: &'static str| {
        let app = &app;
        async move {
            let started = Instant::now();
            let response = app
                .call(
                    Method::POST,
                    "/api/auth/login",
                    None,
                    Some(json!({ "email": email, "password": "wrong-password" })),
                )
                .await;
            assert_eq!(response.status, StatusCode::UNAUTHORIZED);
            started.elapsed()
        }
    };

    // First unknown-account attempt also computes the decoy digest.
    login("ghost@example.com").await;
    let wrong = login("dewi@example.com").await;
    let unknown = login("ghost@example.com").await;
    assert!(
        unknown * 4 >= wrong,
        "unknown account answered in {:?}, wrong password in {:?}",
        unknown,
        wrong
    );
}

#[tokio::test]
async fn test_unverified_login_is_forbidden() {
    let app = TestApp::new().await;
    app.call(
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration("gede", "gede@example.com", "081200000007")),
    )
    .await;

    let response = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "gede@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "account is not verified");
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new().await;
    let response = app.call(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);

    app.register_verified("ketut", "ketut@example.com", "081200000008").await;
    let token = app.login("ketut@example.com").await;
    let me = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.data()["email"], "ketut@example.com");
}

#[tokio::test]
async fn test_password_reset_round_trip() {
    let app = TestApp::new().await;
    app.register_verified("sari", "sari@example.com", "081200000009").await;

    let unknown = app
        .call(
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "email": "nobody@example.com" })),
        )
        .await;
    let known = app
        .call(
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "email": "sari@example.com" })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(unknown.body["message"], known.body["message"]);

    let token = app.mailer.last_reset_token("sari@example.com");
    let mismatch = app
        .call(
            Method::POST,
            "/api/auth/update-password",
            None,
            Some(json!({
                "token": token,
                "password": "brand-new-pass-1",
                "confirm_password": "brand-new-pass-2",
            })),
        )
        .await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);

    let updated = app
        .call(
            Method::POST,
            "/api/auth/update-password",
            None,
            Some(json!({
                "token": token,
                "password": "brand-new-pass-1",
                "confirm_password": "brand-new-pass-1",
            })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);

    let login = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "sari@example.com", "password": "brand-new-pass-1" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_verification_token_is_not_a_bearer_credential() {
    let app = TestApp::new().await;
    let registered = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(registration("dodi", "dodi@example.com", "081200000010")),
        )
        .await;
    let token = registered.data()["verification_token"].as_str().unwrap().to_string();

    let response = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
