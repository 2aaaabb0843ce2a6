//! Shared harness for the API integration tests
//!
//! Builds the full router over an in-memory SQLite database, the in-memory
//! code cache and a mailer that records every message, so flows that depend
//! on emailed codes and links can be driven end to end.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use tourfleet::backend::cache::{CodeCache, MemoryCodeCache};
use tourfleet::backend::db::Database;
use tourfleet::backend::email::{MailError, Mailer, OutgoingEmail};
use tourfleet::backend::routes::create_router;
use tourfleet::backend::server::AppState;
use tourfleet::shared::config::AppConfig;

pub const SECRET: &str = "integration-secret-0123456789abcdef";
pub const PASSWORD: &str = "correct-horse-42";
pub const OTP_LENGTH: usize = 8;
pub const TAX_PERCENT: u32 = 11;

/// Keeps every message instead of delivering it. While `failing` is set each
/// message is still recorded but reported as undelivered.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent_to(&self, to: &str) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|email| email.to == to)
            .cloned()
            .collect()
    }

    /// Most recent verification code sent to `to`
    pub fn last_code(&self, to: &str) -> String {
        let email = self
            .sent_to(to)
            .into_iter()
            .rev()
            .find(|email| email.subject == "Your verification code")
            .expect("no verification email");
        email
            .html
            .split(|c: char| !c.is_ascii_digit())
            .find(|run| run.len() == OTP_LENGTH)
            .expect("no code in email")
            .to_string()
    }

    /// Token from the most recent reset link sent to `to`
    pub fn last_reset_token(&self, to: &str) -> String {
        let email = self
            .sent_to(to)
            .into_iter()
            .rev()
            .find(|email| email.subject == "Reset your password")
            .expect("no reset email");
        let start = email.html.find("token=").expect("no reset link") + "token=".len();
        email.html[start..]
            .split('"')
            .next()
            .expect("unterminated link")
            .to_string()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email);
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<RecordingMailer>,
    pub db: Database,
    pub audit_dir: TempDir,
    pub upload_dir: TempDir,
}

/// Decoded response: status, transaction header and envelope
pub struct TestResponse {
    pub status: StatusCode,
    pub transaction_id: Option<String>,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_env(&[]).await
    }

    pub async fn with_env(extra: &[(&str, &str)]) -> Self {
        Self::build(extra, Arc::new(MemoryCodeCache::new())).await
    }

    pub async fn with_cache(cache: Arc<dyn CodeCache>) -> Self {
        Self::build(&[], cache).await
    }

    async fn build(extra: &[(&str, &str)], cache: Arc<dyn CodeCache>) -> Self {
        let audit_dir = TempDir::new().unwrap();
        let upload_dir = TempDir::new().unwrap();

        let mut env: HashMap<String, String> = [
            ("APP_SECRET", SECRET.to_string()),
            ("DB_DRIVER", "sqlite".to_string()),
            ("CACHE_DRIVER", "memory".to_string()),
            ("MAIL_DRIVER", "log".to_string()),
            ("BCRYPT_COST", "4".to_string()),
            ("OTP_LENGTH", OTP_LENGTH.to_string()),
            ("TAX_PERCENT", TAX_PERCENT.to_string()),
            ("APP_BASE_URL", "http://files.test".to_string()),
            ("AUDIT_LOG_DIR", audit_dir.path().display().to_string()),
            ("UPLOAD_DIR", upload_dir.path().display().to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        for (k, v) in extra {
            env.insert(k.to_string(), v.to_string());
        }
        let config = AppConfig::from_sources(None, |key| env.get(key).cloned()).unwrap();

        let db = Database::connect_url("sqlite::memory:", 1, 5).await.unwrap();
        db.migrate().await.unwrap();

        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(
            config,
            db.clone(),
            cache,
            mailer.clone(),
        );

        Self {
            router: create_router(state),
            mailer,
            db,
            audit_dir,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response: Response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let transaction_id = response
            .headers()
            .get("x-transaction-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            transaction_id,
            body,
        }
    }

    /// JSON request with an optional bearer token
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn with_api_key(&self, method: Method, uri: &str, key: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-api-key", key);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Register and verify an account; returns its user id.
    pub async fn register_verified(&self, username: &str, email: &str, phone: &str) -> String {
        let registered = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "fullname": format!("{} Tester", username),
                    "email": email,
                    "password": PASSWORD,
                    "phone": phone,
                })),
            )
            .await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

        let token = registered.data()["verification_token"].as_str().unwrap().to_string();
        let code = self.mailer.last_code(email);
        let verified = self
            .call(
                Method::POST,
                "/api/auth/verify-otp",
                None,
                Some(json!({ "token": token, "otp": code })),
            )
            .await;
        assert_eq!(verified.status, StatusCode::OK, "{}", verified.body);
        registered.data()["user"]["id"].as_str().unwrap().to_string()
    }

    pub async fn login(&self, email: &str) -> String {
        let response = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.data()["token"].as_str().unwrap().to_string()
    }

    /// Verified user who founded an organization; returns the owner's
    /// session token (with the membership) and the organization code.
    pub async fn owner(&self, username: &str, email: &str, phone: &str, org: &str) -> (String, String) {
        self.register_verified(username, email, phone).await;
        let token = self.login(email).await;
        let created = self
            .call(
                Method::POST,
                "/api/organization",
                Some(&token),
                Some(json!({
                    "name": org,
                    "company_name": format!("PT {}", org),
                    "address": "Jl. Sunset Road 88",
                    "city": "Denpasar",
                    "province": "Bali",
                    "phone": phone,
                    "email": email,
                })),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
        (
            created.data()["token"].as_str().unwrap().to_string(),
            created.data()["organization"]["code"].as_str().unwrap().to_string(),
        )
    }

    pub async fn create_fleet(&self, token: &str, name: &str, price_per_day: i64) -> String {
        let response = self
            .call(
                Method::POST,
                "/api/fleets",
                Some(token),
                Some(json!({
                    "name": name,
                    "fleet_type": "minibus",
                    "plate_number": "DK 1234 AB",
                    "capacity": 12,
                    "price_per_day": price_per_day,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.data()["id"].as_str().unwrap().to_string()
    }
}
