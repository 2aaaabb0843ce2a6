/**
 * Session Issuer and Validator
 *
 * Drives an account through its lifecycle:
 *
 * ```text
 * UNREGISTERED --register--> PENDING_VERIFICATION (code sent)
 * PENDING_VERIFICATION --verify(correct code)--> ACTIVE
 * PENDING_VERIFICATION --resend--> PENDING_VERIFICATION (new code, old invalidated)
 * ACTIVE --login--> ACTIVE (session token issued)
 * ACTIVE --request reset--> ACTIVE (reset link emailed)
 * ACTIVE --update password(reset or session token)--> ACTIVE
 * ```
 *
 * Unique constraints are the source of truth for duplicate accounts; the
 * lookups before insert only produce a friendlier error sooner. Email
 * delivery is best effort everywhere: failures are logged as warnings and
 * the flow still succeeds. Login runs one bcrypt comparison whether or not
 * the account exists.
 */

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::backend::auth::otp::{OtpCheck, OtpStore};
use crate::backend::auth::password::{hash_password, verify_password};
use crate::backend::auth::sessions::{AccountPayload, SessionPayload, TokenCodec, TokenError, TokenKind};
use crate::backend::auth::users::{self, User, UserProfile};
use crate::backend::cache::{CacheError, CodeCache};
use crate::backend::db::{Database, StoreContext, StoreError};
use crate::backend::email::{MailError, Mailer, Template, TemplateContext};
use crate::backend::organizations::repository as organizations;
use crate::shared::config::AppConfig;
use crate::shared::strings::normalize_email;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email is already registered")]
    EmailExists,

    #[error("username is already taken")]
    UsernameExists,

    #[error("phone number is already registered")]
    PhoneExists,

    #[error("invalid or expired OTP")]
    InvalidOtp,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is not verified")]
    AccountNotVerified,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    BadRequest(String),

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token issuing failed: {0}")]
    Token(String),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Issue(message) => Self::Token(message),
            _ => Self::InvalidToken,
        }
    }
}

/// Lifetimes and links used by the flows
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub bcrypt_cost: u32,
    pub session_ttl: Duration,
    pub verification_ttl: Duration,
    pub reset_ttl: Duration,
    pub base_url: String,
}

impl AuthSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let minutes = |m: u64| Duration::from_secs(m * 60);
        Self {
            bcrypt_cost: config.auth.bcrypt_cost,
            session_ttl: minutes(config.auth.session_ttl_minutes),
            verification_ttl: minutes(config.auth.verification_ttl_minutes),
            reset_ttl: minutes(config.auth.reset_ttl_minutes),
            base_url: config.server.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub user: UserProfile,
    pub verification_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_in: u64,
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub expires_in: u64,
    pub username: String,
    pub fullname: String,
    pub avatar: Option<String>,
    pub organization: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    otp: OtpStore,
    mailer: Arc<dyn Mailer>,
    tokens: TokenCodec,
    settings: AuthSettings,
    /// Hash checked against when the login identifier matches no account
    decoy_digest: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(
        db: Database,
        cache: Arc<dyn CodeCache>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenCodec,
        config: &AppConfig,
    ) -> Self {
        let otp = OtpStore::new(
            cache,
            config.auth.otp_length,
            Duration::from_secs(config.auth.otp_ttl_minutes * 60),
        );
        Self {
            db,
            otp,
            mailer,
            tokens,
            settings: AuthSettings::from_config(config),
            decoy_digest: Arc::new(OnceCell::new()),
        }
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Hash off the async executor; bcrypt is deliberately slow.
    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let cost = self.settings.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    async fn verify(&self, password: &str, digest: &str) -> Result<bool, AuthError> {
        let password = password.to_string();
        let digest = digest.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &digest))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    /// A digest of a random password at the configured cost, hashed once.
    async fn decoy_digest(&self) -> Result<&str, AuthError> {
        let digest = self
            .decoy_digest
            .get_or_try_init(|| async { self.hash(&uuid::Uuid::new_v4().to_string()).await })
            .await?;
        Ok(digest.as_str())
    }

    /// Create an unverified account and send its first code.
    pub async fn register(&self, input: RegisterInput) -> Result<Registration, AuthError> {
        let email = normalize_email(&input.email);
        let username = input.username.trim().to_string();
        let phone = input.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        tracing::info!("Registration request for username: {}, email: {}", username, email);

        if users::find_by_email(&self.db, &email).await?.is_some() {
            return Err(AuthError::EmailExists);
        }
        if users::find_by_username(&self.db, &username).await?.is_some() {
            return Err(AuthError::UsernameExists);
        }
        if let Some(phone) = &phone {
            if users::find_by_phone(&self.db, phone).await?.is_some() {
                return Err(AuthError::PhoneExists);
            }
        }

        let password_hash = self.hash(&input.password).await?;
        let user = User::new(username, input.fullname.trim().to_string(), email, phone, password_hash);

        let mut tx = self.db.begin().await?;
        users::insert_user(&self.db, &mut tx, &user)
            .await
            .map_err(map_unique_violation)?;
        tx.commit().await.context("commit registration")?;

        let code = self.otp.issue(&user.email).await?;
        self.send_best_effort(
            Template::Otp,
            &user,
            TemplateContext::new(&user.username)
                .with("code", &code)
                .with("expiry_minutes", self.otp.ttl().as_secs() / 60),
        )
        .await;

        let verification_token = self.verification_token(&user)?;
        tracing::info!("User registered, pending verification: {}", user.id);
        Ok(Registration {
            user: user.into(),
            verification_token,
        })
    }

    /// Check the pending code and activate the account.
    pub async fn verify_otp(&self, token: &str, code: &str) -> Result<UserProfile, AuthError> {
        let (_, account): (_, AccountPayload) = self.tokens.parse(token, TokenKind::Verification)?;
        let user = users::find_by_id(&self.db, &account.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        match self.otp.redeem(&user.email, code).await? {
            OtpCheck::Valid => {}
            OtpCheck::Rejected => {
                tracing::warn!("Rejected OTP for user {}", user.id);
                return Err(AuthError::InvalidOtp);
            }
        }

        users::mark_verified(&self.db, &user.id).await?;

        self.send_best_effort(Template::Welcome, &user, TemplateContext::new(&user.username))
            .await;

        let user = users::find_by_id(&self.db, &user.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        tracing::info!("User verified: {}", user.id);
        Ok(user.into())
    }

    /// Issue a fresh code for an unverified account identified by exactly one
    /// of `email` or a verification token. Returns a new verification token.
    pub async fn resend_otp(
        &self,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<String, AuthError> {
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        let token = token.map(str::trim).filter(|t| !t.is_empty());

        let user = match (email, token) {
            (Some(email), None) => users::find_by_email(&self.db, &normalize_email(email)).await?,
            (None, Some(token)) => {
                let (_, account): (_, AccountPayload) =
                    self.tokens.parse(token, TokenKind::Verification)?;
                users::find_by_id(&self.db, &account.user_id).await?
            }
            _ => {
                return Err(AuthError::BadRequest(
                    "provide exactly one of email or verification token".to_string(),
                ))
            }
        };

        let user = match user {
            Some(user) if !user.is_verified() => user,
            _ => {
                return Err(AuthError::BadRequest(
                    "no pending verification for this account".to_string(),
                ))
            }
        };

        let code = self.otp.issue(&user.email).await?;
        let context = TemplateContext::new(&user.username)
            .with("code", &code)
            .with("expiry_minutes", self.otp.ttl().as_secs() / 60);
        self.send_best_effort(Template::Otp, &user, context).await;

        tracing::info!("OTP resent for user {}", user.id);
        self.verification_token(&user)
    }

    /// Email or phone plus password. Unknown account and wrong password give
    /// the same error.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginResult, AuthError> {
        let identifier = identifier.trim();
        let user = if identifier.contains('@') {
            users::find_by_email(&self.db, &normalize_email(identifier)).await?
        } else {
            users::find_by_phone(&self.db, identifier).await?
        };

        let user = match user {
            Some(user) => user,
            None => {
                let decoy = self.decoy_digest().await?;
                self.verify(password, decoy).await?;
                tracing::warn!("Login attempt for unknown account");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.verify(password, &user.password_hash).await? {
            tracing::warn!("Login attempt with wrong password for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_verified() {
            return Err(AuthError::AccountNotVerified);
        }
        if !user.is_active() {
            return Err(AuthError::AccountDisabled);
        }

        let session = self.issue_session(&user).await?;
        tracing::info!("User logged in: {}", user.id);
        Ok(LoginResult {
            token: session.token,
            expires_in: session.expires_in,
            username: user.username,
            fullname: user.fullname,
            avatar: user.avatar,
            organization: session.organization,
        })
    }

    /// Sign a session token carrying the user's current active membership.
    pub async fn issue_session(&self, user: &User) -> Result<SessionToken, AuthError> {
        let membership = organizations::active_membership(&self.db, &user.id).await?;
        let payload = SessionPayload {
            user_id: user.id.clone(),
            organization_id: membership.as_ref().map(|m| m.organization_id.clone()),
            role: membership.as_ref().map(|m| m.role),
            is_admin: membership.as_ref().map_or(false, |m| m.is_owner),
        };
        let organization = membership.map(|m| m.organization_name);
        let token = self.tokens.issue(
            TokenKind::Session,
            &user.username,
            organization.clone(),
            &payload,
            self.settings.session_ttl,
        )?;
        Ok(SessionToken {
            token,
            expires_in: self.settings.session_ttl.as_secs(),
            organization,
        })
    }

    fn verification_token(&self, user: &User) -> Result<String, AuthError> {
        let account = AccountPayload {
            email: user.email.clone(),
            user_id: user.id.clone(),
        };
        Ok(self.tokens.issue(
            TokenKind::Verification,
            &user.username,
            None,
            &account,
            self.settings.verification_ttl,
        )?)
    }

    /// Email a reset link when the account exists. Succeeds either way.
    pub async fn request_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let Some(user) = users::find_by_email(&self.db, &email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = self
            .tokens
            .issue_reset(&user.email, &user.id, self.settings.reset_ttl)?;
        let link = format!("{}/reset-password?token={}", self.settings.base_url, token);
        self.send_best_effort(
            Template::ResetPassword,
            &user,
            TemplateContext::new(&user.username)
                .with("link", link)
                .with("expiry_minutes", self.settings.reset_ttl.as_secs() / 60),
        )
        .await;
        tracing::info!("Password reset link issued for user {}", user.id);
        Ok(())
    }

    /// Rotate the password using a reset token or a session token.
    pub async fn update_password(
        &self,
        token: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        if password != confirm {
            return Err(AuthError::BadRequest("passwords do not match".to_string()));
        }

        let user_id = match self.tokens.parse_reset(token) {
            Ok(claims) => claims.user_id,
            Err(_) => {
                let (_, session): (_, SessionPayload) =
                    self.tokens.parse(token, TokenKind::Session)?;
                session.user_id
            }
        };

        let user = users::find_by_id(&self.db, &user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        let password_hash = self.hash(password).await?;
        users::update_password(&self.db, &user.id, &password_hash).await?;
        tracing::info!("Password updated for user {}", user.id);
        Ok(())
    }

    pub async fn me(&self, user_id: &str) -> Result<UserProfile, AuthError> {
        users::find_by_id(&self.db, user_id)
            .await?
            .map(UserProfile::from)
            .ok_or(AuthError::UserNotFound)
    }

    async fn send_best_effort(&self, template: Template, user: &User, context: TemplateContext) {
        let email = template.render(&user.email, &context);
        if let Err(e) = self.mailer.send(email).await {
            tracing::warn!(
                "Failed to send '{}' email to user {}: {}",
                template.name(),
                user.id,
                e
            );
        }
    }
}

fn map_unique_violation(err: StoreError) -> AuthError {
    if err.is_unique_violation() {
        if err.violates("email") {
            return AuthError::EmailExists;
        }
        if err.violates("username") {
            return AuthError::UsernameExists;
        }
        if err.violates("phone") {
            return AuthError::PhoneExists;
        }
    }
    AuthError::Store(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_mapping() {
        let err = StoreError::UniqueViolation {
            context: "insert user",
            detail: "users_phone_unique".to_string(),
        };
        assert!(matches!(map_unique_violation(err), AuthError::PhoneExists));

        let err = StoreError::UniqueViolation {
            context: "insert user",
            detail: "UNIQUE constraint failed: users.username".to_string(),
        };
        assert!(matches!(map_unique_violation(err), AuthError::UsernameExists));
    }

    #[test]
    fn test_token_errors_collapse() {
        assert!(matches!(AuthError::from(TokenError::Expired), AuthError::InvalidToken));
        assert!(matches!(AuthError::from(TokenError::WrongKind), AuthError::InvalidToken));
        assert!(matches!(
            AuthError::from(TokenError::Issue("boom".to_string())),
            AuthError::Token(_)
        ));
    }
}
