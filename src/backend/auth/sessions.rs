/**
 * Session Tokens
 *
 * Signed HS256 tokens carrying only display claims in the clear. Identifiers
 * travel in `data`, a payload sealed with [`PayloadCipher`], so a decoded
 * token never exposes a user or organization id.
 *
 * # Token Kinds
 *
 * - `session` - bearer credential issued at login
 * - `verification` - correlates OTP calls after registration
 *
 * A token of one kind is rejected where the other is expected.
 *
 * Password reset tokens and organization API keys are not JWTs: they are
 * sealed directly with the same cipher.
 */

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::backend::auth::cipher::PayloadCipher;
use crate::backend::auth::roles::Role;
use crate::shared::time;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token is not valid for this operation")]
    WrongKind,

    #[error("failed to issue token: {0}")]
    Issue(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Session,
    Verification,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Organization display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub typ: TokenKind,
    /// Sealed payload
    pub data: String,
    pub iat: u64,
    pub nbf: u64,
    pub exp: u64,
}

/// Sealed inside every session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub user_id: String,
    pub organization_id: Option<String>,
    pub role: Option<Role>,
    /// Organization owner
    pub is_admin: bool,
}

/// Sealed inside every verification token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPayload {
    pub email: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetClaims {
    pub email: String,
    pub user_id: String,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiKeyPayload {
    organization_id: String,
}

/// Issues and parses every token the service hands out
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    cipher: PayloadCipher,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            cipher: PayloadCipher::new(secret),
        }
    }

    pub fn cipher(&self) -> &PayloadCipher {
        &self.cipher
    }

    /// Sign a token of `kind` whose sealed payload is `payload`.
    pub fn issue<P: Serialize>(
        &self,
        kind: TokenKind,
        username: &str,
        organization: Option<String>,
        payload: &P,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let data = self
            .cipher
            .encrypt(payload)
            .map_err(|e| TokenError::Issue(e.to_string()))?;
        let now = unix_now();
        let claims = Claims {
            username: username.to_string(),
            organization,
            typ: kind,
            data,
            iat: now,
            nbf: now,
            exp: now + ttl.as_secs(),
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Issue(e.to_string()))
    }

    /// Verify signature, `exp` and `nbf` (no leeway), check the kind and
    /// open the payload.
    pub fn parse<P: DeserializeOwned>(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<(Claims, P), TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        let data = decode::<Claims>(token.trim(), &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ImmatureSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = data.claims;
        if claims.typ != kind {
            return Err(TokenError::WrongKind);
        }
        let payload = self
            .cipher
            .decrypt(&claims.data)
            .map_err(|_| TokenError::Malformed)?;
        Ok((claims, payload))
    }

    pub fn issue_reset(&self, email: &str, user_id: &str, ttl: Duration) -> Result<String, TokenError> {
        let claims = ResetClaims {
            email: email.to_string(),
            user_id: user_id.to_string(),
            exp: time::now() + ttl.as_secs() as i64,
        };
        self.cipher
            .encrypt(&claims)
            .map_err(|e| TokenError::Issue(e.to_string()))
    }

    pub fn parse_reset(&self, token: &str) -> Result<ResetClaims, TokenError> {
        let claims: ResetClaims = self.cipher.decrypt(token).map_err(|_| TokenError::Malformed)?;
        if claims.exp <= time::now() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    pub fn issue_api_key(&self, organization_id: &str) -> Result<String, TokenError> {
        let payload = ApiKeyPayload {
            organization_id: organization_id.to_string(),
        };
        self.cipher
            .encrypt(&payload)
            .map_err(|e| TokenError::Issue(e.to_string()))
    }

    /// Organization id bound to an API key
    pub fn parse_api_key(&self, key: &str) -> Result<String, TokenError> {
        let payload: ApiKeyPayload = self.cipher.decrypt(key).map_err(|_| TokenError::Malformed)?;
        Ok(payload.organization_id)
    }
}

fn unix_now() -> u64 {
    time::now().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn session() -> SessionPayload {
        SessionPayload {
            user_id: "user-1".to_string(),
            organization_id: Some("org-1".to_string()),
            role: Some(Role::Admin),
            is_admin: true,
        }
    }

    #[test]
    fn test_issue_and_parse_session() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .issue(TokenKind::Session, "alice", Some("Bali Trans".to_string()), &session(), Duration::from_secs(60))
            .unwrap();
        let (claims, payload): (Claims, SessionPayload) = codec.parse(&token, TokenKind::Session).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.organization.as_deref(), Some("Bali Trans"));
        assert_eq!(payload, session());
    }

    #[test]
    fn test_clear_claims_hide_identifiers() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .issue(TokenKind::Session, "alice", None, &session(), Duration::from_secs(60))
            .unwrap();
        let body = token.split('.').nth(1).unwrap();
        let decoded = base64::Engine::decode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, body).unwrap();
        let text = String::from_utf8(decoded).unwrap();
        assert!(!text.contains("user-1"));
        assert!(!text.contains("org-1"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = TokenCodec::new(SECRET);
        let now = unix_now();
        let claims = Claims {
            username: "alice".to_string(),
            organization: None,
            typ: TokenKind::Session,
            data: codec.cipher().encrypt(&session()).unwrap(),
            iat: now - 120,
            nbf: now - 120,
            exp: now - 60,
        };
        let token = codec.sign(&claims).unwrap();
        let err = codec.parse::<SessionPayload>(&token, TokenKind::Session).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn test_not_yet_valid_token_rejected() {
        let codec = TokenCodec::new(SECRET);
        let now = unix_now();
        let claims = Claims {
            username: "alice".to_string(),
            organization: None,
            typ: TokenKind::Session,
            data: codec.cipher().encrypt(&session()).unwrap(),
            iat: now,
            nbf: now + 600,
            exp: now + 1200,
        };
        let token = codec.sign(&claims).unwrap();
        assert!(codec.parse::<SessionPayload>(&token, TokenKind::Session).is_err());
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let token = TokenCodec::new("ffffffffffffffffffffffffffffffff")
            .issue(TokenKind::Session, "alice", None, &session(), Duration::from_secs(60))
            .unwrap();
        let err = TokenCodec::new(SECRET)
            .parse::<SessionPayload>(&token, TokenKind::Session)
            .unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let codec = TokenCodec::new(SECRET);
        let account = AccountPayload {
            email: "a@x.com".to_string(),
            user_id: "user-1".to_string(),
        };
        let token = codec
            .issue(TokenKind::Verification, "alice", None, &account, Duration::from_secs(60))
            .unwrap();
        let err = codec.parse::<SessionPayload>(&token, TokenKind::Session).unwrap_err();
        assert_eq!(err, TokenError::WrongKind);
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let codec = TokenCodec::new(SECRET);
        let err = codec.parse::<SessionPayload>("a.b.c", TokenKind::Session).unwrap_err();
        assert_eq!(err, TokenError::Malformed);
    }

    #[test]
    fn test_reset_token() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue_reset("a@x.com", "user-1", Duration::from_secs(60)).unwrap();
        let claims = codec.parse_reset(&token).unwrap();
        assert_eq!(claims.email, "a@x.com");

        let expired = codec.issue_reset("a@x.com", "user-1", Duration::from_secs(0)).unwrap();
        assert_eq!(codec.parse_reset(&expired), Err(TokenError::Expired));
        assert_eq!(codec.parse_reset("bogus"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_api_key_binds_organization() {
        let codec = TokenCodec::new(SECRET);
        let key = codec.issue_api_key("org-9").unwrap();
        assert_eq!(codec.parse_api_key(&key).unwrap(), "org-9");
        assert!(codec.parse_api_key("not-a-key").is_err());
    }
}
