//! Application configuration module
//!
//! Configuration is read from an optional JSON file (path in `CONFIG_FILE`,
//! default `config.json`), then every recognised environment variable is
//! applied on top of it. Environment always wins. The merged result is
//! validated once; any failure is fatal at startup.
//!
//! ```rust
//! use tourfleet::shared::config::AppConfig;
//!
//! let env = |key: &str| match key {
//!     "APP_SECRET" => Some("0123456789abcdef0123456789abcdef".to_string()),
//!     "MAIL_DRIVER" => Some("log".to_string()),
//!     "OTP_LENGTH" => Some("6".to_string()),
//!     _ => None,
//! };
//! let config = AppConfig::from_sources(Some(r#"{"auth":{"otp_length":10}}"#), env).unwrap();
//! assert_eq!(config.auth.otp_length, 6);
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("{key}: {reason}")]
    Rejected { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbDriver {
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheDriver {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailDriver {
    Smtp,
    /// Logs messages instead of delivering them (local development only)
    Log,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL used to build links in emails and upload URLs
    pub base_url: String,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub driver: DbDriver,
    /// Full connection URL; takes precedence over the individual fields
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DbDriver::Postgres,
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "tourfleet".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        match self.driver {
            DbDriver::Postgres => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
            DbDriver::Sqlite => format!("sqlite://{}?mode=rwc", self.name),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub driver: CacheDriver,
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: CacheDriver::Redis,
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
        }
    }
}

impl CacheConfig {
    pub fn redis_url(&self) -> String {
        match &self.password {
            Some(password) if !password.is_empty() => {
                format!("redis://:{}@{}:{}/{}", password, self.host, self.port, self.db)
            }
            _ => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret for token signing and payload encryption
    pub secret: Option<String>,
    pub otp_length: usize,
    pub otp_ttl_minutes: u64,
    pub session_ttl_minutes: u64,
    pub verification_ttl_minutes: u64,
    pub reset_ttl_minutes: u64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            otp_length: 8,
            otp_ttl_minutes: 5,
            session_ttl_minutes: 90,
            verification_ttl_minutes: 60,
            reset_ttl_minutes: 60,
            bcrypt_cost: 12,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub driver: MailDriver,
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            driver: MailDriver::Smtp,
            host: None,
            port: 587,
            username: None,
            password: None,
            from: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub dir: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Tax added on top of every order subtotal, in whole percent
    pub tax_percent: u32,
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub smtp: SmtpConfig,
    pub audit: AuditConfig,
    pub upload: UploadConfig,
    pub checkout: CheckoutConfig,
}

impl AppConfig {
    /// Load from `CONFIG_FILE` (or `config.json`) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.json".to_string());
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Config file {} not found, using defaults and environment", path);
                None
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Merge a JSON document with an environment lookup and validate.
    pub fn from_sources<F>(json: Option<&str>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: AppConfig = match json {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)?,
            _ => AppConfig::default(),
        };
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = lookup("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("SERVER_PORT") {
            self.server.port = parse("SERVER_PORT", &v)?;
        }
        if let Some(v) = lookup("APP_BASE_URL") {
            self.server.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = v
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(v) = lookup("DB_DRIVER") {
            self.database.driver = match v.to_lowercase().as_str() {
                "postgres" | "postgresql" => DbDriver::Postgres,
                "sqlite" => DbDriver::Sqlite,
                _ => return Err(ConfigError::InvalidValue { key: "DB_DRIVER", value: v }),
            };
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = parse("DB_PORT", &v)?;
        }
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse("DB_MAX_CONNECTIONS", &v)?;
        }

        if let Some(v) = lookup("CACHE_DRIVER") {
            self.cache.driver = match v.to_lowercase().as_str() {
                "redis" => CacheDriver::Redis,
                "memory" => CacheDriver::Memory,
                _ => return Err(ConfigError::InvalidValue { key: "CACHE_DRIVER", value: v }),
            };
        }
        if let Some(v) = lookup("REDIS_HOST") {
            self.cache.host = v;
        }
        if let Some(v) = lookup("REDIS_PORT") {
            self.cache.port = parse("REDIS_PORT", &v)?;
        }
        if let Some(v) = lookup("REDIS_PASSWORD") {
            self.cache.password = Some(v);
        }
        if let Some(v) = lookup("REDIS_DB") {
            self.cache.db = parse("REDIS_DB", &v)?;
        }

        if let Some(v) = lookup("APP_SECRET") {
            self.auth.secret = Some(v);
        }
        if let Some(v) = lookup("OTP_LENGTH") {
            self.auth.otp_length = parse("OTP_LENGTH", &v)?;
        }
        if let Some(v) = lookup("OTP_TTL_MINUTES") {
            self.auth.otp_ttl_minutes = parse("OTP_TTL_MINUTES", &v)?;
        }
        if let Some(v) = lookup("SESSION_TTL_MINUTES") {
            self.auth.session_ttl_minutes = parse("SESSION_TTL_MINUTES", &v)?;
        }
        if let Some(v) = lookup("VERIFICATION_TTL_MINUTES") {
            self.auth.verification_ttl_minutes = parse("VERIFICATION_TTL_MINUTES", &v)?;
        }
        if let Some(v) = lookup("RESET_TTL_MINUTES") {
            self.auth.reset_ttl_minutes = parse("RESET_TTL_MINUTES", &v)?;
        }
        if let Some(v) = lookup("BCRYPT_COST") {
            self.auth.bcrypt_cost = parse("BCRYPT_COST", &v)?;
        }

        if let Some(v) = lookup("MAIL_DRIVER") {
            self.smtp.driver = match v.to_lowercase().as_str() {
                "smtp" => MailDriver::Smtp,
                "log" => MailDriver::Log,
                _ => return Err(ConfigError::InvalidValue { key: "MAIL_DRIVER", value: v }),
            };
        }
        if let Some(v) = lookup("SMTP_HOST") {
            self.smtp.host = Some(v);
        }
        if let Some(v) = lookup("SMTP_PORT") {
            self.smtp.port = parse("SMTP_PORT", &v)?;
        }
        if let Some(v) = lookup("SMTP_USERNAME") {
            self.smtp.username = Some(v);
        }
        if let Some(v) = lookup("SMTP_PASSWORD") {
            self.smtp.password = Some(v);
        }
        if let Some(v) = lookup("SMTP_FROM") {
            self.smtp.from = Some(v);
        }
        if let Some(v) = lookup("SMTP_TIMEOUT_SECS") {
            self.smtp.timeout_secs = parse("SMTP_TIMEOUT_SECS", &v)?;
        }

        if let Some(v) = lookup("AUDIT_LOG_DIR") {
            self.audit.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("UPLOAD_DIR") {
            self.upload.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("UPLOAD_MAX_BYTES") {
            self.upload.max_bytes = parse("UPLOAD_MAX_BYTES", &v)?;
        }
        if let Some(v) = lookup("TAX_PERCENT") {
            self.checkout.tax_percent = parse("TAX_PERCENT", &v)?;
        }

        Ok(())
    }

    /// Validate the merged configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.auth.secret.as_deref() {
            None | Some("") => return Err(ConfigError::MissingValue("APP_SECRET")),
            Some(secret) if secret.len() < 32 => {
                return Err(ConfigError::Rejected {
                    key: "APP_SECRET",
                    reason: "must be at least 32 bytes".to_string(),
                })
            }
            Some(_) => {}
        }

        if !(4..=12).contains(&self.auth.otp_length) {
            return Err(ConfigError::Rejected {
                key: "OTP_LENGTH",
                reason: "must be between 4 and 12".to_string(),
            });
        }
        for (key, minutes) in [
            ("OTP_TTL_MINUTES", self.auth.otp_ttl_minutes),
            ("SESSION_TTL_MINUTES", self.auth.session_ttl_minutes),
            ("VERIFICATION_TTL_MINUTES", self.auth.verification_ttl_minutes),
            ("RESET_TTL_MINUTES", self.auth.reset_ttl_minutes),
        ] {
            if minutes == 0 || minutes > MAX_TTL_MINUTES {
                return Err(ConfigError::Rejected {
                    key,
                    reason: format!("must be between 1 and {}", MAX_TTL_MINUTES),
                });
            }
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::Rejected {
                key: "BCRYPT_COST",
                reason: "must be between 4 and 31".to_string(),
            });
        }

        if self.smtp.driver == MailDriver::Smtp {
            let required = [
                ("SMTP_HOST", &self.smtp.host),
                ("SMTP_USERNAME", &self.smtp.username),
                ("SMTP_PASSWORD", &self.smtp.password),
                ("SMTP_FROM", &self.smtp.from),
            ];
            for (key, value) in required {
                if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                    return Err(ConfigError::MissingValue(key));
                }
            }
        }

        if self.checkout.tax_percent > 100 {
            return Err(ConfigError::Rejected {
                key: "TAX_PERCENT",
                reason: "must be between 0 and 100".to_string(),
            });
        }

        Ok(())
    }

    /// Shared secret; only call after `validate` succeeded.
    pub fn secret(&self) -> &str {
        self.auth.secret.as_deref().unwrap_or_default()
    }
}

/// Longest accepted lifetime for codes and tokens: 365 days
const MAX_TTL_MINUTES: u64 = 365 * 24 * 60;

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn smtp_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("APP_SECRET", SECRET),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", "hunter2"),
            ("SMTP_FROM", "noreply@example.com"),
        ]
    }

    #[test]
    fn test_defaults_with_required_env() {
        let config = AppConfig::from_sources(None, env_from(&smtp_env())).unwrap();
        assert_eq!(config.auth.otp_length, 8);
        assert_eq!(config.auth.otp_ttl_minutes, 5);
        assert_eq!(config.auth.session_ttl_minutes, 90);
        assert_eq!(config.auth.reset_ttl_minutes, 60);
        assert_eq!(config.database.driver, DbDriver::Postgres);
    }

    #[test]
    fn test_env_overrides_file() {
        let json = r#"{
            "server": {"port": 8080, "cors_origins": ["https://a.example"]},
            "auth": {"otp_length": 6, "session_ttl_minutes": 30},
            "database": {"driver": "sqlite", "name": "file.db"}
        }"#;
        let mut env = smtp_env();
        env.push(("SESSION_TTL_MINUTES", "45"));
        env.push(("CORS_ORIGINS", "https://b.example, https://c.example"));

        let config = AppConfig::from_sources(Some(json), env_from(&env)).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.otp_length, 6);
        assert_eq!(config.auth.session_ttl_minutes, 45);
        assert_eq!(
            config.server.cors_origins,
            vec!["https://b.example".to_string(), "https://c.example".to_string()]
        );
        assert_eq!(config.database.connection_url(), "sqlite://file.db?mode=rwc");
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let env: Vec<_> = smtp_env().into_iter().filter(|(k, _)| *k != "APP_SECRET").collect();
        let err = AppConfig::from_sources(None, env_from(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue("APP_SECRET")));
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let mut env = smtp_env();
        env[0] = ("APP_SECRET", "short");
        let err = AppConfig::from_sources(None, env_from(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Rejected { key: "APP_SECRET", .. }));
    }

    #[test]
    fn test_ttl_bounds() {
        for minutes in ["0", "525601", "18446744073709551615"] {
            let env = env_from(&[
                ("APP_SECRET", SECRET),
                ("MAIL_DRIVER", "log"),
                ("SESSION_TTL_MINUTES", minutes),
            ]);
            let err = AppConfig::from_sources(None, env).unwrap_err();
            assert!(
                matches!(err, ConfigError::Rejected { key: "SESSION_TTL_MINUTES", .. }),
                "{} minutes: {:?}",
                minutes,
                err
            );
        }

        let env = env_from(&[
            ("APP_SECRET", SECRET),
            ("MAIL_DRIVER", "log"),
            ("RESET_TTL_MINUTES", "525600"),
        ]);
        assert!(AppConfig::from_sources(None, env).is_ok());
    }

    #[test]
    fn test_missing_smtp_is_fatal() {
        let env: Vec<_> = smtp_env().into_iter().filter(|(k, _)| *k != "SMTP_PASSWORD").collect();
        let err = AppConfig::from_sources(None, env_from(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue("SMTP_PASSWORD")));
    }

    #[test]
    fn test_log_mail_driver_skips_smtp_check() {
        let env = env_from(&[("APP_SECRET", SECRET), ("MAIL_DRIVER", "log")]);
        assert!(AppConfig::from_sources(None, env).is_ok());
    }

    #[test]
    fn test_invalid_number_names_key() {
        let mut env = smtp_env();
        env.push(("OTP_LENGTH", "eight"));
        let err = AppConfig::from_sources(None, env_from(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "OTP_LENGTH", .. }));
    }

    #[test]
    fn test_redis_url() {
        let mut cache = CacheConfig::default();
        assert_eq!(cache.redis_url(), "redis://localhost:6379/0");
        cache.password = Some("pw".to_string());
        cache.db = 2;
        assert_eq!(cache.redis_url(), "redis://:pw@localhost:6379/2");
    }
}
