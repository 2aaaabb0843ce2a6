//! Database Module
//!
//! One [`Database`] handle wraps a `sqlx::AnyPool` connected to either
//! PostgreSQL or SQLite. Repository SQL is written once with `?`
//! placeholders and rendered for the connected dialect by [`Database::sql`],
//! so PostgreSQL receives `$1, $2, ...` and SQLite keeps `?`.
//!
//! Column types are restricted to what the `Any` driver maps on both engines:
//! text ids, `BIGINT` Unix-second timestamps, integer flags and amounts.
//!
//! # Example
//!
//! ```rust,no_run
//! use tourfleet::backend::db::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect_url("sqlite::memory:", 1, 5).await?;
//! db.migrate().await?;
//! let sql = db.sql("SELECT id FROM users WHERE email = ?");
//! # Ok(())
//! # }
//! ```

pub mod error;

use std::time::Duration;

use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::{Any, AnyPool, Transaction};

use crate::shared::config::DatabaseConfig;

pub use error::{StoreContext, StoreError};

/// Placeholder syntax of the connected engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Positional `$n` placeholders
    Postgres,
    /// `?` placeholders
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::Postgres)
        } else if url.starts_with("sqlite:") {
            Some(Self::Sqlite)
        } else {
            None
        }
    }

    /// Render a `?`-placeholder statement for this dialect. Question marks
    /// inside single-quoted literals are left alone.
    pub fn render(&self, template: &str) -> String {
        match self {
            Self::Sqlite => template.to_string(),
            Self::Postgres => {
                let mut out = String::with_capacity(template.len() + 8);
                let mut index = 0;
                let mut in_literal = false;
                for c in template.chars() {
                    match c {
                        '\'' => {
                            in_literal = !in_literal;
                            out.push(c);
                        }
                        '?' if !in_literal => {
                            index += 1;
                            out.push('$');
                            out.push_str(&index.to_string());
                        }
                        _ => out.push(c),
                    }
                }
                out
            }
        }
    }
}

/// Process-wide database handle, cheap to clone
#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
}

impl Database {
    /// Connect using the configured driver and connection fields.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        Self::connect_url(
            &config.connection_url(),
            config.max_connections,
            config.acquire_timeout_secs,
        )
        .await
    }

    pub async fn connect_url(
        url: &str,
        max_connections: u32,
        acquire_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        install_default_drivers();

        let dialect =
            Dialect::from_url(url).ok_or_else(|| StoreError::UnsupportedUrl(redact_url(url)))?;

        let mut options = AnyPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs.max(1)));

        // Every connection to `sqlite::memory:` opens a separate database,
        // so the in-memory pool is pinned to one connection that never expires.
        if url.contains(":memory:") {
            options = options
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = options
            .connect(url)
            .await
            .context("connect to database")?;

        tracing::info!("Connected to {:?} database", dialect);
        Ok(Self { pool, dialect })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Render a `?`-placeholder statement for the connected dialect.
    pub fn sql(&self, template: &str) -> String {
        self.dialect.render(template)
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Any>, StoreError> {
        self.pool.begin().await.context("begin transaction")
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations completed successfully");
        Ok(())
    }
}

fn redact_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, _)) => format!("{}://…", scheme),
        None => "<unrecognised>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_placeholders_are_numbered() {
        let sql = Dialect::Postgres.render("UPDATE users SET fullname = ?, city = ? WHERE id = ?");
        assert_eq!(sql, "UPDATE users SET fullname = $1, city = $2 WHERE id = $3");
    }

    #[test]
    fn test_sqlite_placeholders_unchanged() {
        let template = "SELECT * FROM fleets WHERE organization_id = ? AND id = ?";
        assert_eq!(Dialect::Sqlite.render(template), template);
    }

    #[test]
    fn test_literal_question_marks_survive() {
        let sql = Dialect::Postgres.render("SELECT '?' AS q, name FROM t WHERE a = ?");
        assert_eq!(sql, "SELECT '?' AS q, name FROM t WHERE a = $1");
    }

    #[test]
    fn test_dialect_from_url() {
        assert_eq!(Dialect::from_url("postgres://u:p@h/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("mysql://h/db"), None);
    }

    #[test]
    fn test_redact_url_hides_credentials() {
        assert_eq!(redact_url("mysql://root:secret@h/db"), "mysql://…");
    }

    #[tokio::test]
    async fn test_memory_database_migrates() {
        let db = Database::connect_url("sqlite::memory:", 1, 5).await.unwrap();
        db.migrate().await.unwrap();
        let sql = db.sql("SELECT COUNT(*) AS n FROM users WHERE deleted_at IS NULL");
        let row: (i64,) = sqlx::query_as(&sql).fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, 0);
    }
}
