//! Repository error type. Every `sqlx::Error` is wrapped exactly once with a
//! short description of the statement that failed; unique-constraint
//! violations are surfaced as their own variant so services can map them to
//! a conflict.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("{context}: unique constraint violated ({detail})")]
    UniqueViolation {
        context: &'static str,
        /// Constraint name when the engine reports one, else the driver message
        detail: String,
    },

    #[error("{context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("unsupported database url: {0}")]
    UnsupportedUrl(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// True when the violated constraint mentions `column`.
    pub fn violates(&self, column: &str) -> bool {
        match self {
            Self::UniqueViolation { detail, .. } => detail.contains(column),
            _ => false,
        }
    }
}

/// Attach statement context to a `sqlx` result
pub trait StoreContext<T> {
    fn context(self, context: &'static str) -> Result<T, StoreError>;
}

impl<T> StoreContext<T> for Result<T, sqlx::Error> {
    fn context(self, context: &'static str) -> Result<T, StoreError> {
        self.map_err(|source| match &source {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation {
                context,
                detail: db
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db.message().to_string()),
            },
            _ => StoreError::Query { context, source },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_query_error() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = result.context("load user").unwrap_err();
        assert!(!err.is_unique_violation());
        assert!(err.to_string().starts_with("load user:"));
    }

    #[test]
    fn test_violates_matches_detail() {
        let err = StoreError::UniqueViolation {
            context: "insert user",
            detail: "UNIQUE constraint failed: users.email".to_string(),
        };
        assert!(err.violates("email"));
        assert!(!err.violates("phone"));
    }
}
