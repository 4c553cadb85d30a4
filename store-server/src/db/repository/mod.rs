//! Repository Module
//!
//! CRUD operations over the SQLite schema: free async functions taking
//! `&SqlitePool` (or `&mut SqliteConnection` when they must participate in a
//! caller's transaction). Race-sensitive mutations are conditional UPDATEs
//! checked via `rows_affected()`.

pub mod acknowledgment;
pub mod discount_code;
pub mod notification_log;
pub mod order;
pub mod product;
pub mod referral;
pub mod returns;
pub mod user;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return RepoError::Duplicate(db_err.to_string());
        }
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
