//! Unified error handling.
//!
//! Every error surfaced by the settlement engine and the returns resolver is
//! raised before any mutation commits; partial application is a bug, not a
//! degraded mode. Storage errors abort the surrounding transaction and come
//! out as `Database`.

use crate::db::repository::RepoError;
use tracing::error;

/// Application error taxonomy.
///
/// | Variant | Meaning |
/// |---------|---------|
/// | `Validation` | Missing/malformed input, rejected before any mutation |
/// | `NotFound` | Product/order/code/user absent |
/// | `Conflict` | Insufficient stock, exhausted/expired code, double return |
/// | `Forbidden` | Non-owner or non-admin caller |
/// | `State` | Operation not legal for the row's current status |
/// | `Database` | Storage failure, transaction aborted |
/// | `Internal` | Anything else unexpected |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

// ========== Helper Constructors ==========

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        error!(target: "database", error = %msg, "Database error occurred");
        Self::Database(msg)
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                AppError::Database(msg)
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        error!(target: "database", error = %err, "Database error occurred");
        AppError::Database(err.to_string())
    }
}
