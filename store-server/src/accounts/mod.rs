//! Account Registration
//!
//! Input-validated registration on top of the user repository. Password
//! storage, session handling, and email verification tokens belong to the
//! auth layer above this crate; what lives here is the compliance-relevant
//! identity record.

use crate::db::repository::user;
use crate::utils::{AppError, AppResult};
use serde::Deserialize;
use shared::models::{User, UserCreate};
use sqlx::SqlitePool;
use validator::Validate;

/// Registration payload with field-level validation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 5, max = 100))]
    pub phone: String,
    #[validate(length(max = 200))]
    pub organization: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub country: String,
}

/// Create the account. Duplicate emails surface as `Conflict`.
pub async fn register(pool: &SqlitePool, request: RegistrationRequest) -> AppResult<User> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let created = user::create(
        pool,
        UserCreate {
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            organization: request.organization,
            country: request.country,
        },
    )
    .await?;

    tracing::info!(user_id = created.id, "Account registered");
    Ok(created)
}
