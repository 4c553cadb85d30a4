//! Compliance Acknowledgment Model

use serde::{Deserialize, Serialize};

/// Audit record of a compliance attestation, written at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Acknowledgment {
    pub id: i64,
    pub user_id: i64,
    pub acknowledgment_type: String,
    pub ip_address: Option<String>,
    /// SHA-256 prefix of the acknowledgment text version the user saw.
    pub version_hash: String,
    pub created_at: i64,
}
