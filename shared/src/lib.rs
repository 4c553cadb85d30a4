//! Shared domain types for the storefront.
//!
//! Everything here is plain data: entity rows, status enums, and the ID/time
//! helpers both the server and its tooling use. Business logic lives in
//! `store-server`.
//!
//! The `db` feature adds `sqlx::FromRow`/`sqlx::Type` derives so the same
//! structs can be hydrated straight from SQLite rows.

pub mod models;
pub mod types;
pub mod util;

pub use types::{
    DeliveryMethod, LedgerEntryType, OrderStatus, PriceBasis, ReferrerChoice, ResolutionType,
    ReturnStatus,
};
