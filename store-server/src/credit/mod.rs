//! Store Credit Module
//!
//! Append-only referral/credit ledger backing the cached
//! `users.referral_credit` balance.

mod ledger;

pub use ledger::*;
