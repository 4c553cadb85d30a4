//! Discount / Referral Code Module
//!
//! Validates codes and computes discount amounts and referral commission
//! splits. Pure evaluation lives in `evaluator`; `preview` is the
//! side-effect-free lookup used before checkout. Usage counters only move
//! when the settlement engine commits an order.

mod evaluator;
mod preview;

pub use evaluator::*;
pub use preview::*;
