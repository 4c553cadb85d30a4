//! Order Number Generation
//!
//! Human-readable, unique enough to survive concurrent checkouts:
//! `RO-<UTC timestamp>-<3 random bytes hex>`. The orders table carries a
//! UNIQUE constraint as the backstop; the settlement engine retries on
//! collision.

use rand::Rng;

pub fn gen_order_number() -> String {
    let ts = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let mut suffix = [0u8; 3];
    rand::thread_rng().fill(&mut suffix);
    format!("RO-{}-{}", ts, hex::encode_upper(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_format() {
        let n = gen_order_number();
        // RO- + 14 digit timestamp + - + 6 hex chars
        assert_eq!(n.len(), 3 + 14 + 1 + 6);
        assert!(n.starts_with("RO-"));
        let suffix = n.rsplit('-').next().unwrap();
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_collision_resistance_in_burst() {
        let numbers: HashSet<String> = (0..512).map(|_| gen_order_number()).collect();
        // 2^24 suffixes per second; 512 draws should essentially never collide
        assert!(numbers.len() >= 510);
    }
}
