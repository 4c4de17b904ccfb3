//! Crossing detection
//!
//! Determines when a taker may execute against an opposite price
//! level.

use types::numeric::Price;
use types::order::Side;

/// Whether a taker bounded by `bound` may execute at `level_price`.
///
/// A buy executes at asks at or below its limit; a sell at bids at or
/// above its limit. `None` means unbounded (market order).
pub fn marketable(taker_side: Side, bound: Option<Price>, level_price: Price) -> bool {
    match (taker_side, bound) {
        (_, None) => true,
        (Side::Buy, Some(limit)) => level_price <= limit,
        (Side::Sell, Some(limit)) => level_price >= limit,
    }
}

/// Whether a bid and an ask price cross.
pub fn crosses(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_always_marketable() {
        assert!(marketable(Side::Buy, None, Price::from_u64(1_000_000)));
        assert!(marketable(Side::Sell, None, Price::from_u64(1)));
    }

    #[test]
    fn test_buy_bound() {
        let limit = Some(Price::from_u64(100));
        assert!(marketable(Side::Buy, limit, Price::from_u64(99)));
        assert!(marketable(Side::Buy, limit, Price::from_u64(100)));
        assert!(!marketable(Side::Buy, limit, Price::from_u64(101)));
    }

    #[test]
    fn test_sell_bound() {
        let limit = Some(Price::from_u64(100));
        assert!(marketable(Side::Sell, limit, Price::from_u64(101)));
        assert!(marketable(Side::Sell, limit, Price::from_u64(100)));
        assert!(!marketable(Side::Sell, limit, Price::from_u64(99)));
    }

    #[test]
    fn test_crosses() {
        assert!(crosses(Price::from_u64(100), Price::from_u64(100)));
        assert!(crosses(Price::from_u64(101), Price::from_u64(100)));
        assert!(!crosses(Price::from_u64(99), Price::from_u64(100)));
    }
}
