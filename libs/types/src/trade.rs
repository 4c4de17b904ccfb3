//! Trade execution types
//!
//! A Trade records one atomic exchange between a resting maker and an
//! incoming taker. Quantities are deducted from both orders before the
//! Trade value exists, so every Trade the engine emits is already
//! reflected in the book.

use crate::ids::{OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Engine-wide monotonic trade identifier.
    pub trade_id: u64,
    pub symbol: Symbol,
    /// Execution price (always the maker's resting price).
    pub price: Price,
    pub quantity: Quantity,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    /// Side of the resting order; the taker was on the opposite side.
    pub maker_side: Side,
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
    /// Execution timestamp, Unix nanoseconds.
    pub timestamp: i64,
}

impl Trade {
    /// Create a new trade.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_id: u64,
        symbol: Symbol,
        price: Price,
        quantity: Quantity,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker_side: Side,
        maker_fee: Decimal,
        taker_fee: Decimal,
        timestamp: i64,
    ) -> Self {
        Self {
            trade_id,
            symbol,
            price,
            quantity,
            maker_order_id,
            taker_order_id,
            maker_side,
            maker_fee,
            taker_fee,
            timestamp,
        }
    }

    /// Trade notional (price × quantity).
    pub fn notional(&self) -> Decimal {
        self.quantity.as_decimal() * self.price.as_decimal()
    }

    /// Side of the aggressing (taker) order.
    pub fn taker_side(&self) -> Side {
        self.maker_side.opposite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> Trade {
        Trade::new(
            42,
            Symbol::new("BTC-USDT"),
            Price::from_u64(50000),
            Quantity::from_str("0.5").unwrap(),
            OrderId::new(),
            OrderId::new(),
            Side::Sell,
            Decimal::from_str_exact("2.5").unwrap(),
            Decimal::from_str_exact("5.0").unwrap(),
            1708123456789000000,
        )
    }

    #[test]
    fn test_notional() {
        let trade = sample_trade();
        assert_eq!(trade.notional(), Decimal::from(25000));
    }

    #[test]
    fn test_taker_side_is_opposite() {
        let trade = sample_trade();
        assert_eq!(trade.maker_side, Side::Sell);
        assert_eq!(trade.taker_side(), Side::Buy);
    }

    #[test]
    fn test_trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deserialized: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deserialized);
    }
}
