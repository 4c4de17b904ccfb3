//! Trade factory
//!
//! Turns book fills into trades: assigns the engine-wide monotonic
//! trade id, tags maker/taker liquidity, and computes both fees in the
//! same step so a trade value never exists without its fees.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use types::fee::FeeSchedule;
use types::ids::Symbol;
use types::order::Order;
use types::trade::Trade;

use crate::book::Fill;

/// Builds trades for one symbol lane.
///
/// The id counter is shared across lanes so trade ids are monotonic
/// engine-wide.
#[derive(Debug)]
pub struct TradeFactory {
    trade_ids: Arc<AtomicU64>,
    fees: FeeSchedule,
    fee_scale: u32,
}

impl TradeFactory {
    pub fn new(trade_ids: Arc<AtomicU64>, fees: FeeSchedule, fee_scale: u32) -> Self {
        Self {
            trade_ids,
            fees,
            fee_scale,
        }
    }

    /// Build the trade for one fill of `taker`.
    ///
    /// The fill's price is the maker's resting price; the maker side is
    /// the opposite of the taker's.
    pub fn trade_for_fill(
        &self,
        symbol: &Symbol,
        taker: &Order,
        fill: &Fill,
        timestamp: i64,
    ) -> Trade {
        let (maker_fee, taker_fee) = self.fees.fees(fill.price, fill.quantity, self.fee_scale);
        let trade_id = self.trade_ids.fetch_add(1, Ordering::Relaxed);

        Trade::new(
            trade_id,
            symbol.clone(),
            fill.price,
            fill.quantity,
            fill.maker_order_id,
            taker.order_id,
            taker.side.opposite(),
            maker_fee,
            taker_fee,
            timestamp,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use types::ids::OrderId;
    use types::numeric::{Price, Quantity};
    use types::order::{OrderKind, Side};

    fn taker() -> Order {
        Order::new(
            Symbol::new("BTC-USDT"),
            Side::Buy,
            OrderKind::Market,
            None,
            None,
            Quantity::from_str("3").unwrap(),
            1,
        )
    }

    fn fill(price: u64, qty: &str) -> Fill {
        Fill {
            maker_order_id: OrderId::new(),
            price: Price::from_u64(price),
            quantity: Quantity::from_str(qty).unwrap(),
            maker_remaining: Quantity::zero(),
        }
    }

    #[test]
    fn test_trade_ids_monotonic_across_factories() {
        let ids = Arc::new(AtomicU64::new(1));
        let f1 = TradeFactory::new(Arc::clone(&ids), FeeSchedule::default(), 8);
        let f2 = TradeFactory::new(Arc::clone(&ids), FeeSchedule::default(), 8);

        let symbol = Symbol::new("BTC-USDT");
        let taker = taker();
        let t1 = f1.trade_for_fill(&symbol, &taker, &fill(100, "1"), 0);
        let t2 = f2.trade_for_fill(&symbol, &taker, &fill(100, "1"), 0);
        let t3 = f1.trade_for_fill(&symbol, &taker, &fill(100, "1"), 0);

        assert_eq!(t1.trade_id, 1);
        assert_eq!(t2.trade_id, 2);
        assert_eq!(t3.trade_id, 3);
    }

    #[test]
    fn test_liquidity_tagging_and_fees() {
        let ids = Arc::new(AtomicU64::new(1));
        let factory = TradeFactory::new(ids, FeeSchedule::default(), 8);

        let symbol = Symbol::new("BTC-USDT");
        let taker = taker();
        let trade = factory.trade_for_fill(&symbol, &taker, &fill(100, "3"), 42);

        // Buy taker means the maker sat on the sell side
        assert_eq!(trade.maker_side, Side::Sell);
        assert_eq!(trade.taker_order_id, taker.order_id);
        assert_eq!(trade.timestamp, 42);

        // Default schedule on notional 300
        assert_eq!(trade.maker_fee, Decimal::from_str_exact("0.03").unwrap());
        assert_eq!(trade.taker_fee, Decimal::from_str_exact("0.06").unwrap());
    }
}
