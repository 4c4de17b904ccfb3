//! Recent-trade tape
//!
//! Bounded ring of executed trades per symbol, serving recent-trade
//! queries newest first. Owned by the symbol lane; readers receive
//! snapshot copies.

use std::collections::VecDeque;

use types::ids::Symbol;
use types::trade::Trade;

/// Bounded recent-trade history for one symbol.
#[derive(Debug)]
pub struct TradeTape {
    symbol: Symbol,
    trades: VecDeque<Trade>,
    capacity: usize,
    /// Lifetime count of recorded trades (not bounded by capacity).
    total_recorded: u64,
}

impl TradeTape {
    /// Create an empty tape.
    pub fn new(symbol: Symbol, capacity: usize) -> Self {
        Self {
            symbol,
            trades: VecDeque::with_capacity(capacity),
            capacity,
            total_recorded: 0,
        }
    }

    /// Record a trade, evicting the oldest if at capacity.
    pub fn record(&mut self, trade: Trade) {
        debug_assert_eq!(trade.symbol, self.symbol);
        if self.trades.len() >= self.capacity {
            self.trades.pop_front();
        }
        self.trades.push_back(trade);
        self.total_recorded += 1;
    }

    /// Most recent trades, newest first.
    pub fn recent(&self, limit: usize) -> Vec<Trade> {
        self.trades.iter().rev().take(limit).cloned().collect()
    }

    /// Number of trades currently held.
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    /// Whether the tape holds no trades.
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Lifetime count of recorded trades.
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    /// Symbol this tape is for.
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::OrderId;
    use types::numeric::{Price, Quantity};
    use types::order::Side;

    fn make_trade(trade_id: u64, price: u64) -> Trade {
        Trade::new(
            trade_id,
            Symbol::new("BTC-USDT"),
            Price::from_u64(price),
            Quantity::from_str("1").unwrap(),
            OrderId::new(),
            OrderId::new(),
            Side::Sell,
            rust_decimal::Decimal::ZERO,
            rust_decimal::Decimal::ZERO,
            1708123456789000000 + trade_id as i64,
        )
    }

    #[test]
    fn test_record_and_recent_ordering() {
        let mut tape = TradeTape::new(Symbol::new("BTC-USDT"), 100);
        for id in 1..=3 {
            tape.record(make_trade(id, 100 + id));
        }

        let recent = tape.recent(2);
        assert_eq!(recent.len(), 2);
        // Newest first
        assert_eq!(recent[0].trade_id, 3);
        assert_eq!(recent[1].trade_id, 2);
    }

    #[test]
    fn test_capacity_eviction() {
        let mut tape = TradeTape::new(Symbol::new("BTC-USDT"), 3);
        for id in 1..=5 {
            tape.record(make_trade(id, 100));
        }

        assert_eq!(tape.len(), 3);
        assert_eq!(tape.total_recorded(), 5);
        let recent = tape.recent(10);
        assert_eq!(recent[0].trade_id, 5);
        assert_eq!(recent[2].trade_id, 3);
    }

    #[test]
    fn test_empty_tape() {
        let tape = TradeTape::new(Symbol::new("ETH-USDC"), 10);
        assert!(tape.is_empty());
        assert!(tape.recent(5).is_empty());
    }
}
