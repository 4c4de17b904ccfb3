//! Bid (buy-side) book
//!
//! Buy price levels keyed by price in a BTreeMap; the best bid is the
//! highest key. BTreeMap keeps iteration deterministic and best-price
//! access logarithmic in the number of live levels.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

use super::price_level::PriceLevel;

/// Buy side of the book, best (highest) price first.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert a resting order at its limit price.
    pub fn insert(&mut self, price: Price, order: Order) {
        self.levels.entry(price).or_default().push_back(order);
    }

    /// Remove an order; drops the level if it empties.
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let order = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(order)
    }

    /// Best bid price and aggregate quantity.
    pub fn best(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Best bid price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Mutable access to the best level, for the sweep.
    pub(crate) fn best_level_mut(&mut self) -> Option<(Price, &mut PriceLevel)> {
        self.levels
            .iter_mut()
            .next_back()
            .map(|(price, level)| (*price, level))
    }

    /// Drop the level at `price` if it is empty.
    pub(crate) fn prune_level(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(|l| l.is_empty()) {
            self.levels.remove(&price);
        }
    }

    /// Aggregate quantity at a price (zero if the level is absent).
    pub fn level_quantity(&self, price: Price) -> Quantity {
        self.levels
            .get(&price)
            .map(|l| l.total_quantity())
            .unwrap_or_else(Quantity::zero)
    }

    /// Top-N levels, best first.
    pub fn depth(&self, levels: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .rev()
            .take(levels)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    /// Look up an order by id at a known price.
    pub fn get(&self, order_id: &OrderId, price: Price) -> Option<&Order> {
        self.levels.get(&price)?.get(order_id)
    }

    /// Iterate levels best-first.
    pub fn iter_levels(&self) -> impl Iterator<Item = (&Price, &PriceLevel)> {
        self.levels.iter().rev()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Total resting order count across all levels.
    pub fn order_count(&self) -> usize {
        self.levels.values().map(|l| l.order_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Symbol;
    use types::order::{OrderKind, Side};

    fn bid(price: u64, qty: &str, seq: u64) -> Order {
        Order::new(
            Symbol::new("BTC-USDT"),
            Side::Buy,
            OrderKind::Limit,
            Some(Price::from_u64(price)),
            None,
            Quantity::from_str(qty).unwrap(),
            seq,
        )
    }

    #[test]
    fn test_best_is_highest() {
        let mut book = BidBook::new();
        book.insert(Price::from_u64(50000), bid(50000, "1.0", 1));
        book.insert(Price::from_u64(51000), bid(51000, "2.0", 2));
        book.insert(Price::from_u64(49000), bid(49000, "1.5", 3));

        let (price, qty) = book.best().unwrap();
        assert_eq!(price, Price::from_u64(51000));
        assert_eq!(qty, Quantity::from_str("2.0").unwrap());
    }

    #[test]
    fn test_remove_prunes_empty_level() {
        let mut book = BidBook::new();
        let order = bid(50000, "1.0", 1);
        let order_id = order.order_id;
        book.insert(Price::from_u64(50000), order);

        assert!(book.remove(&order_id, Price::from_u64(50000)).is_some());
        assert!(book.is_empty());
    }

    #[test]
    fn test_depth_ordering() {
        let mut book = BidBook::new();
        book.insert(Price::from_u64(50000), bid(50000, "1.0", 1));
        book.insert(Price::from_u64(52000), bid(52000, "0.5", 2));
        book.insert(Price::from_u64(51000), bid(51000, "2.0", 3));

        let depth = book.depth(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].0, Price::from_u64(52000));
        assert_eq!(depth[1].0, Price::from_u64(51000));
    }

    #[test]
    fn test_same_price_aggregates() {
        let mut book = BidBook::new();
        book.insert(Price::from_u64(50000), bid(50000, "1.0", 1));
        book.insert(Price::from_u64(50000), bid(50000, "2.0", 2));

        assert_eq!(book.level_count(), 1);
        assert_eq!(book.order_count(), 2);
        assert_eq!(
            book.level_quantity(Price::from_u64(50000)),
            Quantity::from_str("3.0").unwrap()
        );
    }
}
