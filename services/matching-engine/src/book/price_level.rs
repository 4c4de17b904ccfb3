//! Price level with FIFO queue
//!
//! A price level owns all resting orders at one price on one side,
//! in strict acceptance order. The aggregate quantity is maintained
//! incrementally so depth queries never walk the queue.

use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::Order;
use std::collections::VecDeque;

/// Resting orders at a single price, FIFO by acceptance sequence.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level.
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Append an order at the back of the queue (time priority).
    pub fn push_back(&mut self, order: Order) {
        self.total_quantity = self.total_quantity + order.remaining_quantity;
        self.orders.push_back(order);
    }

    /// Remove an order by id anywhere in the queue.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| &o.order_id == order_id)?;
        let order = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity.saturating_sub(order.remaining_quantity);
        Some(order)
    }

    /// The order at the front of the queue.
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Fill the front order by `quantity`.
    ///
    /// Returns the completed order if the fill consumed it entirely
    /// (the order is popped from the queue).
    ///
    /// # Panics
    /// Panics if the level is empty or the fill exceeds the front
    /// order's remaining quantity.
    pub fn fill_front(&mut self, quantity: Quantity) -> Option<Order> {
        let front = self
            .orders
            .front_mut()
            .expect("fill_front on empty price level");
        front.apply_fill(quantity);
        self.total_quantity = self.total_quantity.saturating_sub(quantity);

        if front.is_filled() {
            self.orders.pop_front()
        } else {
            None
        }
    }

    /// Find an order by id.
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.order_id == order_id)
    }

    /// Iterate orders in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Whether the level holds no orders.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Aggregate remaining quantity at this level.
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Number of orders at this level.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Symbol;
    use types::numeric::Price;
    use types::order::{OrderKind, Side};

    fn limit_order(qty: &str, seq: u64) -> Order {
        Order::new(
            Symbol::new("BTC-USDT"),
            Side::Buy,
            OrderKind::Limit,
            Some(Price::from_u64(100)),
            None,
            Quantity::from_str(qty).unwrap(),
            seq,
        )
    }

    #[test]
    fn test_push_maintains_total() {
        let mut level = PriceLevel::new();
        level.push_back(limit_order("1.5", 1));
        level.push_back(limit_order("2.5", 2));

        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_quantity(), Quantity::from_str("4.0").unwrap());
    }

    #[test]
    fn test_fifo_order() {
        let mut level = PriceLevel::new();
        let first = limit_order("1.0", 1);
        let first_id = first.order_id;
        level.push_back(first);
        level.push_back(limit_order("2.0", 2));

        assert_eq!(level.front().unwrap().order_id, first_id);
    }

    #[test]
    fn test_fill_front_partial() {
        let mut level = PriceLevel::new();
        level.push_back(limit_order("5.0", 1));

        let completed = level.fill_front(Quantity::from_str("2.0").unwrap());
        assert!(completed.is_none());
        assert_eq!(level.total_quantity(), Quantity::from_str("3.0").unwrap());
        assert_eq!(level.order_count(), 1);
    }

    #[test]
    fn test_fill_front_complete_pops() {
        let mut level = PriceLevel::new();
        let order = limit_order("1.0", 1);
        let order_id = order.order_id;
        level.push_back(order);
        level.push_back(limit_order("2.0", 2));

        let completed = level.fill_front(Quantity::from_str("1.0").unwrap());
        assert_eq!(completed.unwrap().order_id, order_id);
        assert_eq!(level.order_count(), 1);
        assert_eq!(level.total_quantity(), Quantity::from_str("2.0").unwrap());
    }

    #[test]
    fn test_remove_mid_queue() {
        let mut level = PriceLevel::new();
        level.push_back(limit_order("1.0", 1));
        let middle = limit_order("2.0", 2);
        let middle_id = middle.order_id;
        level.push_back(middle);
        level.push_back(limit_order("3.0", 3));

        let removed = level.remove(&middle_id);
        assert_eq!(removed.unwrap().order_id, middle_id);
        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_quantity(), Quantity::from_str("4.0").unwrap());

        assert!(level.remove(&middle_id).is_none());
    }

    #[test]
    fn test_get_by_id() {
        let mut level = PriceLevel::new();
        let order = limit_order("1.0", 1);
        let order_id = order.order_id;
        level.push_back(order);

        assert!(level.get(&order_id).is_some());
        assert!(level.get(&OrderId::new()).is_none());
    }
}
