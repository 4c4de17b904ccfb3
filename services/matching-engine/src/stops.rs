//! Stop order monitor
//!
//! Armed conditional orders rest here, outside the book, keyed by stop
//! price in two sorted maps: orders that trigger when the last trade
//! price rises to the stop, and orders that trigger when it falls.
//! `on_price` pops every satisfied order, closest stop price to the
//! pre-move last price first, FIFO within a price.
//!
//! Popping removes an order permanently, so replaying a price that
//! does not advance yields no new triggers.

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::debug;
use types::ids::{OrderId, Symbol};
use types::numeric::Price;
use types::order::{Order, OrderStatus, TriggerDirection};

/// Armed stop orders for one symbol.
#[derive(Debug)]
pub struct StopBook {
    symbol: Symbol,
    /// Trigger when last price >= stop price.
    above: BTreeMap<Price, VecDeque<Order>>,
    /// Trigger when last price <= stop price.
    below: BTreeMap<Price, VecDeque<Order>>,
    /// Locator for cancels.
    index: HashMap<OrderId, (TriggerDirection, Price)>,
}

impl StopBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            above: BTreeMap::new(),
            below: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    /// Arm a conditional order.
    ///
    /// # Panics
    /// Panics if the order has no trigger direction or stop price —
    /// boundary validation guarantees both for conditional kinds.
    pub fn arm(&mut self, order: Order) {
        let direction = order
            .trigger_direction()
            .expect("armed order must be a conditional kind");
        let stop_price = order
            .stop_price
            .expect("armed order must carry a stop price");

        debug!(
            symbol = %self.symbol,
            order_id = %order.order_id,
            stop_price = %stop_price,
            ?direction,
            "stop order armed"
        );

        self.index.insert(order.order_id, (direction, stop_price));
        let map = match direction {
            TriggerDirection::Above => &mut self.above,
            TriggerDirection::Below => &mut self.below,
        };
        map.entry(stop_price).or_default().push_back(order);
    }

    /// Remove an armed order by id.
    pub fn cancel(&mut self, order_id: &OrderId) -> Option<Order> {
        let (direction, stop_price) = self.index.remove(order_id)?;
        let map = match direction {
            TriggerDirection::Above => &mut self.above,
            TriggerDirection::Below => &mut self.below,
        };
        let queue = map.get_mut(&stop_price)?;
        let position = queue.iter().position(|o| &o.order_id == order_id)?;
        let order = queue.remove(position);
        if queue.is_empty() {
            map.remove(&stop_price);
        }
        order
    }

    /// Pop all orders triggered at `last`, marked Triggered.
    ///
    /// `prev` is the pre-move last price and decides which direction's
    /// stops activate first; within a direction, stop prices closer to
    /// `prev` come first, FIFO within equal stop price.
    pub fn on_price(&mut self, last: Price, prev: Option<Price>) -> Vec<Order> {
        let above_keys: Vec<Price> = self.above.range(..=last).map(|(k, _)| *k).collect();
        let below_keys: Vec<Price> = self.below.range(last..).rev().map(|(k, _)| *k).collect();

        let mut rising = Vec::new();
        for key in above_keys {
            if let Some(queue) = self.above.remove(&key) {
                rising.extend(queue);
            }
        }
        let mut falling = Vec::new();
        for key in below_keys {
            if let Some(queue) = self.below.remove(&key) {
                falling.extend(queue);
            }
        }

        let moved_up = prev.is_none_or(|p| last >= p);
        let mut triggered = if moved_up {
            rising.extend(falling);
            rising
        } else {
            falling.extend(rising);
            falling
        };

        for order in &mut triggered {
            self.index.remove(&order.order_id);
            order.status = OrderStatus::Triggered;
            debug!(
                symbol = %self.symbol,
                order_id = %order.order_id,
                last = %last,
                "stop order triggered"
            );
        }
        triggered
    }

    /// Whether any armed order would trigger at `last`, without
    /// popping. Lets the cascade loop stop at its ceiling while
    /// leaving un-activated stops armed.
    pub fn would_trigger(&self, last: Price) -> bool {
        self.above.range(..=last).next().is_some() || self.below.range(last..).next().is_some()
    }

    /// Look up an armed order.
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        let (direction, stop_price) = self.index.get(order_id)?;
        let map = match direction {
            TriggerDirection::Above => &self.above,
            TriggerDirection::Below => &self.below,
        };
        map.get(stop_price)?.iter().find(|o| &o.order_id == order_id)
    }

    /// All armed orders in deterministic order (rising stops ascending,
    /// then falling stops ascending). Used by snapshot export.
    pub fn armed_orders(&self) -> Vec<Order> {
        let mut orders = Vec::with_capacity(self.index.len());
        for queue in self.above.values() {
            orders.extend(queue.iter().cloned());
        }
        for queue in self.below.values() {
            orders.extend(queue.iter().cloned());
        }
        orders
    }

    /// Number of armed orders.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Transform a triggered order into its execution form: stop-market
/// becomes market, stop-limit and take-profit become limit at the
/// original limit price.
pub fn promote(mut order: Order) -> Order {
    let execution_kind = order
        .kind
        .execution_kind()
        .expect("only conditional orders are promoted");
    order.kind = execution_kind;
    order
}
