//! Order lifecycle types
//!
//! The order kind is a tagged enum whose variant determines which price
//! fields must be present; validation happens once at the boundary and
//! the rest of the engine trusts the invariants.

use crate::ids::{OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind: lifetime policy plus conditional-trigger variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Execute immediately at any price; never rests.
    Market,
    /// Execute up to the limit price; residual rests on the book.
    Limit,
    /// Immediate-or-cancel: match what is marketable, cancel the rest.
    Ioc,
    /// Fill-or-kill: full fill up front or reject with no effect.
    Fok,
    /// Conditional market order armed at a stop price.
    StopMarket,
    /// Conditional limit order armed at a stop price.
    StopLimit,
    /// Conditional limit order with the trigger inverted per side.
    TakeProfit,
}

impl OrderKind {
    /// Whether this kind requires a limit price.
    pub fn requires_limit_price(&self) -> bool {
        matches!(
            self,
            OrderKind::Limit
                | OrderKind::Ioc
                | OrderKind::Fok
                | OrderKind::StopLimit
                | OrderKind::TakeProfit
        )
    }

    /// Whether this kind requires a stop price.
    pub fn requires_stop_price(&self) -> bool {
        matches!(
            self,
            OrderKind::StopMarket | OrderKind::StopLimit | OrderKind::TakeProfit
        )
    }

    /// Whether this kind is armed with the stop monitor rather than
    /// matched immediately.
    pub fn is_conditional(&self) -> bool {
        self.requires_stop_price()
    }

    /// Trigger direction for conditional kinds.
    ///
    /// Stop kinds protect against adverse movement: a Buy stop triggers
    /// when the last price rises to the stop, a Sell stop when it falls.
    /// TakeProfit inverts the direction per side. Returns None for
    /// non-conditional kinds.
    pub fn trigger_direction(&self, side: Side) -> Option<TriggerDirection> {
        match self {
            OrderKind::StopMarket | OrderKind::StopLimit => Some(match side {
                Side::Buy => TriggerDirection::Above,
                Side::Sell => TriggerDirection::Below,
            }),
            OrderKind::TakeProfit => Some(match side {
                Side::Buy => TriggerDirection::Below,
                Side::Sell => TriggerDirection::Above,
            }),
            _ => None,
        }
    }

    /// The kind a conditional order executes as once triggered.
    pub fn execution_kind(&self) -> Option<OrderKind> {
        match self {
            OrderKind::StopMarket => Some(OrderKind::Market),
            OrderKind::StopLimit | OrderKind::TakeProfit => Some(OrderKind::Limit),
            _ => None,
        }
    }
}

/// Which way the last-trade price must move to trigger a conditional
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerDirection {
    /// Trigger when last price >= stop price.
    Above,
    /// Trigger when last price <= stop price.
    Below,
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Accepted and awaiting (or undergoing) matching.
    Accepted,
    /// Partially filled; residual live on the book.
    Partial,
    /// Completely filled (terminal).
    Filled,
    /// Cancelled: IOC/FOK residual or explicit cancel (terminal).
    Cancelled,
    /// Failed validation (terminal).
    Rejected,
    /// Conditional order armed with the stop monitor.
    Armed,
    /// Conditional order whose trigger fired; now matching as its
    /// execution kind.
    Triggered,
}

impl OrderStatus {
    /// Check if the status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// A validated order inside the engine.
///
/// `limit_price` and `stop_price` presence is guaranteed to match the
/// kind by boundary validation. `accepted_seq` is the per-symbol
/// monotonic acceptance sequence; FIFO within a price level is FIFO on
/// this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    pub limit_price: Option<Price>,
    pub stop_price: Option<Price>,
    pub quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub accepted_seq: u64,
    pub status: OrderStatus,
}

impl Order {
    /// Create a newly accepted order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        side: Side,
        kind: OrderKind,
        limit_price: Option<Price>,
        stop_price: Option<Price>,
        quantity: Quantity,
        accepted_seq: u64,
    ) -> Self {
        let status = if kind.is_conditional() {
            OrderStatus::Armed
        } else {
            OrderStatus::Accepted
        };
        Self {
            order_id: OrderId::new(),
            symbol,
            side,
            kind,
            limit_price,
            stop_price,
            quantity,
            remaining_quantity: quantity,
            accepted_seq,
            status,
        }
    }

    /// Quantity filled so far.
    pub fn filled_quantity(&self) -> Quantity {
        self.quantity.saturating_sub(self.remaining_quantity)
    }

    /// Check the quantity invariant: 0 <= remaining <= original.
    pub fn check_invariant(&self) -> bool {
        self.remaining_quantity.as_decimal() >= rust_decimal::Decimal::ZERO
            && self.remaining_quantity <= self.quantity
    }

    /// Check if the order is completely filled.
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    /// Apply a fill, decrementing the remaining quantity and advancing
    /// the status.
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity.
    pub fn apply_fill(&mut self, fill: Quantity) {
        assert!(
            fill <= self.remaining_quantity,
            "Fill would exceed remaining quantity"
        );
        self.remaining_quantity = self.remaining_quantity - fill;

        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else {
            self.status = OrderStatus::Partial;
        }
        debug_assert!(self.check_invariant());
    }

    /// Cancel the order, zeroing any residual quantity.
    ///
    /// # Panics
    /// Panics if the order is already terminal.
    pub fn cancel(&mut self) {
        assert!(!self.status.is_terminal(), "Cannot cancel terminal order");
        self.remaining_quantity = Quantity::zero();
        self.status = OrderStatus::Cancelled;
    }

    /// Trigger direction for this order, if conditional.
    pub fn trigger_direction(&self) -> Option<TriggerDirection> {
        self.kind.trigger_direction(self.side)
    }
}
