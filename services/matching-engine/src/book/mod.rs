//! Two-sided price-time-priority order book for one symbol
//!
//! The book exclusively owns its resting orders. Sweeps walk opposite
//! levels best-first and FIFO within a level; fills always execute at
//! the resting maker's price, and a sweep can never skip a better
//! opposite level for a worse one.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use crate::matching::crossing;
pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::PriceLevel;

/// Book-level failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    /// Resting the order would cross the opposite best; the caller
    /// must match first.
    #[error("Resting order would cross the book")]
    WouldCross,

    /// The order is not resting on this book.
    #[error("Order not found")]
    NotFound,

    /// The order carries no limit price and cannot rest.
    #[error("Order has no limit price")]
    MissingLimitPrice,
}

/// One match between the taker and a resting maker.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub maker_order_id: OrderId,
    /// Execution price (the maker's resting price).
    pub price: Price,
    pub quantity: Quantity,
    /// Maker's remaining quantity after this fill.
    pub maker_remaining: Quantity,
}

/// Resting order counts per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookCounts {
    pub total: usize,
    pub bids: usize,
    pub asks: usize,
}

/// Two-sided book for a single symbol.
#[derive(Debug)]
pub struct SymbolBook {
    symbol: Symbol,
    bids: BidBook,
    asks: AskBook,
    /// Resting order locator for O(1) cancel lookup.
    index: HashMap<OrderId, (Side, Price)>,
}

impl SymbolBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BidBook::new(),
            asks: AskBook::new(),
            index: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Rest a limit order at its limit price.
    ///
    /// Precondition: the order must not cross the opposite best; a
    /// marketable order belongs in `match_taker` first.
    pub fn add_resting(&mut self, order: Order) -> Result<(), BookError> {
        let price = order.limit_price.ok_or(BookError::MissingLimitPrice)?;

        match order.side {
            Side::Buy => {
                if self
                    .asks
                    .best_price()
                    .is_some_and(|ask| crossing::crosses(price, ask))
                {
                    return Err(BookError::WouldCross);
                }
            }
            Side::Sell => {
                if self
                    .bids
                    .best_price()
                    .is_some_and(|bid| crossing::crosses(bid, price))
                {
                    return Err(BookError::WouldCross);
                }
            }
        }

        self.index.insert(order.order_id, (order.side, price));
        match order.side {
            Side::Buy => self.bids.insert(price, order),
            Side::Sell => self.asks.insert(price, order),
        }
        debug_assert!(self.not_crossed());
        Ok(())
    }

    /// Sweep the opposite side for a taker.
    ///
    /// `bound` is the taker's limit price; None means unbounded
    /// (market). The taker's remaining quantity is decremented in
    /// place; consumed makers and emptied levels are removed eagerly.
    pub fn match_taker(&mut self, taker: &mut Order, bound: Option<Price>) -> Vec<Fill> {
        let fills = match taker.side {
            Side::Buy => Self::sweep_asks(&mut self.asks, &mut self.index, taker, bound),
            Side::Sell => Self::sweep_bids(&mut self.bids, &mut self.index, taker, bound),
        };
        debug_assert!(self.not_crossed());
        fills
    }

    fn sweep_asks(
        asks: &mut AskBook,
        index: &mut HashMap<OrderId, (Side, Price)>,
        taker: &mut Order,
        bound: Option<Price>,
    ) -> Vec<Fill> {
        let mut fills = Vec::new();

        while !taker.is_filled() {
            let Some((level_price, level)) = asks.best_level_mut() else {
                break;
            };
            if !crossing::marketable(Side::Buy, bound, level_price) {
                break;
            }

            while !taker.is_filled() {
                let Some(front) = level.front() else {
                    break;
                };
                let maker_id = front.order_id;
                let maker_before = front.remaining_quantity;

                let quantity = taker.remaining_quantity.min(maker_before);
                let completed = level.fill_front(quantity);
                taker.apply_fill(quantity);
                if completed.is_some() {
                    index.remove(&maker_id);
                }

                fills.push(Fill {
                    maker_order_id: maker_id,
                    price: level_price,
                    quantity,
                    maker_remaining: maker_before - quantity,
                });
            }

            let emptied = level.is_empty();
            if emptied {
                asks.prune_level(level_price);
            }
        }

        fills
    }

    fn sweep_bids(
        bids: &mut BidBook,
        index: &mut HashMap<OrderId, (Side, Price)>,
        taker: &mut Order,
        bound: Option<Price>,
    ) -> Vec<Fill> {
        let mut fills = Vec::new();

        while !taker.is_filled() {
            let Some((level_price, level)) = bids.best_level_mut() else {
                break;
            };
            if !crossing::marketable(Side::Sell, bound, level_price) {
                break;
            }

            while !taker.is_filled() {
                let Some(front) = level.front() else {
                    break;
                };
                let maker_id = front.order_id;
                let maker_before = front.remaining_quantity;

                let quantity = taker.remaining_quantity.min(maker_before);
                let completed = level.fill_front(quantity);
                taker.apply_fill(quantity);
                if completed.is_some() {
                    index.remove(&maker_id);
                }

                fills.push(Fill {
                    maker_order_id: maker_id,
                    price: level_price,
                    quantity,
                    maker_remaining: maker_before - quantity,
                });
            }

            let emptied = level.is_empty();
            if emptied {
                bids.prune_level(level_price);
            }
        }

        fills
    }

    /// Whether a taker could be filled for at least `required` against
    /// levels satisfying its bound. Used by the FOK pre-check; mutates
    /// nothing.
    pub fn can_fill(&self, taker_side: Side, bound: Option<Price>, required: Quantity) -> bool {
        let mut available = Decimal::ZERO;
        let needed = required.as_decimal();

        match taker_side {
            Side::Buy => {
                for (price, level) in self.asks.iter_levels() {
                    if !crossing::marketable(Side::Buy, bound, *price) {
                        break;
                    }
                    available += level.total_quantity().as_decimal();
                    if available >= needed {
                        return true;
                    }
                }
            }
            Side::Sell => {
                for (price, level) in self.bids.iter_levels() {
                    if !crossing::marketable(Side::Sell, bound, *price) {
                        break;
                    }
                    available += level.total_quantity().as_decimal();
                    if available >= needed {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Whether the opposite side of a taker is empty.
    pub fn opposite_empty(&self, taker_side: Side) -> bool {
        match taker_side {
            Side::Buy => self.asks.is_empty(),
            Side::Sell => self.bids.is_empty(),
        }
    }

    /// Remove a resting order by id.
    pub fn cancel(&mut self, order_id: &OrderId) -> Result<Order, BookError> {
        let (side, price) = self.index.remove(order_id).ok_or(BookError::NotFound)?;
        let order = match side {
            Side::Buy => self.bids.remove(order_id, price),
            Side::Sell => self.asks.remove(order_id, price),
        };
        // The index and the levels move together; a located order is
        // always present on its side.
        order.ok_or(BookError::NotFound)
    }

    /// Look up a resting order.
    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        let (side, price) = self.index.get(order_id)?;
        match side {
            Side::Buy => self.bids.get(order_id, *price),
            Side::Sell => self.asks.get(order_id, *price),
        }
    }

    /// Best bid and ask with aggregate quantities.
    pub fn bbo(&self) -> (Option<(Price, Quantity)>, Option<(Price, Quantity)>) {
        (self.bids.best(), self.asks.best())
    }

    /// Top-N depth per side, best first.
    pub fn depth(&self, levels: usize) -> (Vec<(Price, Quantity)>, Vec<(Price, Quantity)>) {
        (self.bids.depth(levels), self.asks.depth(levels))
    }

    /// Aggregate quantity at a level (zero if absent).
    pub fn level_quantity(&self, side: Side, price: Price) -> Quantity {
        match side {
            Side::Buy => self.bids.level_quantity(price),
            Side::Sell => self.asks.level_quantity(price),
        }
    }

    /// Resting order counts.
    pub fn order_counts(&self) -> BookCounts {
        let bids = self.bids.order_count();
        let asks = self.asks.order_count();
        BookCounts {
            total: bids + asks,
            bids,
            asks,
        }
    }

    /// All resting orders, bids best-first then asks best-first, FIFO
    /// within each level. Used by snapshot export.
    pub fn resting_orders(&self) -> Vec<Order> {
        let mut orders = Vec::with_capacity(self.index.len());
        for (_, level) in self.bids.iter_levels() {
            orders.extend(level.iter().cloned());
        }
        for (_, level) in self.asks.iter_levels() {
            orders.extend(level.iter().cloned());
        }
        orders
    }

    /// No-cross invariant: best bid strictly below best ask.
    fn not_crossed(&self) -> bool {
        match (self.bids.best_price(), self.asks.best_price()) {
            (Some(bid), Some(ask)) => bid < ask,
            _ => true,
        }
    }
}
