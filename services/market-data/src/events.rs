//! Market event definitions
//!
//! Events are immutable values handed to the bus: executed trades,
//! depth snapshots, and top-of-book updates, each on a per-symbol
//! topic. Within one topic delivery order is publication order; depth
//! snapshots are coalescable (only the newest matters to a consumer
//! that fell behind).

use serde::{Deserialize, Serialize};
use types::ids::Symbol;
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

/// Kind of a per-symbol topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicKind {
    Trades,
    Depth,
    Bbo,
}

/// A per-symbol subscription topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    pub symbol: Symbol,
    pub kind: TopicKind,
}

impl Topic {
    pub fn trades(symbol: Symbol) -> Self {
        Self {
            symbol,
            kind: TopicKind::Trades,
        }
    }

    pub fn depth(symbol: Symbol) -> Self {
        Self {
            symbol,
            kind: TopicKind::Depth,
        }
    }

    pub fn bbo(symbol: Symbol) -> Self {
        Self {
            symbol,
            kind: TopicKind::Bbo,
        }
    }
}

/// One side of the top of book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Price,
    pub quantity: Quantity,
}

/// Best bid and offer for a symbol; either side may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BboUpdate {
    pub symbol: Symbol,
    pub bid: Option<Quote>,
    pub ask: Option<Quote>,
    /// Unix nanoseconds.
    pub timestamp: i64,
}

/// Aggregate quantity at one price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// Top-N levels per side, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub symbol: Symbol,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    /// Unix nanoseconds.
    pub timestamp: i64,
}

/// A single price-level change, as returned to submitters.
///
/// `new_aggregate_quantity` of zero means the level was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDelta {
    pub symbol: Symbol,
    pub side: Side,
    pub price: Price,
    pub new_aggregate_quantity: Quantity,
}

impl BookDelta {
    /// Whether this delta removes the level entirely.
    pub fn is_removal(&self) -> bool {
        self.new_aggregate_quantity.is_zero()
    }
}

/// An event delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MarketEvent {
    Trade(Trade),
    Depth(DepthSnapshot),
    Bbo(BboUpdate),
    /// The subscriber fell behind and `missed` events were dropped
    /// (oldest first). Informational, not fatal.
    Lagged { missed: u64 },
}

impl MarketEvent {
    /// Symbol of the event, if any.
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            MarketEvent::Trade(t) => Some(&t.symbol),
            MarketEvent::Depth(d) => Some(&d.symbol),
            MarketEvent::Bbo(b) => Some(&b.symbol),
            MarketEvent::Lagged { .. } => None,
        }
    }

    /// Event type label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            MarketEvent::Trade(_) => "Trade",
            MarketEvent::Depth(_) => "Depth",
            MarketEvent::Bbo(_) => "Bbo",
            MarketEvent::Lagged { .. } => "Lagged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_constructors() {
        let topic = Topic::trades(Symbol::new("BTC-USDT"));
        assert_eq!(topic.kind, TopicKind::Trades);
        assert_eq!(topic.symbol.as_str(), "BTC-USDT");
    }

    #[test]
    fn test_delta_removal() {
        let delta = BookDelta {
            symbol: Symbol::new("BTC-USDT"),
            side: Side::Buy,
            price: Price::from_u64(100),
            new_aggregate_quantity: Quantity::zero(),
        };
        assert!(delta.is_removal());
    }

    #[test]
    fn test_event_symbol_and_label() {
        let event = MarketEvent::Bbo(BboUpdate {
            symbol: Symbol::new("ETH-USDC"),
            bid: None,
            ask: Some(Quote {
                price: Price::from_u64(3000),
                quantity: Quantity::from_str("2.0").unwrap(),
            }),
            timestamp: 1708123456789000000,
        });
        assert_eq!(event.symbol().unwrap().as_str(), "ETH-USDC");
        assert_eq!(event.label(), "Bbo");

        let lagged = MarketEvent::Lagged { missed: 3 };
        assert!(lagged.symbol().is_none());
    }

    #[test]
    fn test_depth_snapshot_serialization() {
        let snap = DepthSnapshot {
            symbol: Symbol::new("BTC-USDT"),
            bids: vec![DepthLevel {
                price: Price::from_u64(100),
                quantity: Quantity::from_str("5").unwrap(),
            }],
            asks: vec![],
            timestamp: 1708123456789000000,
        };
        let json = serde_json::to_string(&snap).unwrap();
        let back: DepthSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }
}
