//! Fan-out behavior across subscribers: independent queues,
//! independent lag, and isolation between topics.

use market_data::bus::{BusConfig, EventBus};
use market_data::events::{MarketEvent, Topic};
use rust_decimal::Decimal;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

fn symbol() -> Symbol {
    Symbol::new("BTC-USDT")
}

fn trade_event(trade_id: u64) -> MarketEvent {
    MarketEvent::Trade(Trade::new(
        trade_id,
        symbol(),
        Price::from_u64(100),
        Quantity::from_str("1").unwrap(),
        OrderId::new(),
        OrderId::new(),
        Side::Sell,
        Decimal::ZERO,
        Decimal::ZERO,
        1708123456789000000,
    ))
}

#[tokio::test]
async fn each_subscriber_gets_every_event() {
    let bus = EventBus::default();
    let topic = Topic::trades(symbol());
    let mut first = bus.subscribe(topic.clone());
    let mut second = bus.subscribe(topic.clone());

    for id in 1..=3 {
        bus.publish(&topic, trade_event(id));
    }

    for sub in [&mut first, &mut second] {
        for expected in 1..=3u64 {
            match sub.recv().await {
                MarketEvent::Trade(trade) => assert_eq!(trade.trade_id, expected),
                other => panic!("unexpected event {:?}", other),
            }
        }
    }
}

#[tokio::test]
async fn slow_subscriber_lags_alone() {
    let bus = EventBus::new(BusConfig {
        subscriber_capacity: 2,
        coalesce_depth: true,
    });
    let topic = Topic::trades(symbol());
    let mut fast = bus.subscribe(topic.clone());
    let mut slow = bus.subscribe(topic.clone());

    bus.publish(&topic, trade_event(1));
    bus.publish(&topic, trade_event(2));

    // Fast consumer drains, slow one does not
    assert!(matches!(fast.recv().await, MarketEvent::Trade(_)));
    assert!(matches!(fast.recv().await, MarketEvent::Trade(_)));

    bus.publish(&topic, trade_event(3));
    bus.publish(&topic, trade_event(4));

    // Fast consumer is fine
    match fast.recv().await {
        MarketEvent::Trade(trade) => assert_eq!(trade.trade_id, 3),
        other => panic!("unexpected event {:?}", other),
    }

    // Slow consumer lost the two oldest and learns about it first
    match slow.recv().await {
        MarketEvent::Lagged { missed } => assert_eq!(missed, 2),
        other => panic!("expected lag notice, got {:?}", other),
    }
    match slow.recv().await {
        MarketEvent::Trade(trade) => assert_eq!(trade.trade_id, 3),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn topics_are_isolated() {
    let bus = EventBus::default();
    let btc = Topic::trades(symbol());
    let eth = Topic::trades(Symbol::new("ETH-USDC"));

    let mut btc_sub = bus.subscribe(btc.clone());
    let mut eth_sub = bus.subscribe(eth);

    bus.publish(&btc, trade_event(1));

    assert!(matches!(btc_sub.try_recv(), Some(MarketEvent::Trade(_))));
    assert!(eth_sub.try_recv().is_none());
}
