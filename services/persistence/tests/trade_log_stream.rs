//! Trade log as a bus subscriber: trades flow from the engine through
//! the `trades` topic into the JSON-lines file in execution order.

use std::time::Duration;

use matching_engine::{Engine, EngineConfig, OrderRequest};
use market_data::events::Topic;
use persistence::trade_log::{read_trades, spawn_writer};
use types::ids::Symbol;
use types::market::SymbolConfig;
use types::numeric::{Price, Quantity};
use types::order::{OrderKind, Side};

fn symbol() -> Symbol {
    Symbol::new("BTC-USDT")
}

fn limit(side: Side, price: u64, qty: &str) -> OrderRequest {
    OrderRequest {
        symbol: symbol(),
        side,
        kind: OrderKind::Limit,
        quantity: Quantity::from_str(qty).unwrap(),
        limit_price: Some(Price::from_u64(price)),
        stop_price: None,
    }
}

#[tokio::test]
async fn trades_stream_into_log_in_order() {
    let engine = Engine::new(
        EngineConfig::default(),
        vec![SymbolConfig::with_cent_tick(symbol())],
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trades.jsonl");
    let writer = spawn_writer(engine.subscribe(Topic::trades(symbol())), &path);

    engine
        .submit_order(limit(Side::Sell, 100, "1"))
        .await
        .unwrap();
    engine
        .submit_order(limit(Side::Sell, 101, "1"))
        .await
        .unwrap();
    engine
        .submit_order(limit(Side::Buy, 101, "2"))
        .await
        .unwrap();

    // The writer runs on its own task; poll until both lines land
    let mut trades = Vec::new();
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if path.exists() {
            trades = read_trades(&path).unwrap();
            if trades.len() >= 2 {
                break;
            }
        }
    }
    writer.abort();

    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].price, Price::from_u64(100));
    assert_eq!(trades[1].price, Price::from_u64(101));
    assert!(trades[0].trade_id < trades[1].trade_id);
}
