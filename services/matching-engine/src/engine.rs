//! Matching engine and symbol lanes
//!
//! The engine is an explicit value: it owns one spawned task per
//! listed symbol (the "lane") plus the event bus handle. All mutations
//! for a symbol — submits, cancels, stop activations — flow through
//! that symbol's lane queue one at a time, so the book itself needs no
//! locking; different symbols proceed in parallel.
//!
//! Validation happens here at the boundary, before a request enters a
//! lane; a rejected request never mutates state. Once enqueued, a
//! submit always runs to completion.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use market_data::bus::{EventBus, Subscription};
use market_data::events::{
    BboUpdate, BookDelta, DepthLevel, DepthSnapshot, MarketEvent, Quote, Topic,
};
use market_data::trades::TradeTape;
use types::errors::CoreError;
use types::ids::{OrderId, Symbol};
use types::market::SymbolConfig;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, Side};
use types::trade::Trade;

use crate::book::{BookCounts, SymbolBook};
use crate::matching::TradeFactory;
use crate::stops::{self, StopBook};

/// Engine-wide configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum stop-activation waves per submit before the cascade
    /// stops and remaining stops stay armed.
    pub max_cascade_depth: usize,
    /// Recent trades retained per symbol.
    pub trade_tape_capacity: usize,
    /// Levels per side in published depth snapshots.
    pub depth_levels: usize,
    /// Lane command queue depth.
    pub lane_queue_depth: usize,
    pub bus: market_data::bus::BusConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cascade_depth: 64,
            trade_tape_capacity: 1000,
            depth_levels: 10,
            lane_queue_depth: 256,
            bus: market_data::bus::BusConfig::default(),
        }
    }
}

/// A submission as handed in by the transport layer, already
/// deserialized but not yet validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Price>,
}

/// Result of an accepted immediate-kind submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// The taker order in its final state.
    pub order: Order,
    /// Trades produced by this taker (cascade trades are published on
    /// the bus but belong to the triggered orders, not this outcome).
    pub trades: Vec<Trade>,
    /// Price levels this submission changed.
    pub deltas: Vec<BookDelta>,
    /// `CoreError::CascadeOverflow` when the stop cascade hit its
    /// depth ceiling. The taker's own trades stand either way;
    /// un-activated stops stay armed.
    pub cascade_overflow: Option<CoreError>,
}

/// Result of arming a conditional order.
#[derive(Debug, Clone)]
pub struct ArmOutcome {
    pub order_id: OrderId,
}

/// Result of a cancel.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    /// The cancelled order (book or armed stop).
    pub order: Order,
    /// Level change if the order was resting on the book.
    pub delta: Option<BookDelta>,
}

/// Per-symbol state exported on shutdown and restored on startup.
///
/// `accepted_seq` values round-trip so FIFO order within each level is
/// preserved bit-identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    pub symbol: Symbol,
    pub next_seq: u64,
    pub last_price: Option<Price>,
    pub resting: Vec<Order>,
    pub armed: Vec<Order>,
}

/// Outcome of a snapshot import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub symbols_imported: usize,
    pub orders_restored: usize,
    pub stops_restored: usize,
    /// Snapshots skipped because their symbol is not listed.
    pub skipped: Vec<Symbol>,
}

enum LaneCommand {
    Submit {
        request: OrderRequest,
        reply: oneshot::Sender<Result<SubmitOutcome, CoreError>>,
    },
    Arm {
        request: OrderRequest,
        reply: oneshot::Sender<Result<ArmOutcome, CoreError>>,
    },
    Cancel {
        order_id: OrderId,
        reply: oneshot::Sender<Result<CancelOutcome, CoreError>>,
    },
    Depth {
        levels: usize,
        reply: oneshot::Sender<DepthSnapshot>,
    },
    Bbo {
        reply: oneshot::Sender<BboUpdate>,
    },
    RecentTrades {
        limit: usize,
        reply: oneshot::Sender<Vec<Trade>>,
    },
    GetOrder {
        order_id: OrderId,
        reply: oneshot::Sender<Option<Order>>,
    },
    Counts {
        reply: oneshot::Sender<BookCounts>,
    },
    Export {
        reply: oneshot::Sender<SymbolSnapshot>,
    },
    Import {
        snapshot: SymbolSnapshot,
        reply: oneshot::Sender<(usize, usize)>,
    },
}

struct LaneHandle {
    tx: mpsc::Sender<LaneCommand>,
}

/// The matching engine.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
/// Must be created inside a tokio runtime — construction spawns one
/// task per listed symbol.
pub struct Engine {
    lanes: DashMap<Symbol, LaneHandle>,
    configs: HashMap<Symbol, SymbolConfig>,
    bus: EventBus,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine serving the given symbols.
    pub fn new(config: EngineConfig, symbols: Vec<SymbolConfig>) -> Self {
        let bus = EventBus::new(config.bus.clone());
        let trade_ids = Arc::new(AtomicU64::new(1));
        let lanes = DashMap::new();
        let mut configs = HashMap::new();

        for symbol_config in symbols {
            let symbol = symbol_config.symbol.clone();
            let (tx, rx) = mpsc::channel(config.lane_queue_depth);
            let lane = SymbolLane::new(
                symbol_config.clone(),
                &config,
                bus.clone(),
                Arc::clone(&trade_ids),
            );
            tokio::spawn(lane.run(rx));
            info!(symbol = %symbol, "symbol lane started");

            lanes.insert(symbol.clone(), LaneHandle { tx });
            configs.insert(symbol, symbol_config);
        }

        Self {
            lanes,
            configs,
            bus,
            config,
        }
    }

    /// The event bus handle.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe to a topic; dropping the subscription unsubscribes.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        self.bus.subscribe(topic)
    }

    /// Listed symbols in deterministic order.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.configs.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Submit an immediate order (market, limit, IOC, FOK).
    pub async fn submit_order(&self, request: OrderRequest) -> Result<SubmitOutcome, CoreError> {
        let config = self.symbol_config(&request.symbol)?;
        validate_request(&request, config, false)?;
        let symbol = request.symbol.clone();
        let (tx, rx) = oneshot::channel();
        self.send(&symbol, LaneCommand::Submit { request, reply: tx })
            .await?;
        recv_reply(rx).await?
    }

    /// Submit a conditional order (stop-market, stop-limit,
    /// take-profit); it arms with the stop monitor.
    pub async fn submit_stop_order(&self, request: OrderRequest) -> Result<ArmOutcome, CoreError> {
        let config = self.symbol_config(&request.symbol)?;
        validate_request(&request, config, true)?;
        let symbol = request.symbol.clone();
        let (tx, rx) = oneshot::channel();
        self.send(&symbol, LaneCommand::Arm { request, reply: tx })
            .await?;
        recv_reply(rx).await?
    }

    /// Cancel a resting order or an armed stop.
    pub async fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<CancelOutcome, CoreError> {
        self.symbol_config(symbol)?;
        let (tx, rx) = oneshot::channel();
        self.send(symbol, LaneCommand::Cancel { order_id, reply: tx })
            .await?;
        recv_reply(rx).await?
    }

    /// Top-N depth per side.
    pub async fn get_depth(
        &self,
        symbol: &Symbol,
        levels: usize,
    ) -> Result<DepthSnapshot, CoreError> {
        self.symbol_config(symbol)?;
        let (tx, rx) = oneshot::channel();
        self.send(symbol, LaneCommand::Depth { levels, reply: tx })
            .await?;
        recv_reply(rx).await
    }

    /// Best bid and offer.
    pub async fn get_bbo(&self, symbol: &Symbol) -> Result<BboUpdate, CoreError> {
        self.symbol_config(symbol)?;
        let (tx, rx) = oneshot::channel();
        self.send(symbol, LaneCommand::Bbo { reply: tx }).await?;
        recv_reply(rx).await
    }

    /// Most recent trades, newest first.
    pub async fn get_recent_trades(
        &self,
        symbol: &Symbol,
        limit: usize,
    ) -> Result<Vec<Trade>, CoreError> {
        self.symbol_config(symbol)?;
        let (tx, rx) = oneshot::channel();
        self.send(symbol, LaneCommand::RecentTrades { limit, reply: tx })
            .await?;
        recv_reply(rx).await
    }

    /// Look up a live order (resting or armed).
    pub async fn get_order(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<Option<Order>, CoreError> {
        self.symbol_config(symbol)?;
        let (tx, rx) = oneshot::channel();
        self.send(symbol, LaneCommand::GetOrder { order_id, reply: tx })
            .await?;
        recv_reply(rx).await
    }

    /// Resting order counts.
    pub async fn order_counts(&self, symbol: &Symbol) -> Result<BookCounts, CoreError> {
        self.symbol_config(symbol)?;
        let (tx, rx) = oneshot::channel();
        self.send(symbol, LaneCommand::Counts { reply: tx }).await?;
        recv_reply(rx).await
    }

    /// Export every lane's resting orders and armed stops.
    pub async fn export_snapshot(&self) -> Result<Vec<SymbolSnapshot>, CoreError> {
        let mut snapshots = Vec::with_capacity(self.configs.len());
        for symbol in self.symbols() {
            let (tx, rx) = oneshot::channel();
            self.send(&symbol, LaneCommand::Export { reply: tx }).await?;
            snapshots.push(recv_reply(rx).await?);
        }
        Ok(snapshots)
    }

    /// Import snapshots, restoring FIFO order via `accepted_seq`.
    /// Snapshots for unlisted symbols are skipped and reported.
    pub async fn import_snapshot(
        &self,
        snapshots: Vec<SymbolSnapshot>,
    ) -> Result<ImportReport, CoreError> {
        let mut report = ImportReport::default();
        for snapshot in snapshots {
            if !self.configs.contains_key(&snapshot.symbol) {
                warn!(symbol = %snapshot.symbol, "skipping snapshot for unlisted symbol");
                report.skipped.push(snapshot.symbol);
                continue;
            }
            let symbol = snapshot.symbol.clone();
            let (tx, rx) = oneshot::channel();
            self.send(&symbol, LaneCommand::Import { snapshot, reply: tx })
                .await?;
            let (orders, stops) = recv_reply(rx).await?;
            report.symbols_imported += 1;
            report.orders_restored += orders;
            report.stops_restored += stops;
        }
        Ok(report)
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn symbol_config(&self, symbol: &Symbol) -> Result<&SymbolConfig, CoreError> {
        self.configs.get(symbol).ok_or_else(|| CoreError::UnknownSymbol {
            symbol: symbol.to_string(),
        })
    }

    async fn send(&self, symbol: &Symbol, command: LaneCommand) -> Result<(), CoreError> {
        let tx = {
            let lane = self.lanes.get(symbol).ok_or_else(|| CoreError::UnknownSymbol {
                symbol: symbol.to_string(),
            })?;
            lane.tx.clone()
        };
        tx.send(command)
            .await
            .map_err(|_| CoreError::invalid("symbol lane has shut down"))
    }
}

async fn recv_reply<T>(rx: oneshot::Receiver<T>) -> Result<T, CoreError> {
    rx.await
        .map_err(|_| CoreError::invalid("symbol lane has shut down"))
}

/// Boundary validation: field combinations, tick grid, scales.
///
/// `conditional_entry` selects which entry point the request came in
/// through; each accepts only its own kind class.
fn validate_request(
    request: &OrderRequest,
    config: &SymbolConfig,
    conditional_entry: bool,
) -> Result<(), CoreError> {
    if request.quantity.is_zero() {
        return Err(CoreError::invalid("quantity must be positive"));
    }
    if !config.quantity_in_scale(request.quantity) {
        return Err(CoreError::invalid(format!(
            "quantity exceeds symbol scale of {}",
            config.quantity_scale
        )));
    }

    if request.kind.is_conditional() != conditional_entry {
        return Err(if conditional_entry {
            CoreError::invalid("kind is not conditional; use submit_order")
        } else {
            CoreError::invalid("conditional kinds must go through submit_stop_order")
        });
    }

    if request.kind.requires_limit_price() {
        match request.limit_price {
            None => {
                return Err(CoreError::invalid(format!(
                    "limit_price required for {:?} orders",
                    request.kind
                )))
            }
            Some(price) if !config.price_on_grid(price) => {
                return Err(CoreError::invalid(format!(
                    "limit_price {} off the {} tick grid",
                    price, config.tick_size
                )))
            }
            _ => {}
        }
    } else if request.limit_price.is_some() {
        return Err(CoreError::invalid(format!(
            "limit_price not accepted for {:?} orders",
            request.kind
        )));
    }

    if request.kind.requires_stop_price() {
        match request.stop_price {
            None => {
                return Err(CoreError::invalid(format!(
                    "stop_price required for {:?} orders",
                    request.kind
                )))
            }
            Some(price) if !config.price_on_grid(price) => {
                return Err(CoreError::invalid(format!(
                    "stop_price {} off the {} tick grid",
                    price, config.tick_size
                )))
            }
            _ => {}
        }
    } else if request.stop_price.is_some() {
        return Err(CoreError::invalid(format!(
            "stop_price not accepted for {:?} orders",
            request.kind
        )));
    }

    Ok(())
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

struct ExecOutcome {
    order: Order,
    trades: Vec<Trade>,
    deltas: Vec<BookDelta>,
}

/// Single-symbol execution domain. Owns the book, the stop monitor,
/// the trade tape, and the last-trade price; processes one command at
/// a time.
struct SymbolLane {
    symbol: Symbol,
    book: SymbolBook,
    stops: StopBook,
    tape: TradeTape,
    factory: TradeFactory,
    bus: EventBus,
    last_price: Option<Price>,
    next_seq: u64,
    max_cascade_depth: usize,
    depth_levels: usize,
}

impl SymbolLane {
    fn new(
        config: SymbolConfig,
        engine_config: &EngineConfig,
        bus: EventBus,
        trade_ids: Arc<AtomicU64>,
    ) -> Self {
        let symbol = config.symbol.clone();
        Self {
            book: SymbolBook::new(symbol.clone()),
            stops: StopBook::new(symbol.clone()),
            tape: TradeTape::new(symbol.clone(), engine_config.trade_tape_capacity),
            factory: TradeFactory::new(trade_ids, config.fees, config.fee_scale),
            bus,
            last_price: None,
            next_seq: 1,
            max_cascade_depth: engine_config.max_cascade_depth,
            depth_levels: engine_config.depth_levels,
            symbol,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<LaneCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                LaneCommand::Submit { request, reply } => {
                    let result = self.handle_submit(request).await;
                    let _ = reply.send(result);
                }
                LaneCommand::Arm { request, reply } => {
                    let result = self.handle_arm(request);
                    let _ = reply.send(result);
                }
                LaneCommand::Cancel { order_id, reply } => {
                    let result = self.handle_cancel(order_id);
                    let _ = reply.send(result);
                }
                LaneCommand::Depth { levels, reply } => {
                    let _ = reply.send(self.depth_snapshot(levels));
                }
                LaneCommand::Bbo { reply } => {
                    let _ = reply.send(self.bbo_update());
                }
                LaneCommand::RecentTrades { limit, reply } => {
                    let _ = reply.send(self.tape.recent(limit));
                }
                LaneCommand::GetOrder { order_id, reply } => {
                    let order = self
                        .book
                        .order(&order_id)
                        .or_else(|| self.stops.get(&order_id))
                        .cloned();
                    let _ = reply.send(order);
                }
                LaneCommand::Counts { reply } => {
                    let _ = reply.send(self.book.order_counts());
                }
                LaneCommand::Export { reply } => {
                    let _ = reply.send(self.export());
                }
                LaneCommand::Import { snapshot, reply } => {
                    let _ = reply.send(self.import(snapshot));
                }
            }
        }
        debug!(symbol = %self.symbol, "symbol lane stopped");
    }

    async fn handle_submit(&mut self, request: OrderRequest) -> Result<SubmitOutcome, CoreError> {
        // Pre-checks reject before any state is touched
        match request.kind {
            OrderKind::Market => {
                if self.book.opposite_empty(request.side) {
                    return Err(CoreError::InsufficientLiquidity);
                }
            }
            OrderKind::Fok => {
                if !self
                    .book
                    .can_fill(request.side, request.limit_price, request.quantity)
                {
                    return Err(CoreError::InsufficientLiquidity);
                }
            }
            _ => {}
        }

        let order = self.accept(&request);
        let prev_last = self.last_price;
        let outcome = self.execute(order);

        let cascade_overflow = if outcome.trades.is_empty() {
            None
        } else {
            self.run_cascade(prev_last).await
        };

        Ok(SubmitOutcome {
            order: outcome.order,
            trades: outcome.trades,
            deltas: outcome.deltas,
            cascade_overflow,
        })
    }

    fn handle_arm(&mut self, request: OrderRequest) -> Result<ArmOutcome, CoreError> {
        let order = self.accept(&request);
        let order_id = order.order_id;
        self.stops.arm(order);
        Ok(ArmOutcome { order_id })
    }

    fn handle_cancel(&mut self, order_id: OrderId) -> Result<CancelOutcome, CoreError> {
        let bbo_before = self.book.bbo();
        match self.book.cancel(&order_id) {
            Ok(mut order) => {
                let delta = order.limit_price.map(|price| BookDelta {
                    symbol: self.symbol.clone(),
                    side: order.side,
                    price,
                    new_aggregate_quantity: self.book.level_quantity(order.side, price),
                });
                order.cancel();

                self.publish_depth();
                if bbo_before != self.book.bbo() {
                    self.publish_bbo();
                }
                Ok(CancelOutcome { order, delta })
            }
            Err(_) => match self.stops.cancel(&order_id) {
                Some(mut order) => {
                    order.cancel();
                    Ok(CancelOutcome { order, delta: None })
                }
                None => Err(CoreError::NotFound {
                    order_id: order_id.to_string(),
                }),
            },
        }
    }

    /// Build an accepted order, consuming the next acceptance sequence.
    fn accept(&mut self, request: &OrderRequest) -> Order {
        let seq = self.next_seq;
        self.next_seq += 1;
        Order::new(
            request.symbol.clone(),
            request.side,
            request.kind,
            request.limit_price,
            request.stop_price,
            request.quantity,
            seq,
        )
    }

    /// Match one immediate order against the book, apply its residual
    /// policy, and publish the resulting events.
    fn execute(&mut self, mut order: Order) -> ExecOutcome {
        let bbo_before = self.book.bbo();
        let bound = match order.kind {
            OrderKind::Market => None,
            _ => order.limit_price,
        };

        let fills = self.book.match_taker(&mut order, bound);

        let mut rested = false;
        match order.kind {
            OrderKind::Market | OrderKind::Ioc => {
                if !order.is_filled() {
                    order.cancel();
                }
            }
            OrderKind::Limit => {
                if !order.is_filled() {
                    match self.book.add_resting(order.clone()) {
                        Ok(()) => rested = true,
                        Err(err) => {
                            // The sweep consumed everything marketable,
                            // so the residual cannot cross
                            warn!(symbol = %self.symbol, %err, "failed to rest limit residual");
                        }
                    }
                }
            }
            OrderKind::Fok => {
                debug_assert!(order.is_filled(), "FOK passed pre-check but did not fill");
            }
            OrderKind::StopMarket | OrderKind::StopLimit | OrderKind::TakeProfit => {
                unreachable!("conditional kinds are armed, never executed directly")
            }
        }

        let timestamp = now_nanos();
        let maker_side = order.side.opposite();
        let mut trades = Vec::with_capacity(fills.len());
        let mut deltas: Vec<BookDelta> = Vec::new();

        for fill in &fills {
            let trade = self.factory.trade_for_fill(&self.symbol, &order, fill, timestamp);
            self.tape.record(trade.clone());
            self.bus.publish(
                &Topic::trades(self.symbol.clone()),
                MarketEvent::Trade(trade.clone()),
            );
            trades.push(trade);

            if !deltas
                .iter()
                .any(|d| d.side == maker_side && d.price == fill.price)
            {
                deltas.push(BookDelta {
                    symbol: self.symbol.clone(),
                    side: maker_side,
                    price: fill.price,
                    new_aggregate_quantity: self.book.level_quantity(maker_side, fill.price),
                });
            }
        }

        if rested {
            if let Some(price) = order.limit_price {
                deltas.push(BookDelta {
                    symbol: self.symbol.clone(),
                    side: order.side,
                    price,
                    new_aggregate_quantity: self.book.level_quantity(order.side, price),
                });
            }
        }

        if let Some(last_trade) = trades.last() {
            self.last_price = Some(last_trade.price);
        }

        if !fills.is_empty() || rested {
            self.publish_depth();
            if bbo_before != self.book.bbo() {
                self.publish_bbo();
            }
        }

        ExecOutcome {
            order,
            trades,
            deltas,
        }
    }

    /// Activate triggered stops until a fixed point, yielding between
    /// waves. Returns `CoreError::CascadeOverflow` if the depth
    /// ceiling cut the cascade short; the ceiling is checked before
    /// popping, so un-activated stops stay armed.
    async fn run_cascade(&mut self, mut prev: Option<Price>) -> Option<CoreError> {
        let mut waves = 0usize;

        loop {
            let Some(last) = self.last_price else {
                return None;
            };
            if !self.stops.would_trigger(last) {
                return None;
            }
            if waves >= self.max_cascade_depth {
                warn!(
                    symbol = %self.symbol,
                    depth = waves,
                    armed = self.stops.len(),
                    "stop cascade hit depth ceiling; remaining stops stay armed"
                );
                return Some(CoreError::CascadeOverflow { depth: waves });
            }
            waves += 1;

            let triggered = self.stops.on_price(last, prev);
            prev = Some(last);

            for armed in triggered {
                let order = stops::promote(armed);
                if order.kind == OrderKind::Market && self.book.opposite_empty(order.side) {
                    let mut order = order;
                    order.cancel();
                    warn!(
                        symbol = %self.symbol,
                        order_id = %order.order_id,
                        "triggered market order cancelled: no opposite liquidity"
                    );
                    continue;
                }
                let outcome = self.execute(order);
                debug!(
                    symbol = %self.symbol,
                    order_id = %outcome.order.order_id,
                    trades = outcome.trades.len(),
                    "triggered stop executed"
                );
            }

            tokio::task::yield_now().await;
        }
    }

    fn depth_snapshot(&self, levels: usize) -> DepthSnapshot {
        let (bids, asks) = self.book.depth(levels);
        DepthSnapshot {
            symbol: self.symbol.clone(),
            bids: bids
                .into_iter()
                .map(|(price, quantity)| DepthLevel { price, quantity })
                .collect(),
            asks: asks
                .into_iter()
                .map(|(price, quantity)| DepthLevel { price, quantity })
                .collect(),
            timestamp: now_nanos(),
        }
    }

    fn bbo_update(&self) -> BboUpdate {
        let (bid, ask) = self.book.bbo();
        BboUpdate {
            symbol: self.symbol.clone(),
            bid: bid.map(|(price, quantity)| Quote { price, quantity }),
            ask: ask.map(|(price, quantity)| Quote { price, quantity }),
            timestamp: now_nanos(),
        }
    }

    fn publish_depth(&self) {
        let snapshot = self.depth_snapshot(self.depth_levels);
        self.bus.publish(
            &Topic::depth(self.symbol.clone()),
            MarketEvent::Depth(snapshot),
        );
    }

    fn publish_bbo(&self) {
        let update = self.bbo_update();
        self.bus
            .publish(&Topic::bbo(self.symbol.clone()), MarketEvent::Bbo(update));
    }

    fn export(&self) -> SymbolSnapshot {
        SymbolSnapshot {
            symbol: self.symbol.clone(),
            next_seq: self.next_seq,
            last_price: self.last_price,
            resting: self.book.resting_orders(),
            armed: self.stops.armed_orders(),
        }
    }

    /// Restore a snapshot into this lane. Orders that cannot be
    /// restored are skipped with a warning rather than poisoning the
    /// rest of the load. Returns (orders_restored, stops_restored).
    fn import(&mut self, snapshot: SymbolSnapshot) -> (usize, usize) {
        let mut max_seq = self.next_seq.max(snapshot.next_seq);
        let mut orders_restored = 0;
        let mut stops_restored = 0;

        let mut resting = snapshot.resting;
        resting.sort_by_key(|o| o.accepted_seq);
        for order in resting {
            max_seq = max_seq.max(order.accepted_seq + 1);
            match self.book.add_resting(order) {
                Ok(()) => orders_restored += 1,
                Err(err) => {
                    warn!(symbol = %self.symbol, %err, "skipping unrestorable snapshot order");
                }
            }
        }

        for order in snapshot.armed {
            if order.trigger_direction().is_none() || order.stop_price.is_none() {
                warn!(
                    symbol = %self.symbol,
                    order_id = %order.order_id,
                    "skipping armed snapshot entry without trigger data"
                );
                continue;
            }
            max_seq = max_seq.max(order.accepted_seq + 1);
            self.stops.arm(order);
            stops_restored += 1;
        }

        self.next_seq = max_seq;
        if self.last_price.is_none() {
            self.last_price = snapshot.last_price;
        }
        info!(
            symbol = %self.symbol,
            orders = orders_restored,
            stops = stops_restored,
            "snapshot imported"
        );
        (orders_restored, stops_restored)
    }
}
