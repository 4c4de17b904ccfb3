//! Matching engine core
//!
//! Price-time priority matching with strict ordering guarantees:
//! - Trades execute at the resting maker's price; a sweep never skips
//!   a better opposite level for a worse one.
//! - FIFO by acceptance sequence within a price level.
//! - FOK pre-checks before any mutation; IOC cancels its residual.
//! - Conditional orders arm with the stop monitor and re-enter the
//!   engine when the last trade price reaches their stop, cascading
//!   up to a configurable ceiling.
//!
//! Per-symbol serialization: every mutation for a symbol runs on that
//! symbol's lane task, one at a time; symbols proceed in parallel.

pub mod book;
pub mod engine;
pub mod matching;
pub mod stops;

pub use engine::{
    ArmOutcome, CancelOutcome, Engine, EngineConfig, ImportReport, OrderRequest, SubmitOutcome,
    SymbolSnapshot,
};
