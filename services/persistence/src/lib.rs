//! Persistence adapters for the matching engine
//!
//! Two collaborators around the core:
//! - JSON snapshots of per-symbol book state (resting orders plus
//!   armed stops), exported on shutdown and imported on startup with
//!   FIFO order preserved.
//! - A JSON-lines trade log fed by a `trades` topic subscription, one
//!   object per line in publication order.

pub mod snapshot;
pub mod trade_log;
