//! Market data fabric
//!
//! Event definitions, the per-topic event bus with backpressure-aware
//! delivery, and the bounded recent-trade tape.
//!
//! The matching engine publishes; transport adapters (WebSocket
//! streamers, trade log writers, dashboards) subscribe. Slow consumers
//! never stall the hot path: each subscriber owns a bounded queue with
//! drop-oldest overflow and an in-stream lag notification.

pub mod bus;
pub mod events;
pub mod trades;
