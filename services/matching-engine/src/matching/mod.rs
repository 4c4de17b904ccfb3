//! Matching primitives
//!
//! Price-compatibility predicates and the trade factory that turns
//! book fills into fee-bearing trades.

pub mod crossing;
pub mod executor;

pub use executor::TradeFactory;
