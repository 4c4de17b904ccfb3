//! Fee calculation
//!
//! Maker/taker fees applied to trade notional. Pure arithmetic over
//! fixed-point decimals; rounding is half-up at the symbol's fee scale.

use crate::numeric::{Price, Quantity};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maker/taker fee rates for a symbol.
///
/// The maker (resting order) adds liquidity and pays the lower rate;
/// the taker (incoming order) removes liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub maker_rate: Decimal,
    pub taker_rate: Decimal,
}

impl FeeSchedule {
    /// Create a fee schedule with explicit rates.
    pub fn new(maker_rate: Decimal, taker_rate: Decimal) -> Self {
        Self {
            maker_rate,
            taker_rate,
        }
    }

    /// Compute (maker_fee, taker_fee) for a trade, rounded half-up to
    /// `scale` decimal places.
    pub fn fees(&self, price: Price, quantity: Quantity, scale: u32) -> (Decimal, Decimal) {
        let notional = quantity.as_decimal() * price.as_decimal();
        let maker = (notional * self.maker_rate)
            .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
        let taker = (notional * self.taker_rate)
            .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
        (maker, taker)
    }
}

impl Default for FeeSchedule {
    /// Default rates: 1 bp maker, 2 bp taker.
    fn default() -> Self {
        Self {
            maker_rate: Decimal::from_str_exact("0.0001").unwrap(),
            taker_rate: Decimal::from_str_exact("0.0002").unwrap(),
        }
    }
}
