//! Per-symbol market configuration
//!
//! Tick grid, decimal scales, and fee schedule for one trading symbol.
//! The engine holds one `SymbolConfig` per listed symbol; submitting
//! for an unlisted symbol is rejected at the boundary.

use crate::fee::FeeSchedule;
use crate::ids::Symbol;
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market configuration for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolConfig {
    pub symbol: Symbol,
    /// Permissible prices are integer multiples of this tick.
    pub tick_size: Decimal,
    /// Maximum decimal places accepted on quantities.
    pub quantity_scale: u32,
    /// Decimal places fees are rounded to.
    pub fee_scale: u32,
    pub fees: FeeSchedule,
}

impl SymbolConfig {
    /// Create a config with default scales and fee schedule.
    pub fn new(symbol: Symbol, tick_size: Decimal) -> Self {
        Self {
            symbol,
            tick_size,
            quantity_scale: 8,
            fee_scale: 8,
            fees: FeeSchedule::default(),
        }
    }

    /// Convenience constructor with a 0.01 tick.
    pub fn with_cent_tick(symbol: Symbol) -> Self {
        Self::new(symbol, Decimal::from_str_exact("0.01").unwrap())
    }

    /// Override the fee schedule.
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    /// Whether a price sits on this symbol's tick grid.
    pub fn price_on_grid(&self, price: Price) -> bool {
        price.on_tick(self.tick_size)
    }

    /// Whether a quantity respects this symbol's quantity scale.
    pub fn quantity_in_scale(&self, quantity: Quantity) -> bool {
        quantity.scale() <= self.quantity_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_on_grid() {
        let config = SymbolConfig::with_cent_tick(Symbol::new("BTC-USDT"));
        assert!(config.price_on_grid(Price::from_str("100.25").unwrap()));
        assert!(!config.price_on_grid(Price::from_str("100.255").unwrap()));
    }

    #[test]
    fn test_coarse_tick() {
        let config = SymbolConfig::new(
            Symbol::new("ETH-USDC"),
            Decimal::from_str_exact("0.5").unwrap(),
        );
        assert!(config.price_on_grid(Price::from_str("2000.5").unwrap()));
        assert!(!config.price_on_grid(Price::from_str("2000.25").unwrap()));
    }

    #[test]
    fn test_quantity_scale() {
        let mut config = SymbolConfig::with_cent_tick(Symbol::new("BTC-USDT"));
        config.quantity_scale = 4;

        assert!(config.quantity_in_scale(Quantity::from_str("1.2345").unwrap()));
        assert!(!config.quantity_in_scale(Quantity::from_str("1.23456").unwrap()));
    }

    #[test]
    fn test_fee_override() {
        let fees = FeeSchedule::new(
            Decimal::from_str_exact("0.0003").unwrap(),
            Decimal::from_str_exact("0.0006").unwrap(),
        );
        let config = SymbolConfig::with_cent_tick(Symbol::new("BTC-USDT")).with_fees(fees);
        assert_eq!(config.fees.maker_rate, Decimal::from_str_exact("0.0003").unwrap());
    }
}
