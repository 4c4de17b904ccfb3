//! Error taxonomy surfaced by the matching core
//!
//! Validation errors are returned synchronously and never mutate
//! state. Subscriber lag is reported in-stream on the event bus, not
//! through this enum.

use thiserror::Error;

/// Errors surfaced by the matching core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Bad field combination, non-positive quantity, off-tick price,
    /// or a kind the entry point does not accept.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The symbol is not listed with the engine.
    #[error("Unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },

    /// Cancel targeted an order the engine does not hold.
    #[error("Order not found: {order_id}")]
    NotFound { order_id: String },

    /// A FOK order could not be fully filled, or a MARKET order faced
    /// an empty opposite side.
    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    /// Stop-activation cascade exceeded the configured depth ceiling;
    /// remaining stops stay armed.
    #[error("Stop cascade exceeded depth ceiling at {depth}")]
    CascadeOverflow { depth: usize },
}

impl CoreError {
    /// Build an InvalidRequest with a formatted reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        CoreError::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidRequest { .. } => "INVALID_REQUEST",
            CoreError::UnknownSymbol { .. } => "UNKNOWN_SYMBOL",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::InsufficientLiquidity => "INSUFFICIENT_LIQUIDITY",
            CoreError::CascadeOverflow { .. } => "CASCADE_OVERFLOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid("quantity must be positive");
        assert_eq!(err.to_string(), "Invalid request: quantity must be positive");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CoreError::UnknownSymbol {
                symbol: "XX-YY".into()
            }
            .code(),
            "UNKNOWN_SYMBOL"
        );
        assert_eq!(
            CoreError::InsufficientLiquidity.code(),
            "INSUFFICIENT_LIQUIDITY"
        );
        assert_eq!(
            CoreError::CascadeOverflow { depth: 64 }.code(),
            "CASCADE_OVERFLOW"
        );
    }
}
