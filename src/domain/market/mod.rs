//! Market domain: instruments, symbols, rate tables and conversion.

pub mod conversion;
pub mod instrument;
pub mod quote;
pub mod rates;
pub mod symbol;

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to two decimals for display, halves away from zero.
pub fn round_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
