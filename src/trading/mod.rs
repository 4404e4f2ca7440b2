//! Trading module for turning opportunities into bounded trade sizes.
//!
//! This module handles:
//! - Base-currency detection from paths and symbols
//! - Position sizing against portfolio share and absolute caps

pub mod currency;
pub mod sizing;

pub use currency::{detect_currency, Currency, CurrencyInput};
pub use sizing::{
    size, AppliedCap, PositionSizer, SizingBreakdown, SizingRequest, SizingResult,
    MIN_TRADE_AMOUNT,
};
