//! Position sizing: balance and risk limits to a bounded trade amount.

use rust_decimal::Decimal;
use serde::Serialize;
use strum::Display;
use tracing::{info, warn};

use super::currency::{detect_currency, Currency, CurrencyInput};
use crate::config::Config;
use crate::metrics;

/// Smallest trade worth submitting, in currency units of the path's base.
pub const MIN_TRADE_AMOUNT: Decimal = Decimal::TEN;

/// Inputs to a sizing decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingRequest {
    /// Available balance in the path's base currency.
    pub balance: Decimal,
    /// Share of the balance to risk (0-100).
    pub portfolio_percent: Decimal,
    /// Absolute trade ceiling.
    pub max_trade_amount: Decimal,
    /// Base currency.
    pub currency: Currency,
    /// Path the trade is for, for diagnostics only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

/// Which limit produced the final amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum AppliedCap {
    /// The absolute ceiling was lower.
    #[strum(serialize = "maxTrade")]
    MaxTrade,
    /// The portfolio share was lower or equal.
    #[strum(serialize = "portfolio")]
    Portfolio,
}

/// Inputs echoed back with the intermediate values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingBreakdown {
    /// Balance supplied.
    pub balance: Decimal,
    /// Percent supplied.
    pub portfolio_percent: Decimal,
    /// `balance * portfolio_percent / 100`.
    pub portfolio_amount: Decimal,
    /// Ceiling supplied.
    pub max_trade_amount: Decimal,
    /// Floor applied.
    pub min_trade_amount: Decimal,
    /// Binding limit.
    pub applied_cap: AppliedCap,
    /// Base currency.
    pub currency: Currency,
}

/// Outcome of a sizing decision.
///
/// At most one of `warning` and `reason` is set; `reason` only when the
/// trade is refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingResult {
    /// Bounded trade amount.
    pub amount: Decimal,
    /// Whether the amount clears the minimum.
    pub can_trade: bool,
    /// Non-blocking notice, e.g. the ceiling was applied.
    pub warning: Option<String>,
    /// Why the trade is refused.
    pub reason: Option<String>,
    /// Echo of inputs.
    pub breakdown: SizingBreakdown,
}

/// Size a trade. Pure; never fails.
pub fn size(request: &SizingRequest) -> SizingResult {
    if let Some(problem) = invalid_input(request) {
        warn!(currency = %request.currency, problem = %problem, "Rejecting sizing request");
        return SizingResult {
            amount: Decimal::ZERO,
            can_trade: false,
            warning: None,
            reason: Some(problem),
            breakdown: breakdown(request, Decimal::ZERO, AppliedCap::Portfolio),
        };
    }

    // Overflow means the share exceeds any representable cap.
    let (portfolio_amount, applied_cap) = match portfolio_share(request) {
        Some(share) if share <= request.max_trade_amount => (share, AppliedCap::Portfolio),
        Some(share) => (share, AppliedCap::MaxTrade),
        None => (Decimal::MAX, AppliedCap::MaxTrade),
    };
    let breakdown = breakdown(request, portfolio_amount, applied_cap);

    let amount = portfolio_amount.min(request.max_trade_amount);
    let currency = request.currency;

    if amount < MIN_TRADE_AMOUNT {
        let reason = format!(
            "Insufficient balance: {} {currency} at {}% gives {} {currency}, minimum trade is {} {currency}",
            request.balance.round_dp(2),
            request.portfolio_percent,
            portfolio_amount.round_dp(2),
            MIN_TRADE_AMOUNT,
        );
        info!(
            currency = %currency,
            balance = %request.balance,
            amount = %amount,
            path = ?request.path,
            "Lost opportunity: trade below minimum"
        );
        metrics::inc_sizing_rejections(currency.code());

        return SizingResult {
            amount,
            can_trade: false,
            warning: None,
            reason: Some(reason),
            breakdown,
        };
    }

    let warning = (applied_cap == AppliedCap::MaxTrade).then(|| {
        metrics::inc_sizing_capped(currency.code());
        format!(
            "Trade capped at {} {currency} (portfolio share was {} {currency})",
            request.max_trade_amount.round_dp(2),
            portfolio_amount.round_dp(2),
        )
    });

    SizingResult {
        amount,
        can_trade: true,
        warning,
        reason: None,
        breakdown,
    }
}

fn portfolio_share(request: &SizingRequest) -> Option<Decimal> {
    request
        .balance
        .checked_mul(request.portfolio_percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
}

fn breakdown(
    request: &SizingRequest,
    portfolio_amount: Decimal,
    applied_cap: AppliedCap,
) -> SizingBreakdown {
    SizingBreakdown {
        balance: request.balance,
        portfolio_percent: request.portfolio_percent,
        portfolio_amount,
        max_trade_amount: request.max_trade_amount,
        min_trade_amount: MIN_TRADE_AMOUNT,
        applied_cap,
        currency: request.currency,
    }
}

fn invalid_input(request: &SizingRequest) -> Option<String> {
    if request.balance < Decimal::ZERO {
        return Some(format!("Invalid balance: {}", request.balance));
    }
    if request.portfolio_percent < Decimal::ZERO
        || request.portfolio_percent > Decimal::ONE_HUNDRED
    {
        return Some(format!(
            "Invalid portfolio percent: {} (expected 0-100)",
            request.portfolio_percent
        ));
    }
    if request.max_trade_amount < Decimal::ZERO {
        return Some(format!(
            "Invalid max trade amount: {}",
            request.max_trade_amount
        ));
    }
    None
}

/// Sizer configured with the operator's risk limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSizer {
    /// Share of the balance risked per trade (0-100).
    pub portfolio_percent: Decimal,
    /// Absolute trade ceiling.
    pub max_trade_amount: Decimal,
}

impl PositionSizer {
    /// Create a sizer with explicit limits.
    pub fn new(portfolio_percent: Decimal, max_trade_amount: Decimal) -> Self {
        Self {
            portfolio_percent,
            max_trade_amount,
        }
    }

    /// Create a sizer from config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.portfolio_percent, config.max_trade_amount)
    }

    /// Build a request for `balance`, detecting the base currency.
    pub fn request_for<'a>(
        &self,
        balance: Decimal,
        input: impl Into<CurrencyInput<'a>>,
    ) -> SizingRequest {
        let input = input.into();
        let path = match input {
            CurrencyInput::Path(path) => Some(path.to_vec()),
            CurrencyInput::Symbol(_) => None,
        };

        SizingRequest {
            balance,
            portfolio_percent: self.portfolio_percent,
            max_trade_amount: self.max_trade_amount,
            currency: detect_currency(input),
            path,
        }
    }

    /// Size a trade of `balance` for a path or symbol.
    pub fn size_for<'a>(&self, balance: Decimal, input: impl Into<CurrencyInput<'a>>) -> SizingResult {
        size(&self.request_for(balance, input))
    }
}
