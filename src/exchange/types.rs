//! Exchange-facing value types: keys, trade paths and opportunities.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{Display, EnumString};
use time::OffsetDateTime;

use crate::error::PathError;

/// Case-insensitive exchange identifier.
///
/// Keys are trimmed and lower-cased on construction, so `"Binance"` and
/// `" binance "` refer to the same registry entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeKey(String);

impl ExchangeKey {
    /// Normalize a raw key.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    /// The normalized key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExchangeKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ExchangeKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Side of a single conversion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy the base asset with the quote asset.
    #[strum(serialize = "buy", serialize = "BUY")]
    Buy,
    /// Sell the base asset for the quote asset.
    #[strum(serialize = "sell", serialize = "SELL")]
    Sell,
}

/// One hop of a trade path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeStep {
    /// Trading-pair symbol as the exchange names it (e.g. "BTCUSDT").
    pub pair: String,
    /// Side to trade on that pair.
    pub side: Side,
}

impl TradeStep {
    /// Create a step.
    pub fn new(pair: impl Into<String>, side: Side) -> Self {
        Self {
            pair: pair.into(),
            side,
        }
    }
}

/// Minimum number of conversion hops in a cycle.
pub const MIN_PATH_HOPS: usize = 3;

/// Cycle of currency conversions returning to its starting currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradePath {
    currencies: Vec<String>,
    steps: SmallVec<[TradeStep; 3]>,
}

impl TradePath {
    /// Build a path from its currency cycle and one step per hop.
    ///
    /// `currencies` includes the closing element, so a three-hop cycle is
    /// written `["USDT", "BTC", "ETH", "USDT"]`.
    pub fn new(
        currencies: Vec<String>,
        steps: impl IntoIterator<Item = TradeStep>,
    ) -> Result<Self, PathError> {
        let hops = currencies.len().saturating_sub(1);
        if hops < MIN_PATH_HOPS {
            return Err(PathError::TooShort { hops });
        }

        let start = &currencies[0];
        let end = &currencies[currencies.len() - 1];
        if !start.eq_ignore_ascii_case(end) {
            return Err(PathError::NotACycle {
                start: start.clone(),
                end: end.clone(),
            });
        }

        let steps: SmallVec<[TradeStep; 3]> = steps.into_iter().collect();
        if steps.len() != hops {
            return Err(PathError::StepMismatch {
                expected: hops,
                actual: steps.len(),
            });
        }

        Ok(Self { currencies, steps })
    }

    /// Currency cycle, closing element included.
    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    /// Per-hop pair/side descriptors.
    pub fn steps(&self) -> &[TradeStep] {
        &self.steps
    }

    /// Currency the cycle starts and ends in.
    pub fn start_currency(&self) -> &str {
        &self.currencies[0]
    }

    /// Number of conversion hops.
    pub fn hops(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Display for TradePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.currencies.join(" → "))
    }
}

/// Triangular arbitrage opportunity reported by an exchange adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    /// Exchange the cycle was found on.
    pub exchange: ExchangeKey,
    /// Conversion cycle.
    pub path: TradePath,
    /// Round-trip profit after fees, in percent (signed).
    pub net_profit_percent: Decimal,
    /// Whether the adapter judged this above its profit threshold.
    pub profitable: bool,
    /// When the adapter detected it.
    #[serde(with = "time::serde::rfc3339")]
    pub detected_at: OffsetDateTime,
}

/// Result of pricing a path for a given start amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitQuote {
    /// Amount fed into the first hop.
    pub start_amount: Decimal,
    /// Amount left after the final hop.
    pub end_amount: Decimal,
    /// Total fees charged along the path, in start currency.
    pub fees: Decimal,
    /// Round-trip profit after fees, in percent.
    pub net_profit_percent: Decimal,
}

impl ProfitQuote {
    /// Absolute profit in start currency.
    pub fn net_profit(&self) -> Decimal {
        self.end_amount - self.start_amount
    }
}

/// Terminal state of an execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Every hop filled.
    Filled,
    /// Some hops filled before the cycle broke.
    PartiallyFilled,
    /// Nothing filled.
    Rejected,
    /// Dry run, no orders placed.
    Simulated,
}

/// Outcome reported by an adapter after executing an opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    /// Exchange that executed.
    pub exchange: ExchangeKey,
    /// Final state.
    pub status: ExecutionStatus,
    /// Order IDs placed, one per filled hop.
    pub order_ids: Vec<String>,
    /// Amount held in start currency once the cycle closed.
    pub final_amount: Option<Decimal>,
}
