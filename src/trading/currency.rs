//! Base-currency detection for paths and trading pairs.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Currencies the sizer understands, in priority order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Currency {
    /// Tether.
    #[default]
    Usdt,
    /// South African rand.
    Zar,
    /// USD Coin.
    Usdc,
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
    /// Bitcoin.
    Btc,
    /// Ether.
    Eth,
}

impl Currency {
    /// Detection priority. Quote currencies come first.
    pub const PRIORITY: [Currency; 7] = [
        Currency::Usdt,
        Currency::Zar,
        Currency::Usdc,
        Currency::Usd,
        Currency::Eur,
        Currency::Btc,
        Currency::Eth,
    ];

    /// Currency code.
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

/// Input accepted by [`detect_currency`].
#[derive(Debug, Clone, Copy)]
pub enum CurrencyInput<'a> {
    /// Currency cycle, start element first.
    Path(&'a [String]),
    /// Trading-pair symbol or bare currency code.
    Symbol(&'a str),
}

impl<'a> From<&'a [String]> for CurrencyInput<'a> {
    fn from(path: &'a [String]) -> Self {
        CurrencyInput::Path(path)
    }
}

impl<'a> From<&'a Vec<String>> for CurrencyInput<'a> {
    fn from(path: &'a Vec<String>) -> Self {
        CurrencyInput::Path(path.as_slice())
    }
}

impl<'a> From<&'a str> for CurrencyInput<'a> {
    fn from(symbol: &'a str) -> Self {
        CurrencyInput::Symbol(symbol)
    }
}

/// Classify the base currency of a path or symbol. Defaults to USDT.
pub fn detect_currency<'a>(input: impl Into<CurrencyInput<'a>>) -> Currency {
    match input.into() {
        CurrencyInput::Path(path) => detect_from_path(path),
        CurrencyInput::Symbol(symbol) => detect_from_symbol(symbol),
    }
}

fn detect_from_path(path: &[String]) -> Currency {
    let Some(start) = path.first() else {
        return Currency::default();
    };
    let start = start.trim().to_uppercase();

    if let Ok(currency) = start.parse::<Currency>() {
        return currency;
    }

    // Wrapped or bridged tickers such as "USDT.E".
    [Currency::Usdt, Currency::Zar]
        .into_iter()
        .find(|c| start.contains(c.code()))
        .unwrap_or_default()
}

fn detect_from_symbol(symbol: &str) -> Currency {
    let normalized: String = symbol
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_'))
        .collect();

    if let Ok(currency) = normalized.parse::<Currency>() {
        return currency;
    }

    // Quote currency is conventionally the trailing token.
    Currency::PRIORITY
        .into_iter()
        .find(|c| normalized.ends_with(c.code()))
        .or_else(|| {
            Currency::PRIORITY
                .into_iter()
                .find(|c| normalized.starts_with(c.code()))
        })
        .unwrap_or_default()
}
