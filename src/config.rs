//! Application configuration loaded from environment variables.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Scanning ===
    /// Per-adapter scan timeout in milliseconds.
    #[serde(default = "default_scan_timeout_ms")]
    pub scan_timeout_ms: u64,

    /// Pause between scan rounds in milliseconds.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// Ask adapters to report scan progress.
    #[serde(default)]
    pub show_activity: bool,

    /// Net profit percent above which an opportunity counts as profitable.
    #[serde(default = "default_profit_threshold")]
    pub profit_threshold: Decimal,

    /// Exchange keys to switch off at startup (comma separated).
    #[serde(default)]
    pub disabled_exchanges: Vec<String>,

    // === Position Sizing ===
    /// Share of the balance risked on one trade (0-100).
    #[serde(default = "default_portfolio_percent")]
    pub portfolio_percent: Decimal,

    /// Absolute ceiling on a single trade, in currency units.
    #[serde(default = "default_max_trade_amount")]
    pub max_trade_amount: Decimal,

    /// Balance used by the simulate command.
    #[serde(default = "default_sim_balance")]
    pub sim_balance: Decimal,

    // === Server Configuration ===
    /// HTTP server port for health/metrics endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_scan_timeout_ms() -> u64 {
    10_000
}

fn default_scan_interval_ms() -> u64 {
    5_000
}

fn default_profit_threshold() -> Decimal {
    Decimal::new(5, 1) // 0.5%
}

fn default_portfolio_percent() -> Decimal {
    Decimal::new(10, 0) // 10%
}

fn default_max_trade_amount() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_sim_balance() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_timeout_ms: default_scan_timeout_ms(),
            scan_interval_ms: default_scan_interval_ms(),
            show_activity: false,
            profit_threshold: default_profit_threshold(),
            disabled_exchanges: Vec::new(),
            portfolio_percent: default_portfolio_percent(),
            max_trade_amount: default_max_trade_amount(),
            sim_balance: default_sim_balance(),
            port: default_port(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Load configuration and reject invalid values.
    pub fn load_validated() -> crate::Result<Self> {
        let config = Self::load()?;
        config.validate().map_err(AppError::InvalidConfig)?;
        Ok(config)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.portfolio_percent <= Decimal::ZERO
            || self.portfolio_percent > Decimal::ONE_HUNDRED
        {
            return Err("PORTFOLIO_PERCENT must be in (0, 100]".to_string());
        }

        if self.max_trade_amount <= Decimal::ZERO {
            return Err("MAX_TRADE_AMOUNT must be positive".to_string());
        }

        if self.scan_timeout_ms == 0 {
            return Err("SCAN_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.sim_balance < Decimal::ZERO {
            return Err("SIM_BALANCE must not be negative".to_string());
        }

        Ok(())
    }

    /// Per-adapter scan timeout.
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    /// Pause between scan rounds.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_values_are_sensible() {
        let config = Config::default();
        assert_eq!(config.scan_timeout(), Duration::from_secs(10));
        assert_eq!(config.portfolio_percent, dec!(10));
        assert_eq!(config.max_trade_amount, dec!(1000));
        assert!(config.disabled_exchanges.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_percent() {
        let config = Config {
            portfolio_percent: dec!(150),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            portfolio_percent: dec!(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = Config {
            scan_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_cap() {
        let config = Config {
            max_trade_amount: dec!(-1),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
