//! Simulated exchange adapter for tests and the `simulate` command.
//!
//! This module provides an in-memory adapter that returns seeded
//! opportunities without making network requests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::json;
use time::OffsetDateTime;

use super::adapter::{ExchangeAdapter, StatsProvider};
use super::types::{
    ExchangeKey, ExecutionReport, ExecutionStatus, Opportunity, ProfitQuote, Side, TradePath,
    TradeStep,
};
use crate::error::{AdapterError, PathError};

/// Configuration for simulated adapter behavior.
#[derive(Debug, Clone, Default)]
pub struct SimulatedConfig {
    /// Whether scan requests fail.
    pub fail_scan: bool,
    /// Whether stats requests fail.
    pub fail_stats: bool,
    /// Whether execution requests are rejected.
    pub fail_execute: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
    /// Net profit percent above which a seeded cycle is flagged profitable.
    pub profit_threshold: Decimal,
}

/// Seeded cycle with its quoted round-trip return.
#[derive(Debug, Clone)]
struct SeededCycle {
    path: TradePath,
    net_profit_percent: Decimal,
}

/// In-memory exchange adapter.
#[derive(Debug, Clone)]
pub struct SimulatedExchange {
    key: ExchangeKey,
    config: SimulatedConfig,
    cycles: Arc<Mutex<Vec<SeededCycle>>>,
    scans: Arc<AtomicU64>,
    executions: Arc<AtomicU64>,
}

impl SimulatedExchange {
    /// Start building a simulated exchange.
    pub fn builder(key: impl Into<ExchangeKey>) -> SimulatedExchangeBuilder {
        SimulatedExchangeBuilder::new(key)
    }

    /// Exchange key this adapter reports.
    pub fn key(&self) -> &ExchangeKey {
        &self.key
    }

    /// Seed another cycle.
    pub fn add_cycle(
        &self,
        currencies: &[&str],
        net_profit_percent: Decimal,
    ) -> Result<(), PathError> {
        let path = cycle_path(currencies)?;
        self.cycles.lock().push(SeededCycle {
            path,
            net_profit_percent,
        });
        Ok(())
    }

    /// Remove all seeded cycles.
    pub fn clear(&self) {
        self.cycles.lock().clear();
    }

    /// Number of scans served.
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn quote(&self, path: &TradePath) -> Option<Decimal> {
        self.cycles
            .lock()
            .iter()
            .find(|c| c.path.currencies() == path.currencies())
            .map(|c| c.net_profit_percent)
    }
}

#[async_trait]
impl ExchangeAdapter for SimulatedExchange {
    fn name(&self) -> &str {
        self.key.as_str()
    }

    async fn scan_opportunities(
        &self,
        show_activity: bool,
    ) -> Result<Vec<Opportunity>, AdapterError> {
        self.simulate_latency().await;
        self.scans.fetch_add(1, Ordering::Relaxed);

        if self.config.fail_scan {
            return Err(AdapterError::Network(format!(
                "simulated scan failure on {}",
                self.key
            )));
        }

        let detected_at = OffsetDateTime::now_utc();
        let opportunities: Vec<Opportunity> = self
            .cycles
            .lock()
            .iter()
            .map(|c| Opportunity {
                exchange: self.key.clone(),
                path: c.path.clone(),
                net_profit_percent: c.net_profit_percent,
                profitable: c.net_profit_percent > self.config.profit_threshold,
                detected_at,
            })
            .collect();

        if show_activity {
            tracing::info!(
                exchange = %self.key,
                cycles = opportunities.len(),
                "Simulated scan complete"
            );
        }

        Ok(opportunities)
    }

    async fn calculate_profit(
        &self,
        path: &TradePath,
        amount: Decimal,
    ) -> Result<ProfitQuote, AdapterError> {
        self.simulate_latency().await;

        let net_profit_percent = self
            .quote(path)
            .ok_or_else(|| AdapterError::Protocol(format!("no quote for {path}")))?;

        let end_amount = amount + amount * net_profit_percent / Decimal::ONE_HUNDRED;
        Ok(ProfitQuote {
            start_amount: amount,
            end_amount,
            fees: Decimal::ZERO,
            net_profit_percent,
        })
    }

    async fn execute_opportunity(
        &self,
        opportunity: &Opportunity,
    ) -> Result<ExecutionReport, AdapterError> {
        self.simulate_latency().await;

        if self.config.fail_execute {
            return Err(AdapterError::Rejected(format!(
                "simulated rejection on {}",
                self.key
            )));
        }

        let n = self.executions.fetch_add(1, Ordering::Relaxed) + 1;
        let order_ids = (0..opportunity.path.hops())
            .map(|hop| format!("sim-{}-{n}-{hop}", self.key))
            .collect();

        Ok(ExecutionReport {
            exchange: self.key.clone(),
            status: ExecutionStatus::Simulated,
            order_ids,
            final_amount: None,
        })
    }
}

impl StatsProvider for SimulatedExchange {
    fn get_stats(&self) -> Result<serde_json::Value, AdapterError> {
        if self.config.fail_stats {
            return Err(AdapterError::Protocol("simulated stats failure".to_string()));
        }

        Ok(json!({
            "exchange": self.key.as_str(),
            "scans": self.scans.load(Ordering::Relaxed),
            "executions": self.executions.load(Ordering::Relaxed),
            "seededCycles": self.cycles.lock().len(),
        }))
    }
}

/// Builder for simulated exchanges.
pub struct SimulatedExchangeBuilder {
    key: ExchangeKey,
    config: SimulatedConfig,
    cycles: Vec<SeededCycle>,
}

impl SimulatedExchangeBuilder {
    /// Create a new builder for the given key.
    pub fn new(key: impl Into<ExchangeKey>) -> Self {
        Self {
            key: key.into(),
            config: SimulatedConfig::default(),
            cycles: Vec::new(),
        }
    }

    /// Seed a cycle; the closing currency is appended if missing.
    ///
    /// Malformed cycles are skipped.
    pub fn cycle(mut self, currencies: &[&str], net_profit_percent: Decimal) -> Self {
        if let Ok(path) = cycle_path(currencies) {
            self.cycles.push(SeededCycle {
                path,
                net_profit_percent,
            });
        }
        self
    }

    /// Add latency to every call.
    pub fn latency_ms(mut self, latency_ms: u64) -> Self {
        self.config.latency_ms = latency_ms;
        self
    }

    /// Make scans fail.
    pub fn failing_scan(mut self) -> Self {
        self.config.fail_scan = true;
        self
    }

    /// Make stats fail.
    pub fn failing_stats(mut self) -> Self {
        self.config.fail_stats = true;
        self
    }

    /// Make executions fail.
    pub fn failing_execute(mut self) -> Self {
        self.config.fail_execute = true;
        self
    }

    /// Threshold used to flag seeded cycles as profitable.
    pub fn profit_threshold(mut self, threshold: Decimal) -> Self {
        self.config.profit_threshold = threshold;
        self
    }

    /// Build the adapter.
    pub fn build(self) -> SimulatedExchange {
        SimulatedExchange {
            key: self.key,
            config: self.config,
            cycles: Arc::new(Mutex::new(self.cycles)),
            scans: Arc::new(AtomicU64::new(0)),
            executions: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Build a path from bare currencies, naming each pair `FROM/TO`.
fn cycle_path(currencies: &[&str]) -> Result<TradePath, PathError> {
    let mut cycle: Vec<String> = currencies.iter().map(|c| c.to_uppercase()).collect();
    if cycle.len() > 1 && cycle.first() != cycle.last() {
        cycle.push(cycle[0].clone());
    }

    let steps: Vec<TradeStep> = cycle
        .windows(2)
        .map(|w| TradeStep::new(format!("{}/{}", w[0], w[1]), Side::Sell))
        .collect();

    TradePath::new(cycle, steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn scan_returns_seeded_cycles() {
        let exchange = SimulatedExchange::builder("binance")
            .cycle(&["USDT", "BTC", "ETH"], dec!(0.8))
            .cycle(&["USDT", "ETH", "BNB", "USDT"], dec!(-0.2))
            .profit_threshold(dec!(0.5))
            .build();

        let opps = exchange.scan_opportunities(false).await.unwrap();
        assert_eq!(opps.len(), 2);
        assert!(opps[0].profitable);
        assert!(!opps[1].profitable);
        assert_eq!(opps[0].path.currencies().last().unwrap(), "USDT");
        assert_eq!(exchange.scan_count(), 1);
    }

    #[tokio::test]
    async fn calculate_profit_applies_seeded_return() {
        let exchange = SimulatedExchange::builder("valr")
            .cycle(&["ZAR", "BTC", "ETH"], dec!(2))
            .build();
        let path = cycle_path(&["ZAR", "BTC", "ETH"]).unwrap();

        let quote = exchange.calculate_profit(&path, dec!(500)).await.unwrap();
        assert_eq!(quote.end_amount, dec!(510));
        assert_eq!(quote.net_profit(), dec!(10));
    }

    #[tokio::test]
    async fn failure_modes() {
        let exchange = SimulatedExchange::builder("luno")
            .failing_scan()
            .failing_stats()
            .build();

        assert!(exchange.scan_opportunities(false).await.is_err());
        assert!(exchange.get_stats().is_err());
    }

    #[test]
    fn builder_skips_malformed_cycles() {
        let exchange = SimulatedExchange::builder("kraken")
            .cycle(&["USDT", "BTC"], dec!(1))
            .build();

        assert!(exchange.add_cycle(&["USDT"], dec!(1)).is_err());
        let stats = exchange.get_stats().unwrap();
        assert_eq!(stats["seededCycles"], 0);
    }
}
