//! Concurrent multi-exchange scanning.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::AdapterError;
use crate::exchange::{ExchangeKey, ExchangeRegistry, Opportunity};
use crate::metrics;

/// How one adapter's scan settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanStatus {
    /// Adapter answered.
    Completed {
        /// Opportunities returned.
        opportunities: usize,
    },
    /// Adapter rejected or panicked.
    Failed {
        /// Failure description.
        error: String,
    },
    /// Adapter did not answer within the scan timeout.
    TimedOut,
}

/// Per-adapter scan summary.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterScanOutcome {
    /// Exchange scanned.
    pub exchange: ExchangeKey,
    /// How it settled.
    #[serde(flatten)]
    pub status: ScanStatus,
    /// Time until it settled.
    pub elapsed_ms: u64,
}

/// Merged result of one scan round.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// All opportunities, best net profit first.
    pub opportunities: Vec<Opportunity>,
    /// Number of opportunities flagged profitable.
    pub profitable_count: usize,
    /// One entry per adapter scanned.
    pub outcomes: Vec<AdapterScanOutcome>,
    /// When the round started.
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    /// Round duration.
    pub elapsed_ms: u64,
}

impl ScanReport {
    fn empty(started_at: OffsetDateTime) -> Self {
        Self {
            opportunities: Vec::new(),
            profitable_count: 0,
            outcomes: Vec::new(),
            started_at,
            elapsed_ms: 0,
        }
    }

    /// Best opportunity flagged profitable, if any.
    pub fn best_profitable(&self) -> Option<&Opportunity> {
        self.opportunities.iter().find(|o| o.profitable)
    }

    /// Number of adapters that failed or timed out.
    pub fn failed_adapters(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, ScanStatus::Completed { .. }))
            .count()
    }
}

/// Fans a scan out to every active exchange and merges the results.
#[derive(Debug, Clone)]
pub struct ScanCoordinator {
    registry: Arc<ExchangeRegistry>,
    scan_timeout: Duration,
}

impl ScanCoordinator {
    /// Create a coordinator with a per-adapter timeout.
    pub fn new(registry: Arc<ExchangeRegistry>, scan_timeout: Duration) -> Self {
        Self {
            registry,
            scan_timeout,
        }
    }

    /// Per-adapter timeout.
    pub fn scan_timeout(&self) -> Duration {
        self.scan_timeout
    }

    /// Scan every available and active exchange concurrently.
    ///
    /// A failing, panicking or hanging adapter contributes no opportunities and
    /// never fails the round.
    #[instrument(skip(self))]
    pub async fn scan_all(&self, show_activity: bool) -> ScanReport {
        let started_at = OffsetDateTime::now_utc();
        let start = Instant::now();

        let targets = self.registry.scan_targets();
        if targets.is_empty() {
            debug!("No active exchanges to scan");
            return ScanReport::empty(started_at);
        }

        let timeout = self.scan_timeout;
        let tasks = targets.into_iter().map(move |(key, adapter)| {
            let task = AbortOnDrop(tokio::spawn(async move {
                let start = Instant::now();
                let result =
                    tokio::time::timeout(timeout, adapter.scan_opportunities(show_activity)).await;
                (result, start.elapsed())
            }));

            async move {
                let mut task = task;
                let settled = (&mut task.0).await;
                (key, settled)
            }
        });

        let settled = join_all(tasks).await;

        let mut opportunities = Vec::new();
        let mut outcomes = Vec::with_capacity(settled.len());

        for (exchange, joined) in settled {
            let (status, elapsed) = match joined {
                Ok((Ok(Ok(found)), elapsed)) => {
                    let status = ScanStatus::Completed {
                        opportunities: found.len(),
                    };
                    opportunities.extend(found);
                    (status, elapsed)
                }
                Ok((Ok(Err(e)), elapsed)) => {
                    warn!(exchange = %exchange, error = %e, "Exchange scan failed");
                    metrics::inc_adapter_scan_failures(exchange.as_str());
                    (
                        ScanStatus::Failed {
                            error: e.to_string(),
                        },
                        elapsed,
                    )
                }
                Ok((Err(_), elapsed)) => {
                    let e = AdapterError::Timeout {
                        after_ms: duration_ms(timeout),
                    };
                    warn!(exchange = %exchange, error = %e, "Exchange scan timed out");
                    metrics::inc_adapter_scan_timeouts(exchange.as_str());
                    (ScanStatus::TimedOut, elapsed)
                }
                Err(join_err) => {
                    warn!(exchange = %exchange, error = %join_err, "Exchange scan task aborted");
                    metrics::inc_adapter_scan_failures(exchange.as_str());
                    (
                        ScanStatus::Failed {
                            error: join_err.to_string(),
                        },
                        start.elapsed(),
                    )
                }
            };

            outcomes.push(AdapterScanOutcome {
                exchange,
                status,
                elapsed_ms: duration_ms(elapsed),
            });
        }

        let (opportunities, profitable_count) = rank(opportunities);
        let elapsed = start.elapsed();

        metrics::record_scan_latency(start);
        metrics::inc_opportunities_discovered(opportunities.len() as u64);
        metrics::inc_profitable_opportunities(profitable_count as u64);

        info!(
            exchanges = outcomes.len(),
            opportunities = opportunities.len(),
            profitable = profitable_count,
            elapsed_ms = duration_ms(elapsed),
            "Scan round complete"
        );

        ScanReport {
            opportunities,
            profitable_count,
            outcomes,
            started_at,
            elapsed_ms: duration_ms(elapsed),
        }
    }
}

/// Stable-sort by net profit (best first) and count profitable entries.
pub fn rank(mut opportunities: Vec<Opportunity>) -> (Vec<Opportunity>, usize) {
    opportunities.sort_by(|a, b| b.net_profit_percent.cmp(&a.net_profit_percent));
    let profitable = opportunities.iter().filter(|o| o.profitable).count();
    (opportunities, profitable)
}

/// Aborts the adapter task when a round is dropped before it settles.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use crate::exchange::{
        AdapterHandle, ExchangeAdapter, ExecutionReport, ProfitQuote, SimulatedExchange,
        StatsProvider, TradePath,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct PanickingExchange;

    #[async_trait]
    impl ExchangeAdapter for PanickingExchange {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn scan_opportunities(&self, _: bool) -> Result<Vec<Opportunity>, AdapterError> {
            panic!("adapter bug");
        }

        async fn calculate_profit(
            &self,
            _: &TradePath,
            _: Decimal,
        ) -> Result<ProfitQuote, AdapterError> {
            Err(AdapterError::Protocol("unsupported".to_string()))
        }

        async fn execute_opportunity(
            &self,
            _: &Opportunity,
        ) -> Result<ExecutionReport, AdapterError> {
            Err(AdapterError::Protocol("unsupported".to_string()))
        }
    }

    fn coordinator(registry: ExchangeRegistry) -> ScanCoordinator {
        ScanCoordinator::new(Arc::new(registry), Duration::from_millis(200))
    }

    fn add(registry: &ExchangeRegistry, exchange: SimulatedExchange) {
        let key = exchange.key().clone();
        registry.register(key, Some(AdapterHandle::basic(exchange)));
    }

    #[tokio::test]
    async fn dropping_a_round_aborts_adapter_tasks() {
        let slow = Arc::new(
            SimulatedExchange::builder("slowex")
                .latency_ms(100)
                .cycle(&["USDT", "BTC", "ETH"], dec!(1))
                .build(),
        );
        let registry = ExchangeRegistry::new();
        registry.register(
            "slowex",
            Some(AdapterHandle::from_shared_with_stats(slow.clone())),
        );
        let coordinator = ScanCoordinator::new(Arc::new(registry), Duration::from_secs(5));

        let cut_short =
            tokio::time::timeout(Duration::from_millis(20), coordinator.scan_all(false)).await;
        assert!(cut_short.is_err());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(slow.get_stats().unwrap()["scans"], 0);
    }

    #[tokio::test]
    async fn empty_registry_returns_empty_report() {
        let report = coordinator(ExchangeRegistry::new()).scan_all(false).await;
        assert!(report.opportunities.is_empty());
        assert!(report.outcomes.is_empty());
    }

    #[tokio::test]
    async fn merges_and_sorts_descending() {
        let registry = ExchangeRegistry::new();
        add(
            &registry,
            SimulatedExchange::builder("binance")
                .cycle(&["USDT", "BTC", "ETH"], dec!(0.3))
                .cycle(&["USDT", "ETH", "BNB"], dec!(1.2))
                .profit_threshold(dec!(0.5))
                .build(),
        );
        add(
            &registry,
            SimulatedExchange::builder("valr")
                .cycle(&["ZAR", "BTC", "ETH"], dec!(0.9))
                .cycle(&["ZAR", "USDT", "BTC"], dec!(-0.4))
                .profit_threshold(dec!(0.5))
                .build(),
        );

        let report = coordinator(registry).scan_all(false).await;
        let profits: Vec<Decimal> = report
            .opportunities
            .iter()
            .map(|o| o.net_profit_percent)
            .collect();

        assert_eq!(profits, vec![dec!(1.2), dec!(0.9), dec!(0.3), dec!(-0.4)]);
        assert_eq!(report.profitable_count, 2);
        assert_eq!(report.best_profitable().unwrap().exchange.as_str(), "binance");
    }

    #[tokio::test]
    async fn ties_keep_registry_order() {
        let registry = ExchangeRegistry::new();
        add(
            &registry,
            SimulatedExchange::builder("alpha")
                .cycle(&["USDT", "BTC", "ETH"], dec!(0.5))
                .build(),
        );
        add(
            &registry,
            SimulatedExchange::builder("beta")
                .cycle(&["USDT", "BTC", "ETH"], dec!(0.5))
                .build(),
        );

        let report = coordinator(registry).scan_all(false).await;
        let order: Vec<&str> = report
            .opportunities
            .iter()
            .map(|o| o.exchange.as_str())
            .collect();
        assert_eq!(order, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn all_failing_adapters_yield_empty_result() {
        let registry = ExchangeRegistry::new();
        add(&registry, SimulatedExchange::builder("a").failing_scan().build());
        add(&registry, SimulatedExchange::builder("b").failing_scan().build());

        let report = coordinator(registry).scan_all(false).await;
        assert!(report.opportunities.is_empty());
        assert_eq!(report.failed_adapters(), 2);
    }

    #[tokio::test]
    async fn failure_is_isolated_per_adapter() {
        let registry = ExchangeRegistry::new();
        add(&registry, SimulatedExchange::builder("broken").failing_scan().build());
        add(
            &registry,
            SimulatedExchange::builder("healthy")
                .cycle(&["USDT", "BTC", "ETH"], dec!(0.6))
                .build(),
        );
        registry.register("panicking", Some(AdapterHandle::basic(PanickingExchange)));

        let report = coordinator(registry).scan_all(false).await;
        assert_eq!(report.opportunities.len(), 1);
        assert_eq!(report.opportunities[0].exchange.as_str(), "healthy");
        assert_eq!(report.failed_adapters(), 2);
    }

    #[tokio::test]
    async fn hanging_adapter_times_out() {
        let registry = ExchangeRegistry::new();
        add(
            &registry,
            SimulatedExchange::builder("slow")
                .latency_ms(10_000)
                .cycle(&["USDT", "BTC", "ETH"], dec!(5))
                .build(),
        );
        add(
            &registry,
            SimulatedExchange::builder("fast")
                .cycle(&["USDT", "BTC", "ETH"], dec!(0.1))
                .build(),
        );

        let report = coordinator(registry).scan_all(false).await;
        assert_eq!(report.opportunities.len(), 1);

        let slow = report
            .outcomes
            .iter()
            .find(|o| o.exchange.as_str() == "slow")
            .unwrap();
        assert_eq!(slow.status, ScanStatus::TimedOut);
    }

    #[tokio::test]
    async fn inactive_and_unavailable_exchanges_are_skipped() {
        let registry = ExchangeRegistry::new();
        let disabled = SimulatedExchange::builder("disabled")
            .cycle(&["USDT", "BTC", "ETH"], dec!(3))
            .build();
        add(&registry, disabled.clone());
        registry.set_active("disabled", false).unwrap();
        registry.register("missing", None);

        let report = coordinator(registry).scan_all(false).await;
        assert!(report.opportunities.is_empty());
        assert!(report.outcomes.is_empty());
        assert_eq!(disabled.scan_count(), 0);
    }

    #[tokio::test]
    async fn adapters_are_scanned_concurrently() {
        let registry = ExchangeRegistry::new();
        for key in ["a", "b", "c", "d"] {
            add(
                &registry,
                SimulatedExchange::builder(key)
                    .latency_ms(100)
                    .cycle(&["USDT", "BTC", "ETH"], dec!(0.1))
                    .build(),
            );
        }

        let start = Instant::now();
        let report = ScanCoordinator::new(Arc::new(registry), Duration::from_secs(5))
            .scan_all(false)
            .await;

        assert_eq!(report.opportunities.len(), 4);
        assert!(start.elapsed() < Duration::from_millis(350));
    }

    #[test]
    fn rank_is_stable_for_equal_profit() {
        let registry_order = ["x", "y", "z"];
        let template = SimulatedExchange::builder("t")
            .cycle(&["USDT", "BTC", "ETH"], dec!(0))
            .build();
        let opp = tokio_test::block_on(template.scan_opportunities(false))
            .unwrap()
            .remove(0);

        let input: Vec<Opportunity> = registry_order
            .iter()
            .map(|k| Opportunity {
                exchange: ExchangeKey::new(k),
                ..opp.clone()
            })
            .collect();

        let (ranked, profitable) = rank(input.clone());
        assert_eq!(ranked, input);
        assert_eq!(profitable, 0);
    }
}
