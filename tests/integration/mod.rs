//! Integration tests for the arbitrage coordinator.
//!
//! These tests wire simulated exchanges through the public API: registry,
//! dispatcher, scan coordinator, stats and sizer together.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use triarb::arbitrage::{RouteDispatcher, ScanCoordinator, ScanStatus, StatsAggregator};
use triarb::config::Config;
use triarb::error::ExchangeError;
use triarb::exchange::{AdapterHandle, ExchangeRegistry, SimulatedExchange};
use triarb::trading::{detect_currency, AppliedCap, Currency, PositionSizer};

/// Registry with one healthy, one failing, one hanging, one disabled and one
/// unloaded exchange.
fn test_registry(config: &Config) -> Arc<ExchangeRegistry> {
    let registry = Arc::new(ExchangeRegistry::new());

    registry.register(
        "Binance",
        Some(AdapterHandle::with_stats(
            SimulatedExchange::builder("binance")
                .profit_threshold(config.profit_threshold)
                .cycle(&["USDT", "BTC", "ETH", "USDT"], dec!(0.4))
                .cycle(&["USDT", "ETH", "BNB", "USDT"], dec!(1.1))
                .build(),
        )),
    );
    registry.register(
        "valr",
        Some(AdapterHandle::with_stats(
            SimulatedExchange::builder("valr")
                .profit_threshold(config.profit_threshold)
                .cycle(&["ZAR", "BTC", "ETH", "ZAR"], dec!(0.75))
                .build(),
        )),
    );
    registry.register(
        "luno",
        Some(AdapterHandle::basic(
            SimulatedExchange::builder("luno").failing_scan().build(),
        )),
    );
    registry.register(
        "slowex",
        Some(AdapterHandle::basic(
            SimulatedExchange::builder("slowex")
                .latency_ms(5_000)
                .cycle(&["USDT", "BTC", "ETH", "USDT"], dec!(9))
                .build(),
        )),
    );
    registry.register(
        "bitstamp",
        Some(AdapterHandle::basic(
            SimulatedExchange::builder("bitstamp")
                .cycle(&["EUR", "BTC", "ETH", "EUR"], dec!(7))
                .build(),
        )),
    );
    registry.register("kraken", None);

    registry
}

fn test_config() -> Config {
    Config {
        scan_timeout_ms: 150,
        profit_threshold: dec!(0.5),
        disabled_exchanges: vec!["BITSTAMP".to_string()],
        portfolio_percent: dec!(10),
        max_trade_amount: dec!(50),
        ..Config::default()
    }
}

#[tokio::test]
async fn scan_round_isolates_failures_and_ranks_results() {
    let config = test_config();
    let registry = test_registry(&config);
    let summary = registry.initialize(&config.disabled_exchanges);
    assert_eq!(summary.total, 6);
    assert_eq!(summary.available, 5);
    assert_eq!(summary.active, 4);

    let coordinator = ScanCoordinator::new(registry, config.scan_timeout());
    let report = coordinator.scan_all(false).await;

    let profits: Vec<_> = report
        .opportunities
        .iter()
        .map(|o| o.net_profit_percent)
        .collect();
    assert_eq!(profits, vec![dec!(1.1), dec!(0.75), dec!(0.4)]);
    assert!(report
        .opportunities
        .windows(2)
        .all(|w| w[0].net_profit_percent >= w[1].net_profit_percent));
    assert_eq!(report.profitable_count, 2);

    let status_of = |key: &str| {
        report
            .outcomes
            .iter()
            .find(|o| o.exchange.as_str() == key)
            .map(|o| o.status.clone())
    };
    assert!(matches!(status_of("luno"), Some(ScanStatus::Failed { .. })));
    assert_eq!(status_of("slowex"), Some(ScanStatus::TimedOut));
    assert_eq!(status_of("bitstamp"), None);
    assert_eq!(status_of("kraken"), None);
}

#[tokio::test]
async fn routed_calls_validate_the_exchange_key() {
    let config = test_config();
    let registry = test_registry(&config);
    registry.initialize(&config.disabled_exchanges);
    let dispatcher = RouteDispatcher::new(registry);

    assert!(matches!(
        dispatcher.route_scan("unknown", false).await,
        Err(ExchangeError::UnknownExchange { .. })
    ));
    assert!(matches!(
        dispatcher.route_scan("KRAKEN", false).await,
        Err(ExchangeError::Unavailable { .. })
    ));
    assert!(dispatcher.route_scan("bitstamp", false).await.unwrap().is_empty());
    assert_eq!(dispatcher.route_scan("BINANCE", false).await.unwrap().len(), 2);
}

#[tokio::test]
async fn best_opportunity_is_sized_in_its_base_currency() {
    let config = test_config();
    let registry = test_registry(&config);
    registry.initialize(&config.disabled_exchanges);

    let report = ScanCoordinator::new(registry.clone(), config.scan_timeout())
        .scan_all(false)
        .await;
    let sizer = PositionSizer::from_config(&config);

    let valr = report
        .opportunities
        .iter()
        .find(|o| o.exchange.as_str() == "valr")
        .unwrap();
    assert_eq!(detect_currency(valr.path.currencies()), Currency::Zar);

    let capped = sizer.size_for(dec!(1000), valr.path.currencies());
    assert_eq!(capped.breakdown.currency, Currency::Zar);
    assert_eq!(capped.amount, dec!(50));
    assert!(capped.can_trade);
    assert!(capped.warning.is_some());
    assert_eq!(capped.breakdown.applied_cap, AppliedCap::MaxTrade);

    let best = report.best_profitable().unwrap();
    let lost = sizer.size_for(dec!(50), best.path.currencies());
    assert_eq!(lost.amount, dec!(5));
    assert!(!lost.can_trade);
    assert!(lost.reason.is_some());

    let quote = RouteDispatcher::new(registry)
        .route_calculate_profit(best.exchange.as_str(), &best.path, capped.amount)
        .await
        .unwrap();
    assert_eq!(quote.end_amount, dec!(50.55));
}

#[tokio::test]
async fn stats_cover_every_registered_exchange() {
    let config = test_config();
    let registry = test_registry(&config);
    registry.initialize(&config.disabled_exchanges);

    ScanCoordinator::new(registry.clone(), Duration::from_millis(150))
        .scan_all(false)
        .await;

    let snapshot = StatsAggregator::new(registry).collect();
    assert_eq!(snapshot.total, 6);
    assert_eq!(snapshot.available, 5);
    assert_eq!(snapshot.active, 4);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["exchanges"]["binance"]["scans"], 1);
    assert_eq!(json["exchanges"]["kraken"]["available"], false);
    assert_eq!(json["exchanges"]["bitstamp"]["active"], false);
}

#[test]
fn re_registering_a_key_keeps_one_entry() {
    let registry = ExchangeRegistry::new();
    registry.register(
        "binance",
        Some(AdapterHandle::basic(SimulatedExchange::builder("binance").build())),
    );
    registry.register(
        "binance",
        Some(AdapterHandle::basic(SimulatedExchange::builder("binance").build())),
    );

    assert_eq!(registry.entries().len(), 1);
}
