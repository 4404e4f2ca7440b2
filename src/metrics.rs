//! Prometheus metrics for scan latency and sizing outcomes.
//!
//! This module provides metrics for:
//! - Scan round latency
//! - Per-exchange scan failures and timeouts
//! - Discovered and profitable opportunities
//! - Sizing rejections and capped trades

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Scan round latency metric name.
pub const METRIC_SCAN_LATENCY: &str = "scan_round_latency_ms";
/// Adapter scan failures counter metric name.
pub const METRIC_ADAPTER_SCAN_FAILURES: &str = "adapter_scan_failures_total";
/// Adapter scan timeouts counter metric name.
pub const METRIC_ADAPTER_SCAN_TIMEOUTS: &str = "adapter_scan_timeouts_total";
/// Opportunities discovered counter metric name.
pub const METRIC_OPPORTUNITIES_DISCOVERED: &str = "opportunities_discovered_total";
/// Profitable opportunities counter metric name.
pub const METRIC_PROFITABLE_OPPORTUNITIES: &str = "profitable_opportunities_total";
/// Sizing rejections counter metric name.
pub const METRIC_SIZING_REJECTIONS: &str = "sizing_rejections_total";
/// Capped sizing counter metric name.
pub const METRIC_SIZING_CAPPED: &str = "sizing_capped_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_SCAN_LATENCY,
        "Time for a full multi-exchange scan round in milliseconds"
    );

    describe_counter!(
        METRIC_ADAPTER_SCAN_FAILURES,
        "Total number of exchange scans that failed"
    );
    describe_counter!(
        METRIC_ADAPTER_SCAN_TIMEOUTS,
        "Total number of exchange scans that timed out"
    );
    describe_counter!(
        METRIC_OPPORTUNITIES_DISCOVERED,
        "Total number of triangular opportunities discovered"
    );
    describe_counter!(
        METRIC_PROFITABLE_OPPORTUNITIES,
        "Total number of opportunities above the profit threshold"
    );
    describe_counter!(
        METRIC_SIZING_REJECTIONS,
        "Total number of trades refused for being below the minimum"
    );
    describe_counter!(
        METRIC_SIZING_CAPPED,
        "Total number of trades reduced to the max trade amount"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and describe all metrics.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record scan round latency.
pub fn record_scan_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_SCAN_LATENCY).record(latency_ms);
}

/// Increment adapter scan failures for an exchange.
pub fn inc_adapter_scan_failures(exchange: &str) {
    counter!(METRIC_ADAPTER_SCAN_FAILURES, "exchange" => exchange.to_string()).increment(1);
}

/// Increment adapter scan timeouts for an exchange.
pub fn inc_adapter_scan_timeouts(exchange: &str) {
    counter!(METRIC_ADAPTER_SCAN_TIMEOUTS, "exchange" => exchange.to_string()).increment(1);
}

/// Add to the discovered opportunities counter.
pub fn inc_opportunities_discovered(count: u64) {
    counter!(METRIC_OPPORTUNITIES_DISCOVERED).increment(count);
}

/// Add to the profitable opportunities counter.
pub fn inc_profitable_opportunities(count: u64) {
    counter!(METRIC_PROFITABLE_OPPORTUNITIES).increment(count);
}

/// Increment sizing rejections for a currency.
pub fn inc_sizing_rejections(currency: &'static str) {
    counter!(METRIC_SIZING_REJECTIONS, "currency" => currency).increment(1);
}

/// Increment capped sizing decisions for a currency.
pub fn inc_sizing_capped(currency: &'static str) {
    counter!(METRIC_SIZING_CAPPED, "currency" => currency).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_record_into_installed_recorder() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            inc_adapter_scan_failures("binance");
            inc_adapter_scan_failures("binance");
            inc_sizing_capped("ZAR");
            record_scan_latency(Instant::now());
        });

        let rendered = handle.render();
        assert!(rendered.contains(&format!(
            "{METRIC_ADAPTER_SCAN_FAILURES}{{exchange=\"binance\"}} 2"
        )));
        assert!(rendered.contains(&format!("{METRIC_SIZING_CAPPED}{{currency=\"ZAR\"}} 1")));
        assert!(rendered.contains(METRIC_SCAN_LATENCY));
    }
}
