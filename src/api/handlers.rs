//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::arbitrage::{ScanReport, StatsAggregator};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether at least one scan round has completed.
    pub ready: Arc<AtomicBool>,
    /// Most recent scan round.
    pub last_scan: Arc<RwLock<Option<ScanReport>>>,
    /// Per-exchange status collector.
    pub stats: StatsAggregator,
    /// Prometheus handle, if a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(stats: StatsAggregator, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            last_scan: Arc::new(RwLock::new(None)),
            stats,
            metrics,
        }
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Store the latest scan round and mark the service ready.
    pub async fn publish_scan(&self, report: ScanReport) {
        *self.last_scan.write().await = Some(report);
        self.set_ready(true);
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether service is ready.
    pub ready: bool,
    /// Opportunities in the last scan round.
    pub opportunities: Option<usize>,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 once a scan has completed, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let opportunities = state
        .last_scan
        .read()
        .await
        .as_ref()
        .map(|r| r.opportunities.len());

    let response = ReadyResponse {
        ready: is_ready,
        opportunities,
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Exchange stats handler.
pub async fn exchanges(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.stats.collect())
}

/// Latest scan round, 404 before the first round.
pub async fn opportunities(State(state): State<AppState>) -> impl IntoResponse {
    match state.last_scan.read().await.clone() {
        Some(report) => (StatusCode::OK, Json(Some(report))),
        None => (StatusCode::NOT_FOUND, Json(None)),
    }
}

/// Prometheus exposition handler.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
