//! Arbitrage module for discovering opportunities across exchanges.
//!
//! This module handles:
//! - Routing single-exchange scan/profit/execute calls
//! - Concurrent multi-exchange scanning with failure isolation
//! - Per-exchange status collection

pub mod dispatcher;
pub mod scanner;
pub mod stats;

pub use dispatcher::RouteDispatcher;
pub use scanner::{rank, AdapterScanOutcome, ScanCoordinator, ScanReport, ScanStatus};
pub use stats::{ExchangeStatus, StatsAggregator, StatsSnapshot};
