//! Multi-exchange triangular arbitrage coordinator.
//!
//! This library discovers triangular arbitrage cycles across several
//! exchanges at once and turns them into capital-bounded trade sizes. It does
//! not fetch market data or decide when to trade; exchange integrations plug
//! in through the [`exchange::ExchangeAdapter`] contract.
//!
//! # Flow
//!
//! ```text
//! ExchangeRegistry ──► ScanCoordinator ──► ranked opportunities
//!        │                                        │
//!        └──► RouteDispatcher                     ▼
//!                                           PositionSizer ──► SizingResult
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`exchange`]: Adapter contract, registry and value types
//! - [`arbitrage`]: Routing, concurrent scanning and stats
//! - [`trading`]: Currency detection and position sizing
//! - [`api`]: HTTP API for health/metrics/status
//! - [`metrics`]: Prometheus metric helpers
//! - [`utils`]: Utility functions

pub mod api;
pub mod arbitrage;
pub mod config;
pub mod error;
pub mod exchange;
pub mod metrics;
pub mod trading;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
