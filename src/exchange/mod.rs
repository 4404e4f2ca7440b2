//! Exchange module: adapter contract, registry and value types.
//!
//! This module handles:
//! - The async capability contract exchange integrations implement
//! - The registry of adapters with availability/activation flags
//! - Opportunity and trade path types
//! - A simulated adapter for testing

pub mod adapter;
pub mod registry;
pub mod simulated;
pub mod types;

pub use adapter::{AdapterHandle, Capability, ExchangeAdapter, StatsProvider};
pub use registry::{ExchangeRegistry, RegistryEntry, RegistrySummary};
pub use simulated::{SimulatedConfig, SimulatedExchange, SimulatedExchangeBuilder};
pub use types::{
    ExchangeKey, ExecutionReport, ExecutionStatus, Opportunity, ProfitQuote, Side, TradePath,
    TradeStep,
};
