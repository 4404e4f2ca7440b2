//! Capability contract every exchange integration implements.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::types::{ExecutionReport, Opportunity, ProfitQuote, TradePath};
use crate::error::AdapterError;

/// Async capabilities an exchange integration exposes to the coordinator.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Human-readable adapter name.
    fn name(&self) -> &str;

    /// Scan the exchange for triangular cycles.
    async fn scan_opportunities(&self, show_activity: bool)
        -> Result<Vec<Opportunity>, AdapterError>;

    /// Price a path for a given start amount.
    async fn calculate_profit(
        &self,
        path: &TradePath,
        amount: Decimal,
    ) -> Result<ProfitQuote, AdapterError>;

    /// Execute a previously discovered opportunity.
    async fn execute_opportunity(
        &self,
        opportunity: &Opportunity,
    ) -> Result<ExecutionReport, AdapterError>;
}

/// Optional synchronous statistics capability.
pub trait StatsProvider: Send + Sync {
    /// Adapter-defined statistics payload.
    fn get_stats(&self) -> Result<serde_json::Value, AdapterError>;
}

/// Whether an adapter also reports statistics.
#[derive(Clone)]
pub enum Capability {
    /// Adapter exposes [`StatsProvider`].
    WithStats(Arc<dyn StatsProvider>),
    /// Scan/profit/execute only.
    Basic,
}

/// Capability handle stored in the registry.
#[derive(Clone)]
pub struct AdapterHandle {
    adapter: Arc<dyn ExchangeAdapter>,
    capability: Capability,
}

impl AdapterHandle {
    /// Wrap an adapter without a stats capability.
    pub fn basic<A>(adapter: A) -> Self
    where
        A: ExchangeAdapter + 'static,
    {
        Self {
            adapter: Arc::new(adapter),
            capability: Capability::Basic,
        }
    }

    /// Wrap an adapter that also reports statistics.
    pub fn with_stats<A>(adapter: A) -> Self
    where
        A: ExchangeAdapter + StatsProvider + 'static,
    {
        Self::from_shared_with_stats(Arc::new(adapter))
    }

    /// Wrap an already shared adapter that reports statistics.
    pub fn from_shared_with_stats<A>(adapter: Arc<A>) -> Self
    where
        A: ExchangeAdapter + StatsProvider + 'static,
    {
        let stats: Arc<dyn StatsProvider> = adapter.clone();
        Self {
            adapter,
            capability: Capability::WithStats(stats),
        }
    }

    /// The async capability set.
    pub fn adapter(&self) -> &Arc<dyn ExchangeAdapter> {
        &self.adapter
    }

    /// The optional stats capability.
    pub fn capability(&self) -> &Capability {
        &self.capability
    }
}

impl fmt::Debug for AdapterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterHandle")
            .field("adapter", &self.adapter.name())
            .field(
                "stats",
                &matches!(self.capability, Capability::WithStats(_)),
            )
            .finish()
    }
}
