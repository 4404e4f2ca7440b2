//! Single-exchange call routing.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::error::ExchangeError;
use crate::exchange::{
    ExchangeAdapter, ExchangeRegistry, ExecutionReport, Opportunity, ProfitQuote, RegistryEntry,
    TradePath,
};

/// Routes a call to exactly one exchange adapter.
///
/// Adapter failures are returned unchanged; nothing is retried or downgraded.
#[derive(Debug, Clone)]
pub struct RouteDispatcher {
    registry: Arc<ExchangeRegistry>,
}

impl RouteDispatcher {
    /// Create a dispatcher over a shared registry.
    pub fn new(registry: Arc<ExchangeRegistry>) -> Self {
        Self { registry }
    }

    /// Scan one exchange. A disabled exchange yields no opportunities.
    #[instrument(skip(self), fields(exchange = %key))]
    pub async fn route_scan(
        &self,
        key: &str,
        show_activity: bool,
    ) -> Result<Vec<Opportunity>, ExchangeError> {
        let entry = self.registry.resolve(key)?;
        if !entry.active {
            debug!("Exchange disabled, skipping scan");
            return Ok(Vec::new());
        }

        let adapter = loaded(&entry)?;
        Ok(adapter.scan_opportunities(show_activity).await?)
    }

    /// Price a path on one exchange. Does not consult the enable flag.
    #[instrument(skip(self, path), fields(exchange = %key, path = %path))]
    pub async fn route_calculate_profit(
        &self,
        key: &str,
        path: &TradePath,
        amount: Decimal,
    ) -> Result<ProfitQuote, ExchangeError> {
        let entry = self.registry.resolve(key)?;
        let adapter = loaded(&entry)?;
        Ok(adapter.calculate_profit(path, amount).await?)
    }

    /// Execute an opportunity on one exchange. Disabled exchanges refuse.
    #[instrument(skip(self, opportunity), fields(exchange = %key, path = %opportunity.path))]
    pub async fn route_execute(
        &self,
        key: &str,
        opportunity: &Opportunity,
    ) -> Result<ExecutionReport, ExchangeError> {
        let entry = self.registry.resolve(key)?;
        if !entry.active {
            return Err(ExchangeError::Disabled {
                key: entry.key.to_string(),
            });
        }

        let adapter = loaded(&entry)?;
        Ok(adapter.execute_opportunity(opportunity).await?)
    }
}

fn loaded(entry: &RegistryEntry) -> Result<&Arc<dyn ExchangeAdapter>, ExchangeError> {
    entry.adapter().ok_or_else(|| ExchangeError::Unavailable {
        key: entry.key.to_string(),
    })
}
