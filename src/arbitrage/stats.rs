//! Per-exchange status collection.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::exchange::{Capability, ExchangeRegistry, RegistryEntry};

/// Status recorded for one exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExchangeStatus {
    /// Payload returned by the adapter, verbatim.
    Reported(serde_json::Value),
    /// Synthesized from the registry flags.
    Minimal {
        /// Adapter is loaded.
        available: bool,
        /// Operator enable flag.
        active: bool,
    },
}

/// Statistics across all registered exchanges.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Status keyed by exchange.
    pub exchanges: BTreeMap<String, ExchangeStatus>,
    /// Registered exchanges.
    pub total: usize,
    /// Exchanges with a loaded adapter.
    pub available: usize,
    /// Available exchanges switched on.
    pub active: usize,
    /// When collected.
    #[serde(with = "time::serde::rfc3339")]
    pub collected_at: OffsetDateTime,
}

/// Collects status for every registered exchange.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    registry: Arc<ExchangeRegistry>,
}

impl StatsAggregator {
    /// Create an aggregator over a shared registry.
    pub fn new(registry: Arc<ExchangeRegistry>) -> Self {
        Self { registry }
    }

    /// Collect a snapshot. Never fails.
    pub fn collect(&self) -> StatsSnapshot {
        let entries = self.registry.entries();

        let exchanges = entries
            .iter()
            .map(|entry| (entry.key.to_string(), status_of(entry)))
            .collect();

        StatsSnapshot {
            exchanges,
            total: entries.len(),
            available: entries.iter().filter(|e| e.is_available()).count(),
            active: entries.iter().filter(|e| e.is_scannable()).count(),
            collected_at: OffsetDateTime::now_utc(),
        }
    }
}

fn status_of(entry: &RegistryEntry) -> ExchangeStatus {
    let minimal = ExchangeStatus::Minimal {
        available: entry.is_available(),
        active: entry.active,
    };

    let Some(handle) = &entry.handle else {
        return minimal;
    };

    match handle.capability() {
        Capability::WithStats(provider) => match provider.get_stats() {
            Ok(stats) => ExchangeStatus::Reported(stats),
            Err(e) => {
                warn!(exchange = %entry.key, error = %e, "Stats unavailable");
                minimal
            }
        },
        Capability::Basic => minimal,
    }
}
