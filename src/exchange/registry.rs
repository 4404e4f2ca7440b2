//! In-memory table of exchange adapters and their availability flags.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::adapter::{AdapterHandle, ExchangeAdapter};
use super::types::ExchangeKey;
use crate::error::ExchangeError;

/// One registry row.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Normalized key.
    pub key: ExchangeKey,
    /// Capability handle, if the adapter is loaded.
    pub handle: Option<AdapterHandle>,
    /// Operator-controlled enable flag.
    pub active: bool,
}

impl RegistryEntry {
    /// Adapter is loaded.
    pub fn is_available(&self) -> bool {
        self.handle.is_some()
    }

    /// Available and switched on.
    pub fn is_scannable(&self) -> bool {
        self.is_available() && self.active
    }

    /// Async capability set, if loaded.
    pub fn adapter(&self) -> Option<&Arc<dyn ExchangeAdapter>> {
        self.handle.as_ref().map(AdapterHandle::adapter)
    }
}

/// Exchange counts reported after initialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    /// Registered keys.
    pub total: usize,
    /// Keys with a loaded adapter.
    pub available: usize,
    /// Available keys that are switched on.
    pub active: usize,
}

/// Exchange registry shared by the dispatcher, coordinator and stats.
///
/// All entries sit behind a single lock, so scan selection always observes a
/// consistent snapshot even if configuration changes concurrently.
#[derive(Debug, Default)]
pub struct ExchangeRegistry {
    table: RwLock<BTreeMap<ExchangeKey, RegistryEntry>>,
    initialized: AtomicBool,
}

impl ExchangeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the adapter for `key`.
    ///
    /// Re-registering keeps the existing `active` flag. New keys start active.
    pub fn register(&self, key: impl Into<ExchangeKey>, handle: Option<AdapterHandle>) {
        let key = key.into();
        let mut table = self.table.write();

        match table.get_mut(&key) {
            Some(entry) => {
                debug!(exchange = %key, available = handle.is_some(), "Replacing adapter");
                entry.handle = handle;
            }
            None => {
                debug!(exchange = %key, available = handle.is_some(), "Registering adapter");
                table.insert(
                    key.clone(),
                    RegistryEntry {
                        key,
                        handle,
                        active: true,
                    },
                );
            }
        }
    }

    /// Toggle the operator enable flag.
    pub fn set_active(&self, key: &str, active: bool) -> Result<(), ExchangeError> {
        let key = ExchangeKey::new(key);
        let mut table = self.table.write();

        let entry = table
            .get_mut(&key)
            .ok_or_else(|| ExchangeError::UnknownExchange {
                key: key.to_string(),
            })?;
        entry.active = active;

        info!(exchange = %key, active, "Exchange activation changed");
        Ok(())
    }

    /// All entries with a loaded adapter, regardless of `active`.
    pub fn list(&self) -> Vec<RegistryEntry> {
        self.table
            .read()
            .values()
            .filter(|entry| entry.is_available())
            .cloned()
            .collect()
    }

    /// Snapshot of every entry in key order.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        self.table.read().values().cloned().collect()
    }

    /// Snapshot of a single entry.
    pub fn get(&self, key: &str) -> Option<RegistryEntry> {
        self.table.read().get(&ExchangeKey::new(key)).cloned()
    }

    /// Look up an entry that must exist and be loaded.
    pub fn resolve(&self, key: &str) -> Result<RegistryEntry, ExchangeError> {
        let key = ExchangeKey::new(key);
        let entry = self
            .table
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| ExchangeError::UnknownExchange {
                key: key.to_string(),
            })?;

        if !entry.is_available() {
            return Err(ExchangeError::Unavailable {
                key: key.to_string(),
            });
        }

        Ok(entry)
    }

    /// Adapters selected for a scan round: available and active.
    pub fn scan_targets(&self) -> Vec<(ExchangeKey, Arc<dyn ExchangeAdapter>)> {
        self.table
            .read()
            .values()
            .filter(|entry| entry.is_scannable())
            .filter_map(|entry| entry.adapter().map(|a| (entry.key.clone(), a.clone())))
            .collect()
    }

    /// Exchange counts.
    pub fn summary(&self) -> RegistrySummary {
        let table = self.table.read();
        RegistrySummary {
            total: table.len(),
            available: table.values().filter(|e| e.is_available()).count(),
            active: table.values().filter(|e| e.is_scannable()).count(),
        }
    }

    /// Apply startup configuration once all adapters are registered.
    ///
    /// Only the first call has any effect.
    pub fn initialize(&self, disabled: &[String]) -> RegistrySummary {
        if self.initialized.swap(true, Ordering::SeqCst) {
            warn!("Exchange registry already initialized, ignoring");
            return self.summary();
        }

        for key in disabled.iter().filter(|k| !k.trim().is_empty()) {
            if let Err(e) = self.set_active(key, false) {
                warn!(exchange = %key, error = %e, "Cannot disable exchange");
            }
        }

        for entry in self.entries() {
            info!(
                exchange = %entry.key,
                available = entry.is_available(),
                active = entry.active,
                "Exchange status"
            );
        }

        let summary = self.summary();
        info!(
            total = summary.total,
            available = summary.available,
            active = summary.active,
            "Exchange registry initialized"
        );
        summary
    }

    /// Whether [`initialize`](Self::initialize) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}
