//! Unified error types for the arbitrage coordinator.

use thiserror::Error;

/// Unified error type for the arbitrage coordinator.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Exchange routing error.
    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    /// Malformed trade path.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by single-exchange routed calls.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Key is not present in the registry.
    #[error("unknown exchange: {key}")]
    UnknownExchange {
        /// Normalized exchange key.
        key: String,
    },

    /// Key is registered but no capability handle is loaded.
    #[error("exchange {key} is not available")]
    Unavailable {
        /// Normalized exchange key.
        key: String,
    },

    /// Key is available but switched off by the operator.
    #[error("exchange {key} is disabled")]
    Disabled {
        /// Normalized exchange key.
        key: String,
    },

    /// The adapter itself rejected the call.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Failures reported by an exchange adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Network request failed.
    #[error("network failure: {0}")]
    Network(String),

    /// Exchange answered with something we could not use.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Call did not settle in time.
    #[error("timed out after {after_ms}ms")]
    Timeout {
        /// Timeout that expired.
        after_ms: u64,
    },

    /// Exchange refused the request.
    #[error("rejected by exchange: {0}")]
    Rejected(String),
}

/// Trade path construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Fewer than three hops.
    #[error("path needs at least 3 hops, got {hops}")]
    TooShort {
        /// Number of hops supplied.
        hops: usize,
    },

    /// Last currency differs from the first.
    #[error("path does not return to {start}: ends at {end}")]
    NotACycle {
        /// Starting currency.
        start: String,
        /// Final currency.
        end: String,
    },

    /// Step count does not match the currency hops.
    #[error("expected {expected} steps, got {actual}")]
    StepMismatch {
        /// Hops implied by the currency list.
        expected: usize,
        /// Steps supplied.
        actual: usize,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
