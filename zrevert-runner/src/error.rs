//! Error taxonomy for the tick cycle and the scheduler.
//!
//! Data and execution errors are contained within a tick and reduce to a
//! no-op; only `SchedulerError` propagates to the caller.

use thiserror::Error;

use zrevert_core::ConfigError;

/// Failure reported by a market-data or execution port.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortError {
    #[error("{0} unavailable")]
    Unavailable(String),

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Why a tick ended without completing its decision.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickError {
    /// A fetch failed or returned an unusable value. Retried next tick.
    #[error("data unavailable ({what}): {reason}")]
    DataUnavailable { what: &'static str, reason: String },

    /// Positioned but entry price or fee unknown. Entries are skipped.
    #[error("indeterminate position state: {0}")]
    IndeterminateState(String),

    /// The venue did not confirm an order. Position state is unchanged.
    #[error("execution failure: {0}")]
    ExecutionFailure(#[source] PortError),
}

impl TickError {
    pub fn data(what: &'static str, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            what,
            reason: reason.into(),
        }
    }

    /// Short category label for logs and stats.
    pub fn category(&self) -> &'static str {
        match self {
            TickError::DataUnavailable { .. } => "data_unavailable",
            TickError::IndeterminateState(_) => "indeterminate_state",
            TickError::ExecutionFailure(_) => "execution_failure",
        }
    }
}

/// Errors that prevent the scheduler from reaching Running.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("fatal init: {0}")]
    FatalInit(String),

    #[error("fatal init: {0}")]
    Config(#[from] ConfigError),
}
