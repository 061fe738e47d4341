//! zrevert core: the synchronous decision kernel of a single-market
//! mean-reversion perp bot.
//!
//! This crate contains everything that decides, and nothing that talks to a venue:
//! - Domain types (direction, position state, config fingerprint)
//! - `RiskConfig`: the single versioned parameter bundle
//! - Streaming EMA / dispersion / z-score signal engine over a bounded price window
//! - Risk sizer (leverage, risk-per-trade, step-size truncation, capital ceiling)
//! - Position manager with layered exits (stop-loss, take-profit, signal reversion)
//!
//! The async tick cycle and the scheduler live in `zrevert-runner`.

pub mod config;
pub mod domain;
pub mod indicators;
pub mod position_management;
pub mod signals;
pub mod sizers;

pub use config::{ConfigError, RiskConfig, RISK_CONFIG_SCHEMA_VERSION};
pub use domain::{ConfigHash, Direction, PositionState};
pub use position_management::{Action, ExitReason, FeeCache, HoldReason, PositionManager};
pub use signals::{IndicatorState, SignalEngine};
pub use sizers::{RiskSizer, SizingDecision};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: decision types can move into the runner's tokio task.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<RiskConfig>();
        require_sync::<RiskConfig>();
        require_send::<SignalEngine>();
        require_sync::<SignalEngine>();
        require_send::<PositionManager>();
        require_sync::<PositionManager>();
        require_send::<RiskSizer>();
        require_sync::<RiskSizer>();
        require_send::<Action>();
        require_sync::<Action>();
        require_send::<IndicatorState>();
        require_sync::<IndicatorState>();
    }

    /// Architecture contract: the position manager only reads indicator output.
    ///
    /// `decide()` takes `&IndicatorState`, never `&mut SignalEngine`, so the
    /// signal engine stays the sole mutator of the price window.
    #[test]
    fn decide_reads_indicator_state_by_shared_reference() {
        fn _check(
            pm: &PositionManager,
            indicator: &IndicatorState,
            sizing: &SizingDecision,
        ) -> Action {
            pm.decide(indicator, sizing, 100.0)
        }
    }
}
