//! What a tick decides to do.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Direction;

/// Why a tick resolved to no trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldReason {
    /// Fewer than `period` samples, or zero dispersion.
    SignalUndefined,
    /// Positioned but entry price or fee is unknown; exits cannot be evaluated.
    IndeterminateState,
    /// Positioned and no exit rule fired.
    NoExit,
    /// Flat but capital in use already meets the allocation ceiling.
    CapitalCeiling,
    /// Flat and the taker fee is unknown.
    FeeUnknown,
    /// Flat and |z| is inside the entry band.
    NoEntry,
    /// Entry signal, but the sizer produced no positive order size.
    ZeroSize,
}

/// Which exit rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    SignalReversion,
}

/// Outcome of `PositionManager::decide`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Hold(HoldReason),
    Enter { direction: Direction, size_base: f64 },
    Exit(ExitReason),
}

impl Action {
    pub fn is_hold(&self) -> bool {
        matches!(self, Action::Hold(_))
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Action::Exit(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Hold(reason) => write!(f, "hold ({reason:?})"),
            Action::Enter {
                direction,
                size_base,
            } => write!(f, "enter {direction:?} {size_base}"),
            Action::Exit(reason) => write!(f, "exit ({reason:?})"),
        }
    }
}
