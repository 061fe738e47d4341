//! Position sizing: turns account collateral into an admissible order size.
//!
//! Sizers are account-aware (collateral, leverage) but signal-agnostic: they
//! never decide whether to trade, only how much.

pub mod risk;

pub use risk::{RiskSizer, SizingDecision};
