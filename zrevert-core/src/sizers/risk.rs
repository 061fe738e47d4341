//! Leverage-aware risk-per-trade sizer.
//!
//! # Formula
//! ```text
//! buying_power      = total_collateral * leverage
//! desired_value     = buying_power * risk_per_trade
//! desired_size      = floor_to_decimals(desired_value / price)
//! trade_size        = max(desired_size, min_step)
//! max_allowed_cap   = total_collateral * max_portfolio_allocation
//! ```
//!
//! Truncation, never rounding up: the computed size may undershoot the
//! target but never exceed it. The venue minimum step always wins.

use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;

/// Slack for binary representation error when flooring (0.29 * 100 = 28.999…).
const FLOOR_SLACK: f64 = 1e-9;

/// Sizer output for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingDecision {
    /// Order size in base units.
    pub trade_size_base: f64,
    /// Capital ceiling gating new entries.
    pub max_allowed_capital: f64,
    /// Target notional per trade before truncation; basis for fee estimates.
    pub desired_value: f64,
}

#[derive(Debug, Clone)]
pub struct RiskSizer {
    leverage: f64,
    risk_per_trade: f64,
    max_portfolio_allocation: f64,
    size_decimals: u32,
}

impl RiskSizer {
    pub fn new(
        leverage: f64,
        risk_per_trade: f64,
        max_portfolio_allocation: f64,
        size_decimals: u32,
    ) -> Self {
        Self {
            leverage,
            risk_per_trade,
            max_portfolio_allocation,
            size_decimals,
        }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(
            config.leverage,
            config.risk_per_trade,
            config.max_portfolio_allocation,
            config.size_decimals,
        )
    }

    /// Size a trade. Pure function of its inputs.
    ///
    /// Non-positive collateral yields a zero capital ceiling (blocking entries);
    /// a non-positive price yields a zero desired size, so `min_step` applies.
    pub fn size(&self, total_collateral: f64, current_price: f64, min_step: f64) -> SizingDecision {
        let collateral = total_collateral.max(0.0);
        let desired_value = collateral * self.leverage * self.risk_per_trade;

        let desired_size = if current_price > 0.0 {
            floor_to_decimals(desired_value / current_price, self.size_decimals)
        } else {
            0.0
        };

        SizingDecision {
            trade_size_base: desired_size.max(min_step),
            max_allowed_capital: collateral * self.max_portfolio_allocation,
            desired_value,
        }
    }
}

/// Truncate toward zero at `decimals` places.
pub fn floor_to_decimals(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    let scale = 10f64.powi(decimals as i32);
    (value * scale + FLOOR_SLACK).floor() / scale
}
