//! Risk configuration: the one parameter bundle every decision reads.
//!
//! Signal lookback, thresholds and risk fractions used to drift between code
//! paths; here they are a single immutable, serialisable struct with a schema
//! version and a content fingerprint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ConfigHash;

/// Current schema version of `RiskConfig`.
pub const RISK_CONFIG_SCHEMA_VERSION: u32 = 1;

/// Configuration errors. Any of these prevents a session from starting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("unsupported config schema version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config I/O error: {0}")]
    Io(String),
}

/// Immutable strategy and risk parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub schema_version: u32,

    /// EMA / dispersion lookback in samples.
    pub period: usize,
    /// Price window capacity. Must be >= `period`.
    pub max_window: usize,

    /// Enter when |z| exceeds this.
    pub entry_z: f64,
    /// Signal exit once z has reverted inside this band on the entry side.
    pub exit_z: f64,

    /// Fraction of buying power committed per trade.
    pub risk_per_trade: f64,
    /// Fraction of total collateral that may be in use before entries stop.
    pub max_portfolio_allocation: f64,
    /// Profit over round-trip fees required for a signal exit, as a fraction of entry value.
    pub min_profit: f64,
    /// Stop-loss distance as a fraction of entry value.
    pub max_loss: f64,
    /// Percentage take-profit as a fraction of entry value.
    pub take_profit: f64,
    /// Buying power multiplier on total collateral.
    pub leverage: f64,

    /// Base-asset size precision (decimal places) for order truncation.
    pub size_decimals: u32,

    /// Reject quotes whose `confidence / price` exceeds this fraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_confidence_fraction: Option<f64>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            schema_version: RISK_CONFIG_SCHEMA_VERSION,
            period: 21,
            max_window: 90,
            entry_z: 2.0,
            exit_z: 0.5,
            risk_per_trade: 0.05,
            max_portfolio_allocation: 0.5,
            min_profit: 0.002,
            max_loss: 0.05,
            take_profit: 0.05,
            leverage: 3.0,
            size_decimals: 2,
            max_confidence_fraction: None,
        }
    }
}

impl RiskConfig {
    /// Check every field; the first violation is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != RISK_CONFIG_SCHEMA_VERSION {
            return Err(ConfigError::SchemaVersion {
                found: self.schema_version,
                expected: RISK_CONFIG_SCHEMA_VERSION,
            });
        }
        if self.period < 2 {
            return invalid("period", format!("must be >= 2, got {}", self.period));
        }
        if self.max_window < self.period {
            return invalid(
                "max_window",
                format!("must be >= period ({}), got {}", self.period, self.max_window),
            );
        }
        positive_finite("entry_z", self.entry_z)?;
        positive_finite("exit_z", self.exit_z)?;
        if self.exit_z > self.entry_z {
            return invalid(
                "exit_z",
                format!("must be <= entry_z ({}), got {}", self.entry_z, self.exit_z),
            );
        }
        unit_fraction("risk_per_trade", self.risk_per_trade)?;
        unit_fraction("max_portfolio_allocation", self.max_portfolio_allocation)?;
        unit_fraction("min_profit", self.min_profit)?;
        unit_fraction("max_loss", self.max_loss)?;
        unit_fraction("take_profit", self.take_profit)?;
        positive_finite("leverage", self.leverage)?;
        if self.size_decimals > 12 {
            return invalid(
                "size_decimals",
                format!("must be <= 12, got {}", self.size_decimals),
            );
        }
        if let Some(frac) = self.max_confidence_fraction {
            unit_fraction("max_confidence_fraction", frac)?;
        }
        Ok(())
    }

    /// EMA smoothing factor, `2 / (period + 1)`.
    pub fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// Content fingerprint of the full parameter set.
    pub fn fingerprint(&self) -> ConfigHash {
        // Field order is fixed by the struct definition, so the JSON is canonical.
        let json = serde_json::to_string(self).unwrap_or_default();
        ConfigHash::from_bytes(json.as_bytes())
    }
}

fn invalid(field: &'static str, reason: String) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid { field, reason })
}

fn positive_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return invalid(field, format!("must be finite and > 0, got {value}"));
    }
    Ok(())
}

fn unit_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return invalid(field, format!("must be in (0, 1], got {value}"));
    }
    Ok(())
}
