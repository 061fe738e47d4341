//! Serializable session configuration (TOML).
//!
//! ```toml
//! market_id = 0
//! tick_interval_ms = 5000
//!
//! [risk]
//! period = 21
//! max_window = 90
//! entry_z = 2.0
//! exit_z = 0.5
//! ```
//!
//! Omitted fields take their defaults; the result is always validated.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use zrevert_core::{ConfigError, RiskConfig};

use crate::ports::MarketId;

/// Default tick cadence.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub market_id: MarketId,
    pub tick_interval_ms: u64,
    pub risk: RiskConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            market_id: 0,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            risk: RiskConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_interval_ms",
                reason: "must be > 0".into(),
            });
        }
        self.risk.validate()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.tick_interval(), Duration::from_secs(5));
    }

    #[test]
    fn partial_risk_table_overrides_only_named_fields() {
        let text = r#"
market_id = 7
tick_interval_ms = 1000

[risk]
period = 30
entry_z = 2.5
"#;
        let config = SessionConfig::from_toml_str(text).unwrap();
        assert_eq!(config.market_id, 7);
        assert_eq!(config.risk.period, 30);
        assert_eq!(config.risk.entry_z, 2.5);
        assert_eq!(config.risk.exit_z, RiskConfig::default().exit_z);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = SessionConfig::from_toml_str("tick_interval_ms = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "tick_interval_ms",
                ..
            }
        ));

        let err = SessionConfig::from_toml_str("[risk]\nperiod = 100\nmax_window = 50").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_window", .. }));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = SessionConfig::from_toml_str("market_id = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let config = SessionConfig {
            market_id: 3,
            tick_interval_ms: 250,
            risk: RiskConfig {
                max_confidence_fraction: Some(0.01),
                ..RiskConfig::default()
            },
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(SessionConfig::from_toml_str(&text).unwrap(), config);
    }
}
