//! Streaming mean-reversion signal: EMA, dispersion around the EMA, z-score.
//!
//! Per observed price:
//! 1. push into the bounded window
//! 2. seed the EMA from the last `period` samples once available, else step it
//! 3. dispersion = sqrt(mean((x - EMA)^2)) over the last `period` samples
//! 4. z = (price - EMA) / dispersion, undefined when dispersion is zero
//!
//! Every field is undefined until the window holds `period` samples. That
//! gate is the hard precondition for all trading logic.

use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::indicators::{dispersion_around, Ema, PriceWindow};

/// Relative size below which dispersion is treated as exactly zero.
///
/// A run of identical prices can leave a residue of a few ULPs in the SMA
/// seed; that must not turn into a huge z-score.
const ZERO_DISPERSION_TOLERANCE: f64 = 1e-12;

/// Indicator output for one observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorState {
    pub mean: Option<f64>,
    pub dispersion: Option<f64>,
    pub z_score: Option<f64>,
}

impl IndicatorState {
    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn is_tradeable(&self) -> bool {
        self.z_score.is_some()
    }
}

/// Owns the price window and EMA state for one trading session.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    period: usize,
    window: PriceWindow,
    ema: Ema,
    last: IndicatorState,
}

impl SignalEngine {
    pub fn new(period: usize, max_window: usize) -> Self {
        assert!(period >= 1, "period must be >= 1");
        assert!(max_window >= period, "max_window must be >= period");
        Self {
            period,
            window: PriceWindow::new(max_window),
            ema: Ema::new(period),
            last: IndicatorState::undefined(),
        }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config.period, config.max_window)
    }

    /// Feed one price and return the updated indicator state.
    ///
    /// Non-finite prices yield an undefined state without touching the
    /// window or the EMA.
    pub fn observe(&mut self, price: f64) -> IndicatorState {
        if !price.is_finite() {
            self.last = IndicatorState::undefined();
            return self.last;
        }

        self.window.push(price);
        if self.window.len() < self.period {
            self.last = IndicatorState::undefined();
            return self.last;
        }

        let mean = match self.ema.value() {
            Some(_) => self.ema.update(price),
            None => self.window.tail(self.period).map(|seed| self.ema.seed(seed)),
        };
        let Some(mean) = mean else {
            self.last = IndicatorState::undefined();
            return self.last;
        };

        let dispersion = self
            .window
            .tail(self.period)
            .and_then(|recent| dispersion_around(recent, mean))
            .map(|d| {
                if d <= ZERO_DISPERSION_TOLERANCE * mean.abs().max(1.0) {
                    0.0
                } else {
                    d
                }
            });

        let z_score = match dispersion {
            Some(d) if d > 0.0 => Some((price - mean) / d),
            _ => None,
        };

        self.last = IndicatorState {
            mean: Some(mean),
            dispersion,
            z_score,
        };
        self.last
    }

    /// Most recent indicator output (undefined before the first full window).
    pub fn last(&self) -> IndicatorState {
        self.last
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn window_capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Clear the window and EMA; the engine then behaves like a fresh one.
    pub fn reset(&mut self) {
        self.window.clear();
        self.ema.reset();
        self.last = IndicatorState::undefined();
    }
}
