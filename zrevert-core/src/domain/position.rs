use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Sign applied to a base size: +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    /// Direction implied by a signed base size. `None` when flat.
    pub fn from_size(size_base: f64) -> Option<Self> {
        if size_base > 0.0 {
            Some(Direction::Long)
        } else if size_base < 0.0 {
            Some(Direction::Short)
        } else {
            None
        }
    }
}

/// Held position for a single market.
///
/// `size_base` is signed (0 = flat, >0 long, <0 short). `entry_price` is only
/// meaningful while positioned and is cleared whenever the size returns to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub size_base: f64,
    pub entry_price: Option<f64>,
}

impl PositionState {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.size_base == 0.0
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::from_size(self.size_base)
    }

    /// Notional currently in use at `price`.
    pub fn capital_in_use(&self, price: f64) -> f64 {
        self.size_base.abs() * price
    }

    /// Unrealised PnL at `price`, signed so that a gain is positive for either side.
    ///
    /// `None` when flat or when the entry price is unknown.
    pub fn estimated_pnl(&self, price: f64) -> Option<f64> {
        if self.is_flat() {
            return None;
        }
        self.entry_price.map(|entry| self.size_base * (price - entry))
    }

    /// Notional at entry, `|size| * entry_price`.
    pub fn initial_value(&self) -> Option<f64> {
        self.entry_price.map(|entry| self.size_base.abs() * entry)
    }
}
