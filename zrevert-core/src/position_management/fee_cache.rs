/// Taker fee, fetched once per run and memoised until an explicit reset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeeCache {
    taker_fee_fraction: Option<f64>,
}

impl FeeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn taker_fee(&self) -> Option<f64> {
        self.taker_fee_fraction
    }

    pub fn is_known(&self) -> bool {
        self.taker_fee_fraction.is_some()
    }

    /// Store a fee. Non-finite or negative values are not cached.
    pub fn set(&mut self, fraction: f64) -> bool {
        if fraction.is_finite() && fraction >= 0.0 {
            self.taker_fee_fraction = Some(fraction);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.taker_fee_fraction = None;
    }
}
