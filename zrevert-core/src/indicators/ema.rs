//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * price[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: SMA of the most recent `period` samples at the moment enough samples exist.

/// Incremental EMA state.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            value: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_seeded(&self) -> bool {
        self.value.is_some()
    }

    /// Seed from the simple average of `seed_window` (the last `period` samples).
    pub fn seed<I: IntoIterator<Item = f64>>(&mut self, seed_window: I) -> f64 {
        let (sum, count) = seed_window
            .into_iter()
            .fold((0.0, 0usize), |(s, n), p| (s + p, n + 1));
        debug_assert_eq!(count, self.period, "seed window must hold exactly `period` samples");
        let seed = sum / count.max(1) as f64;
        self.value = Some(seed);
        seed
    }

    /// Advance one step. Returns `None` until seeded.
    pub fn update(&mut self, price: f64) -> Option<f64> {
        let prev = self.value?;
        let next = self.alpha * price + (1.0 - self.alpha) * prev;
        self.value = Some(next);
        Some(next)
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Compute batch EMA values over a full series.
///
/// NaN before index `period - 1`. Same seeding rule as the streaming `Ema`,
/// which makes it a reference for replaying a price history.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < period || period == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    let seed = values.iter().take(period).sum::<f64>() / period as f64;
    result[period - 1] = seed;

    let mut prev = seed;
    for i in period..n {
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}

/// Population RMS deviation of `samples` from `center` (divide by N).
///
/// Note the centre is supplied, not the samples' own mean.
pub fn dispersion_around<I: IntoIterator<Item = f64>>(samples: I, center: f64) -> Option<f64> {
    let (sum_sq, count) = samples
        .into_iter()
        .fold((0.0, 0usize), |(s, n), p| (s + (p - center).powi(2), n + 1));
    if count == 0 {
        return None;
    }
    Some((sum_sq / count as f64).sqrt())
}
