//! Streaming indicator building blocks.
//!
//! - `PriceWindow`: bounded FIFO of the most recent price samples
//! - `Ema`: incremental exponential moving average with an SMA seed
//! - `dispersion_around`: population RMS deviation of samples from a given centre
//!
//! `SignalEngine` composes these into the z-score signal.

pub mod ema;
pub mod window;

pub use ema::{dispersion_around, ema_of_series, Ema};
pub use window::PriceWindow;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
