//! Signal generation: market-only, position-agnostic.
//!
//! The signal engine never sees account or position state. It turns a stream
//! of prices into an `IndicatorState`; everything downstream only reads it.

pub mod engine;

pub use engine::{IndicatorState, SignalEngine};
