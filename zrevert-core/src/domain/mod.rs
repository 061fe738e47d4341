//! Domain types shared by the signal, sizing and position layers.

pub mod ids;
pub mod position;

pub use ids::ConfigHash;
pub use position::{Direction, PositionState};
