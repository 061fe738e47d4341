//! zrevert runner: the async shell around `zrevert-core`.
//!
//! This crate provides:
//! - Market-data and execution port traits (the venue boundary)
//! - A paper venue implementing both ports for dry runs and tests
//! - `StrategySession`: one tick of fetch → observe → size → decide → execute
//! - `StrategyScheduler`: fixed-interval ticking, one tick in flight, cooperative stop
//! - TOML session config, `tracing` setup and the error taxonomy

pub mod config;
pub mod error;
pub mod launch;
pub mod logging;
pub mod paper;
pub mod ports;
pub mod scheduler;
pub mod session;

pub use config::{SessionConfig, DEFAULT_TICK_INTERVAL_MS};
pub use error::{PortError, SchedulerError, TickError};
pub use launch::{launch, launch_from_file};
pub use paper::{PaperFill, PaperVenue, PaperVenueConfig, PriceFeed};
pub use ports::{
    AccountSnapshot, ExecutionPort, MarketDataPort, MarketId, PriceQuote, TxId, VenuePosition,
};
pub use scheduler::{RunState, StrategyScheduler, TickHandler};
pub use session::{SessionStats, StrategySession, TickOutcome};
