//! Position management: one market, one position, layered exits.
//!
//! **Lifecycle:** Flat → (entry signal) → Positioned → (stop-loss | take-profit
//! | signal reversion) → Flat. There are no intermediate states: an order is
//! synchronous from the manager's point of view, and state only changes once
//! the caller confirms the venue accepted it.
//!
//! **Module Structure:**
//! - `intent`: the `Action` a tick resolves to, with hold/exit reasons
//! - `fee_cache`: memoised taker fee
//! - `manager`: `PositionManager`, the decision rules and confirmed-state updates

pub mod fee_cache;
pub mod intent;
pub mod manager;

pub use fee_cache::FeeCache;
pub use intent::{Action, ExitReason, HoldReason};
pub use manager::PositionManager;
