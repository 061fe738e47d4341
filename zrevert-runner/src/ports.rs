//! Boundary traits for the venue.
//!
//! The decision core never talks to a chain or an exchange. Wallets, account
//! subscriptions and transaction signing all live behind these two traits,
//! so a live adapter, the paper venue and test doubles are interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use zrevert_core::Direction;

use crate::error::PortError;

/// Perp market identifier (venue market index).
pub type MarketId = u16;

/// Oracle price with its confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub confidence: f64,
    pub slot: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub total_collateral: f64,
    pub free_collateral: f64,
    pub leverage: f64,
}

/// Venue-reported position. Signed base size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VenuePosition {
    pub size_base: f64,
}

/// Transaction identifier returned by the venue.
pub type TxId = String;

/// Read side of the venue.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    async fn get_price(&self, market: MarketId) -> Result<PriceQuote, PortError>;

    async fn get_account_state(&self) -> Result<AccountSnapshot, PortError>;

    /// `Ok(None)` when no position exists for the market.
    async fn get_position(&self, market: MarketId) -> Result<Option<VenuePosition>, PortError>;

    /// Taker fee as a fraction of notional.
    async fn get_taker_fee(&self, market: MarketId) -> Result<f64, PortError>;

    /// Minimum order size step in base units.
    async fn get_min_order_step(&self, market: MarketId) -> Result<f64, PortError>;
}

/// Write side of the venue.
#[async_trait]
pub trait ExecutionPort: Send + Sync {
    /// Place a market order. Fails with `PortError::Rejected` when the venue refuses it.
    async fn place_market_order(
        &self,
        market: MarketId,
        direction: Direction,
        size_base: f64,
        reduce_only: bool,
    ) -> Result<TxId, PortError>;

    /// Close the whole position. `Ok(None)` if there was nothing to close.
    async fn close_position(&self, market: MarketId) -> Result<Option<TxId>, PortError>;
}
