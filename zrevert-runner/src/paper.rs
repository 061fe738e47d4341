//! In-memory paper venue implementing both ports.
//!
//! Fills every market order at the last quoted price, charges the taker fee
//! against collateral and realises PnL on reduction. Prices come from a
//! scripted sequence or a seeded random walk, so runs are reproducible.
//! Switches simulate unavailable data and rejected orders.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use zrevert_core::Direction;

use crate::error::PortError;
use crate::ports::{
    AccountSnapshot, ExecutionPort, MarketDataPort, MarketId, PriceQuote, TxId, VenuePosition,
};

/// Where quoted prices come from.
#[derive(Debug, Clone)]
pub enum PriceFeed {
    /// Pop one price per quote; once drained the last price repeats.
    Scripted(VecDeque<f64>),
    /// Multiplicative random walk with uniform steps in ±`max_step`.
    RandomWalk {
        rng: StdRng,
        price: f64,
        max_step: f64,
    },
}

impl PriceFeed {
    pub fn scripted(prices: &[f64]) -> Self {
        Self::Scripted(prices.iter().copied().collect())
    }

    pub fn random_walk(seed: u64, start: f64, max_step: f64) -> Self {
        Self::RandomWalk {
            rng: StdRng::seed_from_u64(seed),
            price: start,
            max_step,
        }
    }

    fn next_price(&mut self, last: Option<f64>) -> Option<f64> {
        match self {
            PriceFeed::Scripted(queue) => queue.pop_front().or(last),
            PriceFeed::RandomWalk {
                rng,
                price,
                max_step,
            } => {
                let step: f64 = rng.gen_range(-*max_step..=*max_step);
                *price *= 1.0 + step;
                Some(*price)
            }
        }
    }
}

/// One executed paper order.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperFill {
    pub tx_id: TxId,
    pub direction: Direction,
    pub size_base: f64,
    pub price: f64,
    pub reduce_only: bool,
    pub fee_paid: f64,
}

#[derive(Debug, Clone)]
pub struct PaperVenueConfig {
    pub market: MarketId,
    pub initial_collateral: f64,
    pub taker_fee: f64,
    pub min_step: f64,
    pub max_leverage: f64,
}

impl Default for PaperVenueConfig {
    fn default() -> Self {
        Self {
            market: 0,
            initial_collateral: 1_000.0,
            taker_fee: 0.0005,
            min_step: 0.01,
            max_leverage: 10.0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Outages {
    price: bool,
    account: bool,
    fee: bool,
    reject_orders: bool,
}

#[derive(Debug)]
struct PaperState {
    feed: PriceFeed,
    last_price: Option<f64>,
    slot: u64,
    collateral: f64,
    position: f64,
    avg_entry: f64,
    next_tx: u64,
    fills: Vec<PaperFill>,
    price_requests: u64,
    fee_requests: u64,
    outages: Outages,
}

pub struct PaperVenue {
    config: PaperVenueConfig,
    state: Mutex<PaperState>,
}

impl PaperVenue {
    pub fn new(config: PaperVenueConfig, feed: PriceFeed) -> Self {
        let collateral = config.initial_collateral;
        Self {
            config,
            state: Mutex::new(PaperState {
                feed,
                last_price: None,
                slot: 0,
                collateral,
                position: 0.0,
                avg_entry: 0.0,
                next_tx: 1,
                fills: Vec::new(),
                price_requests: 0,
                fee_requests: 0,
                outages: Outages::default(),
            }),
        }
    }

    pub fn scripted(prices: &[f64]) -> Self {
        Self::new(PaperVenueConfig::default(), PriceFeed::scripted(prices))
    }

    fn state(&self) -> MutexGuard<'_, PaperState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_market(&self, market: MarketId) -> Result<(), PortError> {
        if market != self.config.market {
            return Err(PortError::Unavailable(format!("market {market}")));
        }
        Ok(())
    }

    // ── Scripting and inspection ──

    pub fn set_price_available(&self, available: bool) {
        self.state().outages.price = !available;
    }

    pub fn set_account_available(&self, available: bool) {
        self.state().outages.account = !available;
    }

    pub fn set_fee_available(&self, available: bool) {
        self.state().outages.fee = !available;
    }

    pub fn set_reject_orders(&self, reject: bool) {
        self.state().outages.reject_orders = reject;
    }

    /// Overwrite the venue position, as if changed outside this bot.
    pub fn force_position(&self, size_base: f64, entry_price: f64) {
        let mut state = self.state();
        state.position = size_base;
        state.avg_entry = entry_price;
    }

    pub fn position_size(&self) -> f64 {
        self.state().position
    }

    pub fn collateral(&self) -> f64 {
        self.state().collateral
    }

    pub fn fills(&self) -> Vec<PaperFill> {
        self.state().fills.clone()
    }

    pub fn price_requests(&self) -> u64 {
        self.state().price_requests
    }

    pub fn fee_requests(&self) -> u64 {
        self.state().fee_requests
    }

    /// Apply a signed base-size change at `price`, realising PnL on reduction.
    fn apply_fill(&self, state: &mut PaperState, delta: f64, price: f64) -> f64 {
        let fee = delta.abs() * price * self.config.taker_fee;
        state.collateral -= fee;

        let old = state.position;
        let new = old + delta;
        let same_side = old == 0.0 || old.signum() == delta.signum();

        if same_side {
            let notional = old.abs() * state.avg_entry + delta.abs() * price;
            state.avg_entry = notional / new.abs();
        } else {
            let closed = delta.abs().min(old.abs());
            state.collateral += closed * old.signum() * (price - state.avg_entry);
            if new.signum() != old.signum() && new != 0.0 {
                state.avg_entry = price;
            }
        }
        state.position = new;
        if state.position.abs() < 1e-12 {
            state.position = 0.0;
            state.avg_entry = 0.0;
        }
        fee
    }

    fn next_tx(state: &mut PaperState) -> TxId {
        let id = format!("paper-{}", state.next_tx);
        state.next_tx += 1;
        id
    }
}

#[async_trait]
impl MarketDataPort for PaperVenue {
    async fn get_price(&self, market: MarketId) -> Result<PriceQuote, PortError> {
        self.check_market(market)?;
        let mut state = self.state();
        state.price_requests += 1;
        if state.outages.price {
            return Err(PortError::Unavailable("oracle price".into()));
        }
        let last = state.last_price;
        let price = state
            .feed
            .next_price(last)
            .ok_or_else(|| PortError::Unavailable("oracle price".into()))?;
        state.last_price = Some(price);
        state.slot += 1;
        Ok(PriceQuote {
            price,
            confidence: price * 0.0001,
            slot: state.slot,
        })
    }

    async fn get_account_state(&self) -> Result<AccountSnapshot, PortError> {
        let state = self.state();
        if state.outages.account {
            return Err(PortError::Unavailable("account state".into()));
        }
        let used = state.position.abs() * state.last_price.unwrap_or(0.0);
        let total = state.collateral;
        Ok(AccountSnapshot {
            total_collateral: total,
            free_collateral: (total - used / self.config.max_leverage).max(0.0),
            leverage: self.config.max_leverage,
        })
    }

    async fn get_position(&self, market: MarketId) -> Result<Option<VenuePosition>, PortError> {
        self.check_market(market)?;
        let state = self.state();
        Ok((state.position != 0.0).then_some(VenuePosition {
            size_base: state.position,
        }))
    }

    async fn get_taker_fee(&self, market: MarketId) -> Result<f64, PortError> {
        self.check_market(market)?;
        let mut state = self.state();
        state.fee_requests += 1;
        if state.outages.fee {
            return Err(PortError::Unavailable("taker fee".into()));
        }
        Ok(self.config.taker_fee)
    }

    async fn get_min_order_step(&self, market: MarketId) -> Result<f64, PortError> {
        self.check_market(market)?;
        Ok(self.config.min_step)
    }
}

#[async_trait]
impl ExecutionPort for PaperVenue {
    async fn place_market_order(
        &self,
        market: MarketId,
        direction: Direction,
        size_base: f64,
        reduce_only: bool,
    ) -> Result<TxId, PortError> {
        self.check_market(market)?;
        let mut state = self.state();
        if state.outages.reject_orders {
            return Err(PortError::Rejected("venue rejected order".into()));
        }
        if !(size_base.is_finite() && size_base > 0.0 && size_base >= self.config.min_step) {
            return Err(PortError::Rejected(format!(
                "size {size_base} below min step {}",
                self.config.min_step
            )));
        }
        let price = state
            .last_price
            .ok_or_else(|| PortError::Rejected("no mark price".into()))?;

        let mut delta = direction.sign() * size_base;
        if reduce_only {
            if state.position == 0.0 || state.position.signum() == delta.signum() {
                return Err(PortError::Rejected("reduce-only order would increase position".into()));
            }
            delta = delta.signum() * delta.abs().min(state.position.abs());
        }

        let fee_paid = self.apply_fill(&mut state, delta, price);
        let tx_id = Self::next_tx(&mut state);
        state.fills.push(PaperFill {
            tx_id: tx_id.clone(),
            direction,
            size_base: delta.abs(),
            price,
            reduce_only,
            fee_paid,
        });
        Ok(tx_id)
    }

    async fn close_position(&self, market: MarketId) -> Result<Option<TxId>, PortError> {
        self.check_market(market)?;
        let mut state = self.state();
        if state.outages.reject_orders {
            return Err(PortError::Rejected("venue rejected close".into()));
        }
        if state.position == 0.0 {
            return Ok(None);
        }
        let price = state
            .last_price
            .ok_or_else(|| PortError::Rejected("no mark price".into()))?;

        let delta = -state.position;
        let direction = if delta > 0.0 {
            Direction::Long
        } else {
            Direction::Short
        };
        let fee_paid = self.apply_fill(&mut state, delta, price);
        let tx_id = Self::next_tx(&mut state);
        state.fills.push(PaperFill {
            tx_id: tx_id.clone(),
            direction,
            size_base: delta.abs(),
            price,
            reduce_only: true,
            fee_paid,
        });
        Ok(Some(tx_id))
    }
}
