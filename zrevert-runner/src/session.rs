//! One trading session: the decision cycle run on every tick.
//!
//! Order within a tick: price → observe → account → venue position → taker
//! fee (memoised) → min step → size → decide → execute. Any failure ends the
//! tick as a no-op; nothing propagates past `tick()`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use zrevert_core::{
    Action, ConfigError, ConfigHash, HoldReason, IndicatorState, PositionManager, PositionState,
    RiskConfig, RiskSizer, SignalEngine,
};

use crate::error::TickError;
use crate::ports::{ExecutionPort, MarketDataPort, MarketId, PriceQuote, TxId};
use crate::scheduler::TickHandler;

/// Running counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub ticks: u64,
    pub entries: u64,
    pub exits: u64,
    pub holds: u64,
    pub data_errors: u64,
    pub indeterminate: u64,
    pub execution_errors: u64,
}

impl SessionStats {
    fn record_error(&mut self, err: &TickError) {
        match err {
            TickError::DataUnavailable { .. } => self.data_errors += 1,
            TickError::IndeterminateState(_) => self.indeterminate += 1,
            TickError::ExecutionFailure(_) => self.execution_errors += 1,
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub at: DateTime<Utc>,
    pub quote: Option<PriceQuote>,
    pub indicator: IndicatorState,
    /// `None` when the tick aborted before a decision was made.
    pub action: Option<Action>,
    /// Set when the venue confirmed an entry or exit.
    pub tx_id: Option<TxId>,
    pub error: Option<TickError>,
}

impl TickOutcome {
    fn begin() -> Self {
        Self {
            at: Utc::now(),
            quote: None,
            indicator: IndicatorState::undefined(),
            action: None,
            tx_id: None,
            error: None,
        }
    }

    /// True when an order was confirmed this tick.
    pub fn traded(&self) -> bool {
        self.tx_id.is_some()
    }
}

pub struct StrategySession {
    market: MarketId,
    config: RiskConfig,
    fingerprint: ConfigHash,
    signal: SignalEngine,
    sizer: RiskSizer,
    manager: PositionManager,
    market_data: Arc<dyn MarketDataPort>,
    execution: Arc<dyn ExecutionPort>,
    stats: SessionStats,
}

impl StrategySession {
    pub fn new(
        market: MarketId,
        config: RiskConfig,
        market_data: Arc<dyn MarketDataPort>,
        execution: Arc<dyn ExecutionPort>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let fingerprint = config.fingerprint();
        info!(
            market,
            config = fingerprint.short(),
            period = config.period,
            entry_z = config.entry_z,
            exit_z = config.exit_z,
            "strategy session created"
        );
        Ok(Self {
            market,
            signal: SignalEngine::from_config(&config),
            sizer: RiskSizer::from_config(&config),
            manager: PositionManager::new(&config),
            fingerprint,
            config,
            market_data,
            execution,
            stats: SessionStats::default(),
        })
    }

    pub fn market(&self) -> MarketId {
        self.market
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &ConfigHash {
        &self.fingerprint
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn position(&self) -> PositionState {
        self.manager.position()
    }

    pub fn taker_fee(&self) -> Option<f64> {
        self.manager.fees().taker_fee()
    }

    pub fn indicator(&self) -> IndicatorState {
        self.signal.last()
    }

    pub fn window_len(&self) -> usize {
        self.signal.window_len()
    }

    /// Run one decision cycle. Never fails: errors are logged and recorded.
    pub async fn tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::begin();
        self.stats.ticks += 1;

        if let Err(err) = self.run_tick(&mut outcome).await {
            warn!(market = self.market, kind = err.category(), "tick aborted: {err}");
            self.stats.record_error(&err);
            outcome.error = Some(err);
        }
        outcome
    }

    async fn run_tick(&mut self, outcome: &mut TickOutcome) -> Result<(), TickError> {
        let quote = self
            .market_data
            .get_price(self.market)
            .await
            .map_err(|e| TickError::data("price", e.to_string()))?;
        self.check_quote(&quote)?;
        outcome.quote = Some(quote);
        let price = quote.price;

        let indicator = self.signal.observe(price);
        outcome.indicator = indicator;

        let account = self
            .market_data
            .get_account_state()
            .await
            .map_err(|e| TickError::data("account state", e.to_string()))?;

        let venue_position = self
            .market_data
            .get_position(self.market)
            .await
            .map_err(|e| TickError::data("position", e.to_string()))?;
        self.manager
            .sync_venue_size(venue_position.map_or(0.0, |p| p.size_base));

        if !self.manager.fees().is_known() {
            let fee = self
                .market_data
                .get_taker_fee(self.market)
                .await
                .map_err(|e| TickError::data("taker fee", e.to_string()))?;
            if !self.manager.fees_mut().set(fee) {
                return Err(TickError::data("taker fee", format!("invalid fee {fee}")));
            }
            debug!(market = self.market, fee, "taker fee cached");
        }

        let min_step = self
            .market_data
            .get_min_order_step(self.market)
            .await
            .map_err(|e| TickError::data("min order step", e.to_string()))?;
        if !min_step.is_finite() || min_step <= 0.0 {
            return Err(TickError::data(
                "min order step",
                format!("unusable step {min_step}"),
            ));
        }

        let sizing = self.sizer.size(account.total_collateral, price, min_step);
        let action = self.manager.decide(&indicator, &sizing, price);
        outcome.action = Some(action);

        match action {
            Action::Hold(HoldReason::IndeterminateState) => {
                let position = self.manager.position();
                let missing = if position.entry_price.is_none() {
                    "entry price"
                } else {
                    "taker fee"
                };
                Err(TickError::IndeterminateState(format!(
                    "holding {} base with unknown {missing}; entries skipped",
                    position.size_base
                )))
            }
            Action::Hold(reason) => {
                self.stats.holds += 1;
                debug!(
                    market = self.market,
                    price,
                    z = ?indicator.z_score,
                    ?reason,
                    "hold"
                );
                Ok(())
            }
            Action::Enter {
                direction,
                size_base,
            } => {
                let tx = self
                    .execution
                    .place_market_order(self.market, direction, size_base, false)
                    .await
                    .map_err(TickError::ExecutionFailure)?;
                self.manager.record_entry(direction, size_base, price);
                self.stats.entries += 1;
                info!(
                    market = self.market,
                    ?direction,
                    size_base,
                    price,
                    z = ?indicator.z_score,
                    tx = %tx,
                    "position opened"
                );
                outcome.tx_id = Some(tx);
                Ok(())
            }
            Action::Exit(reason) => {
                let entry = self.manager.position().entry_price;
                let closed = self
                    .execution
                    .close_position(self.market)
                    .await
                    .map_err(TickError::ExecutionFailure)?;
                self.manager.record_exit();
                self.stats.exits += 1;
                match &closed {
                    Some(tx) => info!(
                        market = self.market,
                        ?reason,
                        price,
                        entry = ?entry,
                        tx = %tx,
                        "position closed"
                    ),
                    None => warn!(
                        market = self.market,
                        ?reason,
                        "exit requested but venue reports no position"
                    ),
                }
                outcome.tx_id = closed;
                Ok(())
            }
        }
    }

    fn check_quote(&self, quote: &PriceQuote) -> Result<(), TickError> {
        if !quote.price.is_finite() || quote.price <= 0.0 {
            return Err(TickError::data("price", format!("unusable price {}", quote.price)));
        }
        if let Some(max_frac) = self.config.max_confidence_fraction {
            let frac = quote.confidence / quote.price;
            if !frac.is_finite() || frac > max_frac {
                return Err(TickError::data(
                    "price",
                    format!("confidence {:.6} of price exceeds {max_frac}", frac),
                ));
            }
        }
        Ok(())
    }

    /// Clear the price window, fee cache and entry price.
    pub fn reset(&mut self) {
        self.signal.reset();
        self.manager.reset();
        info!(market = self.market, "session state reset");
    }
}

#[async_trait]
impl TickHandler for StrategySession {
    async fn tick(&mut self) {
        StrategySession::tick(self).await;
    }

    fn reset(&mut self) {
        StrategySession::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::PaperVenue;

    fn session(venue: &Arc<PaperVenue>, config: RiskConfig) -> StrategySession {
        StrategySession::new(0, config, venue.clone(), venue.clone()).unwrap()
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let venue = Arc::new(PaperVenue::scripted(&[100.0]));
        let config = RiskConfig {
            period: 1,
            ..RiskConfig::default()
        };
        assert!(StrategySession::new(0, config, venue.clone(), venue).is_err());
    }

    #[tokio::test]
    async fn warmup_ticks_hold_and_cache_fee_once() {
        let venue = Arc::new(PaperVenue::scripted(&[100.0; 5]));
        let mut s = session(&venue, RiskConfig::default());
        for _ in 0..5 {
            let out = s.tick().await;
            assert_eq!(out.action, Some(Action::Hold(HoldReason::SignalUndefined)));
            assert!(out.error.is_none());
        }
        assert_eq!(venue.fee_requests(), 1);
        assert_eq!(s.taker_fee(), Some(0.0005));
        assert_eq!(s.stats().holds, 5);
    }

    #[tokio::test]
    async fn non_positive_price_is_data_unavailable() {
        let venue = Arc::new(PaperVenue::scripted(&[0.0]));
        let mut s = session(&venue, RiskConfig::default());
        let out = s.tick().await;
        assert!(matches!(
            out.error,
            Some(TickError::DataUnavailable { what: "price", .. })
        ));
        assert_eq!(s.window_len(), 0);
    }

    #[tokio::test]
    async fn wide_confidence_rejected_when_gated() {
        // Paper quotes carry confidence of 0.01% of price.
        let venue = Arc::new(PaperVenue::scripted(&[100.0]));
        let mut s = session(
            &venue,
            RiskConfig {
                max_confidence_fraction: Some(0.00001),
                ..RiskConfig::default()
            },
        );
        let out = s.tick().await;
        assert!(out.error.is_some());
        assert_eq!(s.stats().data_errors, 1);
    }

    #[tokio::test]
    async fn reset_clears_window_and_fee() {
        let venue = Arc::new(PaperVenue::scripted(&[100.0; 3]));
        let mut s = session(&venue, RiskConfig::default());
        for _ in 0..3 {
            s.tick().await;
        }
        assert_eq!(s.window_len(), 3);
        s.reset();
        assert_eq!(s.window_len(), 0);
        assert_eq!(s.taker_fee(), None);
    }
}
