//! Entry/exit rules and confirmed position state.
//!
//! Evaluation order per tick, first match wins:
//! 1. z-score undefined → hold
//! 2. positioned: unknown entry/fee → hold (never fall through to entries),
//!    then stop-loss, percentage take-profit, signal take-profit
//! 3. flat: capital ceiling, unknown fee, then z beyond ±entry_z
//!
//! PnL is always signed so that a gain is positive for either side.

use crate::config::RiskConfig;
use crate::domain::{Direction, PositionState};
use crate::signals::IndicatorState;
use crate::sizers::SizingDecision;

use super::fee_cache::FeeCache;
use super::intent::{Action, ExitReason, HoldReason};

#[derive(Debug, Clone)]
pub struct PositionManager {
    entry_z: f64,
    exit_z: f64,
    min_profit: f64,
    max_loss: f64,
    take_profit: f64,
    position: PositionState,
    fees: FeeCache,
}

impl PositionManager {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            entry_z: config.entry_z,
            exit_z: config.exit_z,
            min_profit: config.min_profit,
            max_loss: config.max_loss,
            take_profit: config.take_profit,
            position: PositionState::flat(),
            fees: FeeCache::new(),
        }
    }

    pub fn position(&self) -> PositionState {
        self.position
    }

    pub fn fees(&self) -> &FeeCache {
        &self.fees
    }

    pub fn fees_mut(&mut self) -> &mut FeeCache {
        &mut self.fees
    }

    /// Decide what to do this tick. Reads state only.
    pub fn decide(
        &self,
        indicator: &IndicatorState,
        sizing: &SizingDecision,
        current_price: f64,
    ) -> Action {
        let Some(z) = indicator.z_score else {
            return Action::Hold(HoldReason::SignalUndefined);
        };

        if self.position.is_flat() {
            self.evaluate_entry(z, sizing, current_price)
        } else {
            self.evaluate_exit(z, sizing, current_price)
        }
    }

    fn evaluate_exit(&self, z: f64, sizing: &SizingDecision, price: f64) -> Action {
        let (Some(entry), Some(fee)) = (self.position.entry_price, self.fees.taker_fee()) else {
            return Action::Hold(HoldReason::IndeterminateState);
        };
        if entry <= 0.0 {
            return Action::Hold(HoldReason::IndeterminateState);
        }

        let pnl = self.position.size_base * (price - entry);
        let initial_value = self.position.size_base.abs() * entry;

        if pnl < 0.0 && pnl.abs() >= initial_value * self.max_loss {
            return Action::Exit(ExitReason::StopLoss);
        }

        if pnl / initial_value >= self.take_profit {
            return Action::Exit(ExitReason::TakeProfit);
        }

        let reverted = match self.position.direction() {
            Some(Direction::Long) => z >= -self.exit_z,
            Some(Direction::Short) => z <= self.exit_z,
            None => false,
        };
        let round_trip_fees = sizing.desired_value * fee * 2.0;
        let required_profit = round_trip_fees + initial_value * self.min_profit;
        if reverted && pnl > required_profit {
            return Action::Exit(ExitReason::SignalReversion);
        }

        Action::Hold(HoldReason::NoExit)
    }

    fn evaluate_entry(&self, z: f64, sizing: &SizingDecision, price: f64) -> Action {
        if self.position.capital_in_use(price) >= sizing.max_allowed_capital {
            return Action::Hold(HoldReason::CapitalCeiling);
        }
        if !self.fees.is_known() {
            return Action::Hold(HoldReason::FeeUnknown);
        }

        let direction = if z < -self.entry_z {
            Direction::Long
        } else if z > self.entry_z {
            Direction::Short
        } else {
            return Action::Hold(HoldReason::NoEntry);
        };

        let size_base = sizing.trade_size_base;
        if !size_base.is_finite() || size_base <= 0.0 {
            return Action::Hold(HoldReason::ZeroSize);
        }
        Action::Enter {
            direction,
            size_base,
        }
    }

    /// The venue accepted an entry order. A zero size leaves the position flat.
    pub fn record_entry(&mut self, direction: Direction, size_base: f64, price: f64) {
        debug_assert!(self.position.is_flat(), "entry recorded while positioned");
        let size_base = direction.sign() * size_base.abs();
        self.position = if size_base == 0.0 {
            PositionState::flat()
        } else {
            PositionState {
                size_base,
                entry_price: Some(price),
            }
        };
    }

    /// The venue confirmed the position is closed.
    pub fn record_exit(&mut self) {
        self.position = PositionState::flat();
    }

    /// Adopt the size the venue reports. Returning to flat clears the entry price.
    pub fn sync_venue_size(&mut self, size_base: f64) {
        self.position.size_base = size_base;
        if self.position.is_flat() {
            self.position.entry_price = None;
        }
    }

    /// Drop session state: entry price and fee cache.
    pub fn reset(&mut self) {
        self.position.entry_price = None;
        self.fees.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEE: f64 = 0.0005;

    fn config() -> RiskConfig {
        RiskConfig::default()
    }

    fn sizing() -> SizingDecision {
        SizingDecision {
            trade_size_base: 1.5,
            max_allowed_capital: 500.0,
            desired_value: 150.0,
        }
    }

    fn z(value: f64) -> IndicatorState {
        IndicatorState {
            mean: Some(100.0),
            dispersion: Some(1.0),
            z_score: Some(value),
        }
    }

    fn flat_with_fee() -> PositionManager {
        let mut pm = PositionManager::new(&config());
        pm.fees_mut().set(FEE);
        pm
    }

    fn long_at(entry: f64) -> PositionManager {
        let mut pm = flat_with_fee();
        pm.record_entry(Direction::Long, 1.0, entry);
        pm
    }

    fn short_at(entry: f64) -> PositionManager {
        let mut pm = flat_with_fee();
        pm.record_entry(Direction::Short, 1.0, entry);
        pm
    }

    #[test]
    fn undefined_z_holds_even_when_positioned() {
        let pm = long_at(100.0);
        let action = pm.decide(&IndicatorState::undefined(), &sizing(), 50.0);
        assert_eq!(action, Action::Hold(HoldReason::SignalUndefined));
    }

    #[test]
    fn enters_long_below_band() {
        let pm = flat_with_fee();
        assert_eq!(
            pm.decide(&z(-2.5), &sizing(), 100.0),
            Action::Enter {
                direction: Direction::Long,
                size_base: 1.5
            }
        );
    }

    #[test]
    fn enters_short_above_band() {
        let pm = flat_with_fee();
        assert_eq!(
            pm.decide(&z(2.5), &sizing(), 100.0),
            Action::Enter {
                direction: Direction::Short,
                size_base: 1.5
            }
        );
    }

    #[test]
    fn inside_band_holds() {
        let pm = flat_with_fee();
        assert_eq!(
            pm.decide(&z(-2.0), &sizing(), 100.0),
            Action::Hold(HoldReason::NoEntry)
        );
        assert_eq!(
            pm.decide(&z(1.9), &sizing(), 100.0),
            Action::Hold(HoldReason::NoEntry)
        );
    }

    #[test]
    fn unknown_fee_blocks_entry() {
        let pm = PositionManager::new(&config());
        assert_eq!(
            pm.decide(&z(-3.0), &sizing(), 100.0),
            Action::Hold(HoldReason::FeeUnknown)
        );
    }

    #[test]
    fn zero_order_size_holds_instead_of_entering() {
        let pm = flat_with_fee();
        let empty = SizingDecision {
            trade_size_base: 0.0,
            ..sizing()
        };
        assert_eq!(
            pm.decide(&z(-3.0), &empty, 100.0),
            Action::Hold(HoldReason::ZeroSize)
        );
        // Inside the band the size never matters.
        assert_eq!(
            pm.decide(&z(0.5), &empty, 100.0),
            Action::Hold(HoldReason::NoEntry)
        );
    }

    #[test]
    fn zero_size_entry_records_nothing() {
        let mut pm = flat_with_fee();
        pm.record_entry(Direction::Long, 0.0, 90.0);
        assert!(pm.position().is_flat());
        assert_eq!(pm.position().entry_price, None);
    }

    #[test]
    fn zero_capital_ceiling_blocks_entry() {
        let pm = flat_with_fee();
        let broke = SizingDecision {
            max_allowed_capital: 0.0,
            ..sizing()
        };
        assert_eq!(
            pm.decide(&z(-3.0), &broke, 100.0),
            Action::Hold(HoldReason::CapitalCeiling)
        );
    }

    #[test]
    fn positioned_without_entry_price_never_enters() {
        let mut pm = flat_with_fee();
        pm.sync_venue_size(2.0); // venue reports a position we never recorded
        assert_eq!(
            pm.decide(&z(-5.0), &sizing(), 100.0),
            Action::Hold(HoldReason::IndeterminateState)
        );
    }

    #[test]
    fn positioned_without_fee_is_indeterminate() {
        let mut pm = PositionManager::new(&config());
        pm.record_entry(Direction::Long, 1.0, 100.0);
        assert_eq!(
            pm.decide(&z(0.0), &sizing(), 94.0),
            Action::Hold(HoldReason::IndeterminateState)
        );
    }

    #[test]
    fn long_stop_loss_at_six_percent_drawdown() {
        let pm = long_at(100.0);
        assert_eq!(
            pm.decide(&z(-3.0), &sizing(), 94.0),
            Action::Exit(ExitReason::StopLoss)
        );
    }

    #[test]
    fn stop_loss_fires_at_exact_threshold() {
        let pm = long_at(100.0);
        assert_eq!(
            pm.decide(&z(-3.0), &sizing(), 95.0),
            Action::Exit(ExitReason::StopLoss)
        );
    }

    #[test]
    fn short_stop_loss_on_rally() {
        let pm = short_at(100.0);
        assert_eq!(
            pm.decide(&z(3.0), &sizing(), 106.0),
            Action::Exit(ExitReason::StopLoss)
        );
    }

    #[test]
    fn small_loss_holds() {
        let pm = long_at(100.0);
        assert_eq!(
            pm.decide(&z(-3.0), &sizing(), 97.0),
            Action::Hold(HoldReason::NoExit)
        );
    }

    #[test]
    fn long_take_profit_regardless_of_z() {
        let pm = long_at(100.0);
        for zv in [-4.0, 0.0, 4.0] {
            assert_eq!(
                pm.decide(&z(zv), &sizing(), 106.0),
                Action::Exit(ExitReason::TakeProfit)
            );
        }
    }

    #[test]
    fn short_take_profit_on_drop() {
        let pm = short_at(100.0);
        assert_eq!(
            pm.decide(&z(-4.0), &sizing(), 94.0),
            Action::Exit(ExitReason::TakeProfit)
        );
    }

    #[test]
    fn long_signal_exit_needs_reversion_and_profit_over_fees() {
        let pm = long_at(100.0);
        // required = 150 * 0.0005 * 2 + 100 * 0.002 = 0.15 + 0.2 = 0.35
        assert_eq!(
            pm.decide(&z(-0.4), &sizing(), 100.5),
            Action::Exit(ExitReason::SignalReversion)
        );
        // Not reverted yet
        assert_eq!(
            pm.decide(&z(-0.6), &sizing(), 100.5),
            Action::Hold(HoldReason::NoExit)
        );
        // Reverted but profit below fee hurdle
        assert_eq!(
            pm.decide(&z(0.0), &sizing(), 100.3),
            Action::Hold(HoldReason::NoExit)
        );
    }

    #[test]
    fn short_signal_exit_mirrors_long() {
        let pm = short_at(100.0);
        assert_eq!(
            pm.decide(&z(0.4), &sizing(), 99.5),
            Action::Exit(ExitReason::SignalReversion)
        );
        assert_eq!(
            pm.decide(&z(0.6), &sizing(), 99.5),
            Action::Hold(HoldReason::NoExit)
        );
        // Reverted while losing: no signal exit
        assert_eq!(
            pm.decide(&z(0.0), &sizing(), 100.5),
            Action::Hold(HoldReason::NoExit)
        );
    }

    #[test]
    fn record_exit_clears_entry() {
        let mut pm = long_at(100.0);
        pm.record_exit();
        assert!(pm.position().is_flat());
        assert_eq!(pm.position().entry_price, None);
    }

    #[test]
    fn venue_flat_clears_entry_price() {
        let mut pm = long_at(100.0);
        pm.sync_venue_size(1.0);
        assert_eq!(pm.position().entry_price, Some(100.0));
        pm.sync_venue_size(0.0);
        assert_eq!(pm.position(), PositionState::flat());
    }

    #[test]
    fn short_entry_records_negative_size() {
        let pm = short_at(100.0);
        assert_eq!(pm.position().size_base, -1.0);
        assert_eq!(pm.position().direction(), Some(Direction::Short));
    }

    #[test]
    fn reset_clears_entry_and_fee() {
        let mut pm = long_at(100.0);
        pm.reset();
        assert_eq!(pm.position().entry_price, None);
        assert!(!pm.fees().is_known());
    }
}
