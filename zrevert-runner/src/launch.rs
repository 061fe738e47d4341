//! Build a session from configuration and start its scheduler.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::SessionConfig;
use crate::error::SchedulerError;
use crate::ports::{ExecutionPort, MarketDataPort};
use crate::scheduler::StrategyScheduler;
use crate::session::StrategySession;

/// Validate `config`, wire the ports and start ticking.
///
/// Any failure here is fatal: nothing has been scheduled yet.
pub fn launch(
    config: SessionConfig,
    market_data: Arc<dyn MarketDataPort>,
    execution: Arc<dyn ExecutionPort>,
) -> Result<StrategyScheduler<StrategySession>, SchedulerError> {
    config.validate()?;
    let interval = config.tick_interval();
    let session = StrategySession::new(config.market_id, config.risk, market_data, execution)?;
    let fingerprint = session.fingerprint().clone();

    let mut scheduler = StrategyScheduler::new(session, interval)?;
    scheduler.start()?;
    info!(
        market = config.market_id,
        config = %fingerprint,
        "session launched"
    );
    Ok(scheduler)
}

/// Load a TOML session config from disk and launch it.
pub fn launch_from_file(
    path: &Path,
    market_data: Arc<dyn MarketDataPort>,
    execution: Arc<dyn ExecutionPort>,
) -> anyhow::Result<StrategyScheduler<StrategySession>> {
    let config = SessionConfig::from_file(path)
        .with_context(|| format!("loading session config from {}", path.display()))?;
    launch(config, market_data, execution).context("starting strategy scheduler")
}
