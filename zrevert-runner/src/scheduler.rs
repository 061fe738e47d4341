//! Fixed-interval scheduler with at most one tick in flight.
//!
//! The next tick is scheduled only after the previous one completes, so ticks
//! never overlap. A stop between ticks cancels the pending timer, resets the
//! handler and leaves the scheduler idle before `stop` returns. A stop
//! requested mid-tick waits for that tick to resolve, then the handler is
//! reset and no further tick runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::SchedulerError;

/// Work driven by the scheduler.
#[async_trait]
pub trait TickHandler: Send + 'static {
    /// One decision cycle. Must contain its own errors.
    async fn tick(&mut self);

    /// Called once per stop, after the last tick has completed.
    fn reset(&mut self);
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunState {
    pub running: bool,
    /// Stop requested while a tick was in flight; idle once it resolves.
    pub pending_stop: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Between ticks, waiting on the interval timer.
    Waiting,
    Ticking,
    /// Stop requested; the loop resets the handler once it regains it.
    Stopping,
}

#[derive(Debug)]
struct Lifecycle {
    /// Bumped on every start so a previous run's task can tell it is stale.
    generation: u64,
    phase: Phase,
    in_tick: bool,
}

#[derive(Debug)]
struct Shared {
    lifecycle: std::sync::Mutex<Lifecycle>,
    ticks_completed: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            lifecycle: std::sync::Mutex::new(Lifecycle {
                generation: 0,
                phase: Phase::Idle,
                in_tick: false,
            }),
            ticks_completed: AtomicU64::new(0),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns its run to Idle when the loop task ends, including on panic.
struct LoopGuard {
    shared: Arc<Shared>,
    generation: u64,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        let mut lc = self.shared.lifecycle();
        if lc.generation == self.generation {
            lc.phase = Phase::Idle;
            lc.in_tick = false;
        }
    }
}

pub struct StrategyScheduler<H: TickHandler> {
    interval: Duration,
    handler: Arc<Mutex<H>>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<H: TickHandler> StrategyScheduler<H> {
    pub fn new(handler: H, interval: Duration) -> Result<Self, SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::FatalInit(
                "tick interval must be greater than zero".into(),
            ));
        }
        Ok(Self {
            interval,
            handler: Arc::new(Mutex::new(handler)),
            shared: Arc::new(Shared::new()),
            cancel: CancellationToken::new(),
            task: None,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Begin ticking immediately, then every `interval` after each tick completes.
    ///
    /// A no-op when already running, including while a mid-tick stop is
    /// pending. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        let (runtime, generation) = {
            let mut lc = self.shared.lifecycle();
            if lc.phase != Phase::Idle {
                info!(
                    pending_stop = lc.phase == Phase::Stopping,
                    "scheduler already running"
                );
                return Ok(());
            }
            let runtime = Handle::try_current()
                .map_err(|e| SchedulerError::FatalInit(format!("no async runtime: {e}")))?;
            lc.generation += 1;
            lc.phase = Phase::Waiting;
            (runtime, lc.generation)
        };

        self.cancel = CancellationToken::new();
        let handler = Arc::clone(&self.handler);
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();
        let interval = self.interval;

        // A stale task from the previous run exits on its own once it wakes.
        self.task = Some(runtime.spawn(run_loop(
            handler, shared, cancel, interval, generation,
        )));
        info!(interval_ms = interval.as_millis() as u64, "scheduler started");
        Ok(())
    }

    /// Stop ticking. Returns at once.
    ///
    /// Between ticks the timer is cancelled, the handler is reset and the
    /// scheduler is idle on return. Mid-tick, the tick runs to completion
    /// first; `join` waits for that.
    pub fn stop(&self) {
        {
            let mut lc = self.shared.lifecycle();
            match lc.phase {
                Phase::Idle | Phase::Stopping => {}
                Phase::Ticking => {
                    lc.phase = Phase::Stopping;
                    info!("scheduler stop requested, waiting for in-flight tick");
                }
                Phase::Waiting => match self.handler.try_lock() {
                    Ok(mut handler) => {
                        handler.reset();
                        lc.phase = Phase::Idle;
                        info!(ticks = self.ticks_completed(), "scheduler stopped");
                    }
                    Err(_) => {
                        // Held through `handler()`; the loop resets it on wake.
                        lc.phase = Phase::Stopping;
                        info!("scheduler stop requested, handler busy");
                    }
                },
            }
        }
        self.cancel.cancel();
    }

    /// Wait for the loop task to exit.
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!("scheduler task ended abnormally: {err}");
            }
        }
    }

    /// `stop` followed by `join`.
    pub async fn shutdown(&mut self) {
        self.stop();
        self.join().await;
    }

    pub fn is_running(&self) -> bool {
        self.shared.lifecycle().phase != Phase::Idle
    }

    pub fn run_state(&self) -> RunState {
        let phase = self.shared.lifecycle().phase;
        RunState {
            running: phase != Phase::Idle,
            pending_stop: phase == Phase::Stopping,
        }
    }

    /// True while a tick is executing.
    pub fn in_flight(&self) -> bool {
        self.shared.lifecycle().in_tick
    }

    pub fn ticks_completed(&self) -> u64 {
        self.shared.ticks_completed.load(Ordering::SeqCst)
    }

    /// Shared access to the handler. Locking while a tick runs waits for it.
    pub fn handler(&self) -> Arc<Mutex<H>> {
        Arc::clone(&self.handler)
    }
}

impl<H: TickHandler> Drop for StrategyScheduler<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop<H: TickHandler>(
    handler: Arc<Mutex<H>>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    interval: Duration,
    generation: u64,
) {
    let _guard = LoopGuard {
        shared: Arc::clone(&shared),
        generation,
    };

    loop {
        let tick = {
            let mut lc = shared.lifecycle();
            if lc.generation != generation {
                return;
            }
            match lc.phase {
                Phase::Waiting if !cancel.is_cancelled() => {
                    lc.phase = Phase::Ticking;
                    lc.in_tick = true;
                    true
                }
                Phase::Stopping => false,
                _ => return,
            }
        };

        if tick {
            handler.lock().await.tick().await;
            let n = shared.ticks_completed.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(tick = n, "tick completed");

            let stopping = {
                let mut lc = shared.lifecycle();
                lc.in_tick = false;
                if lc.phase == Phase::Stopping {
                    true
                } else {
                    lc.phase = Phase::Waiting;
                    false
                }
            };
            if !stopping {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(interval) => {}
                }
                continue;
            }
        }

        handler.lock().await.reset();
        shared.lifecycle().phase = Phase::Idle;
        info!(
            ticks = shared.ticks_completed.load(Ordering::SeqCst),
            "scheduler stopped"
        );
        break;
    }
}
