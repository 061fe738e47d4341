//! Structured logging setup.
//!
//! Everything logs through `tracing` macros. The binary or test harness
//! embedding the runner calls `init` once; `RUST_LOG` overrides the default.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "zrevert_runner=info,zrevert_core=info";

/// Install a fmt subscriber. Later calls are no-ops.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
