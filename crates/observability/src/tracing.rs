//! Tracing/logging initialization for the billing engine.
//!
//! Billing operations emit structured records (invoice creation at `info`,
//! reconciliation corrections and split mismatches at `warn`). This installs
//! a JSON subscriber so those records are machine-collectable; verbosity is
//! controlled through `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVES: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
