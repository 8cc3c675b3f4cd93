//! Development-time tracing for debugging the category engine.
//!
//! Tracing output goes to stderr and is controlled by `RUST_LOG`. It is not
//! part of command output: `categories tree` and friends print to stdout
//! regardless of the filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset, so orphan warnings
/// and rejected reorders are visible without configuration.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=categories=debug cargo run -- move 4 2 --position inside
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
