//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global `fmt` subscriber filtered by `filter`.
///
/// `filter` is an `EnvFilter` directive such as `info` or
/// `info,ticket_ledger_runtime=debug`. An unparsable directive falls back to
/// `info`. Returns `false` if a global subscriber was already set.
pub fn init_tracing(filter: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}
