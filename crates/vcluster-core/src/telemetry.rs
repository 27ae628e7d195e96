//! Tracing subscriber setup for binaries driving the engine.
use crate::config::LogConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a fmt subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns `false` when a global subscriber was already installed, which
/// happens when several tests in one process call this.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(config.ansi),
        )
        .try_init()
        .is_ok()
}
