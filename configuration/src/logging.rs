use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::IngestConfig;

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over `logging.level`.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn setup_logging(config: &IngestConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_ansi(config.logging.ansi))
        .try_init();

    if installed.is_ok() {
        tracing::debug!(level = %config.logging.level, "logging initialized");
    }
}
