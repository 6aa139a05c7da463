//! Log output for the CLI.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a compact stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("calbuild={default_level},calbuild_core={default_level}"))
    });

    let formatting_layer = fmt::layer()
        .compact()
        .with_target(verbose)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}
