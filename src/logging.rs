use anyhow::{Context, Result};
use std::env;
use std::io;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Builds the filter: `RUST_LOG` when set, the configured level otherwise.
/// HTTP client internals are capped at `warn` either way.
pub fn build_filter(level: &str) -> EnvFilter {
    let base = env::var("RUST_LOG").map_or_else(|_| EnvFilter::new(level), EnvFilter::new);
    base.add_directive(
        "hyper=warn"
            .parse()
            .unwrap_or_else(|_| Level::WARN.into()),
    )
    .add_directive(
        "reqwest=warn"
            .parse()
            .unwrap_or_else(|_| Level::WARN.into()),
    )
}

/// Installs the global subscriber. Logs go to stderr; stdout carries the plan JSON.
pub fn init(level: &str, json: bool) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(level));
    if json {
        let json_layer = fmt::layer()
            .with_target(true)
            .with_writer(io::stderr)
            .json();
        registry
            .with(json_layer)
            .try_init()
            .context("Failed to install JSON log subscriber")?;
    } else {
        let text_layer = fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(io::stderr);
        registry
            .with(text_layer)
            .try_init()
            .context("Failed to install log subscriber")?;
    }
    Ok(())
}
