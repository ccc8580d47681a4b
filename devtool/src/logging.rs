//! Diagnostic tracing for devtool.
//!
//! Tracing goes to stderr and is for diagnosing git/cargo interaction.
//! Command results (versions, tags, generated files) are printed to stdout
//! by the CLI and never routed through tracing.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` applies.
///
/// # Example
/// ```bash
/// RUST_LOG=devtool=trace devtool bump-version --dry-run
/// ```
pub fn init(default_level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
