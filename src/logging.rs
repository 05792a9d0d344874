//! Logging setup shared by the binaries

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for a binary: its own target and the library at
/// `info`, or `debug` when verbose.
pub fn default_filter(binary: &str, verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("{binary}={level},pdf_tools={level}")
}

/// Initialize logging to stderr. `RUST_LOG` takes precedence over the default.
pub fn init(binary: &str, verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary, verbose).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}
