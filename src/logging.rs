//! tracing-subscriber setup.
//!
//! Logs go to stderr so report output on stdout stays clean. `RUST_LOG`
//! overrides the default level.

use tracing_subscriber::EnvFilter;

/// Default filter for one-shot commands.
pub fn default_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
